//! Adapter that talks to a game server over TCP using [`crate::net`] frames.
//!
//! Each connection is one task. It performs the login handshake while
//! watching the outbound queue for a close, then reads server frames and
//! drains the outbound queue side by side.

use super::{
    AdapterEvent, AdapterEventKind, AdapterEventSender, BotConnection, BotConnector,
    ChannelConnection, ConnectRequest, OUTBOUND_CAPACITY, Outbound, SERVER_SENDER, spawn_task,
};
use crate::{
    errors::{PanelError, PanelResult},
    net::{ClientFrame, FrameError, ServerFrame, read_prefixed, write_prefixed},
    session::SessionId,
};
use tokio::{
    io::AsyncWriteExt,
    net::{
        TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::mpsc,
};

/// TCP adapter
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl TcpConnector {
    pub fn new() -> Self {
        Self
    }
}

impl BotConnector for TcpConnector {
    fn connect(
        &self,
        request: ConnectRequest,
        events: AdapterEventSender,
    ) -> PanelResult<Box<dyn BotConnection>> {
        if request.server.host.trim().is_empty() {
            return Err(PanelError::AdapterConnectFailure(format!(
                "server '{}' has no host",
                request.server.name
            )));
        }
        if request.server.port == 0 {
            return Err(PanelError::AdapterConnectFailure(format!(
                "server '{}' has no port",
                request.server.name
            )));
        }

        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let task = spawn_task(run_connection(request, events, outbound_rx))?;
        Ok(Box::new(ChannelConnection::new(outbound_tx, vec![task])))
    }
}

struct Reporter {
    id: SessionId,
    events: AdapterEventSender,
}

impl Reporter {
    /// Returns false once the panel is gone
    async fn emit(&self, kind: AdapterEventKind) -> bool {
        self.events
            .send(AdapterEvent::new(self.id, kind))
            .await
            .is_ok()
    }

    async fn error(&self, message: String) {
        let _ = self.emit(AdapterEventKind::Error { message }).await;
    }
}

async fn run_connection(
    request: ConnectRequest,
    events: AdapterEventSender,
    mut outbound: mpsc::Receiver<Outbound>,
) {
    let reporter = Reporter {
        id: request.session_id,
        events,
    };

    // Chat queued while still connecting is sent once the bot is online.
    let mut pending = Vec::new();
    let streams = tokio::select! {
        streams = login(&reporter, &request) => streams,
        () = hold_until_quit(&mut outbound, &mut pending) => {
            log::debug!("Bot #{} closed before login completed", reporter.id);
            return;
        }
    };
    let Some((reader, mut writer)) = streams else {
        return;
    };
    log::info!(
        "Bot #{} '{}' logged in to {}:{}",
        reporter.id,
        request.username,
        request.server.host,
        request.server.port
    );

    for text in pending {
        if let Err(e) = write_prefixed(&mut writer, &ClientFrame::Chat { text }).await {
            reporter.error(e.to_string()).await;
            return;
        }
    }

    // Reader and writer share this task, so aborting it drops the socket.
    tokio::select! {
        () = read_loop(&reporter, reader) => {}
        () = write_loop(&reporter, &mut writer, &mut outbound) => {}
    }
}

/// Connect, send `Login` and wait for `Welcome`.
///
/// Returns `None` when the attempt failed; the failure is already reported.
async fn login(
    reporter: &Reporter,
    request: &ConnectRequest,
) -> Option<(OwnedReadHalf, OwnedWriteHalf)> {
    let server = &request.server;

    let stream = match TcpStream::connect((server.host.as_str(), server.port)).await {
        Ok(stream) => stream,
        Err(e) => {
            reporter
                .error(format!("connect to {}:{} failed: {}", server.host, server.port, e))
                .await;
            return None;
        }
    };
    let (mut reader, mut writer) = stream.into_split();

    let login = ClientFrame::Login {
        username: request.username.clone(),
        protocol_version: server.protocol_version.clone(),
    };
    if let Err(e) = write_prefixed(&mut writer, &login).await {
        reporter.error(format!("login failed: {e}")).await;
        return None;
    }

    if handshake(reporter, &mut reader).await {
        Some((reader, writer))
    } else {
        None
    }
}

/// Collect chat lines until `Quit` arrives or the connection handle is dropped
async fn hold_until_quit(outbound: &mut mpsc::Receiver<Outbound>, pending: &mut Vec<String>) {
    while let Some(message) = outbound.recv().await {
        match message {
            Outbound::Chat(text) => pending.push(text),
            Outbound::Quit => return,
        }
    }
}

/// Wait for `Welcome`, relaying anything the server says first.
/// Returns true once the bot is online.
async fn handshake(reporter: &Reporter, reader: &mut OwnedReadHalf) -> bool {
    loop {
        match read_prefixed::<ServerFrame, _>(reader).await {
            Ok(ServerFrame::Welcome) => return reporter.emit(AdapterEventKind::Online).await,
            Ok(ServerFrame::Kick { reason }) => {
                reporter
                    .error(format!("rejected during login: {reason}"))
                    .await;
                return false;
            }
            Ok(frame) => {
                if let Some(kind) = inbound_message(frame)
                    && !reporter.emit(kind).await
                {
                    return false;
                }
            }
            Err(e) if e.is_eof() => {
                reporter
                    .error("connection closed during login".to_string())
                    .await;
                return false;
            }
            Err(e) => {
                reporter.error(e.to_string()).await;
                return false;
            }
        }
    }
}

async fn read_loop(reporter: &Reporter, mut reader: OwnedReadHalf) {
    loop {
        let kind = match read_prefixed::<ServerFrame, _>(&mut reader).await {
            Ok(ServerFrame::Kick { reason }) => {
                let _ = reporter.emit(AdapterEventKind::Kicked { reason }).await;
                return;
            }
            Ok(ServerFrame::Welcome) => {
                log::debug!("Bot #{}: ignoring repeated welcome", reporter.id);
                continue;
            }
            Ok(frame) => match inbound_message(frame) {
                Some(kind) => kind,
                None => continue,
            },
            Err(e) => {
                let kind = terminal_kind(e);
                let _ = reporter.emit(kind).await;
                return;
            }
        };

        if !reporter.emit(kind).await {
            return;
        }
    }
}

async fn write_loop(
    reporter: &Reporter,
    writer: &mut OwnedWriteHalf,
    outbound: &mut mpsc::Receiver<Outbound>,
) {
    while let Some(message) = outbound.recv().await {
        match message {
            Outbound::Chat(text) => {
                if let Err(e) = write_prefixed(writer, &ClientFrame::Chat { text }).await {
                    log::warn!("Bot #{}: failed to write chat: {}", reporter.id, e);
                    reporter.error(e.to_string()).await;
                    return;
                }
            }
            Outbound::Quit => {
                let _ = write_prefixed(writer, &ClientFrame::Quit).await;
                let _ = writer.shutdown().await;
                return;
            }
        }
    }
}

fn inbound_message(frame: ServerFrame) -> Option<AdapterEventKind> {
    match frame {
        ServerFrame::Chat { sender, text } => Some(AdapterEventKind::Message {
            from: sender.unwrap_or_else(|| SERVER_SENDER.to_string()),
            text,
        }),
        ServerFrame::System { text } => Some(AdapterEventKind::Message {
            from: SERVER_SENDER.to_string(),
            text,
        }),
        ServerFrame::Spawned => Some(AdapterEventKind::Spawned),
        ServerFrame::Welcome | ServerFrame::Kick { .. } => None,
    }
}

fn terminal_kind(error: FrameError) -> AdapterEventKind {
    if error.is_eof() {
        AdapterEventKind::Disconnected
    } else {
        AdapterEventKind::Error {
            message: error.to_string(),
        }
    }
}
