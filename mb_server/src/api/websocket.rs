//! WebSocket handler for live panel commands and broadcasts.
//!
//! # Connection Flow
//!
//! 1. Browser connects via `GET /ws` carrying the session cookie
//! 2. Server sends `sessionsChanged`, `serversChanged` and `accountsChanged`
//!    snapshots plus a welcome line
//! 3. Every panel broadcast is forwarded from then on, while commands from
//!    the browser are applied to the panel
//! 4. On disconnect the forwarding task is aborted; bots keep running
//!
//! # Messages
//!
//! Both directions use `{ "event": <name>, "data": <payload> }`.
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3000/ws');
//! ws.send(JSON.stringify({ event: "createBot", data: { username: "Steve", serverId: 1 } }));
//! ```

use axum::{
    extract::{
        Extension, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use log::{debug, error, info, warn};
use multibot::{
    Account, ChatRecord, LogKind, NewServer, PanelClaims, PanelError, PanelEvent, PanelHandle,
    Role, ServerId, SessionId,
};
use serde::Deserialize;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};

use super::AppState;
use crate::{logging::log_security_event, metrics};

/// Commands a control surface can send
#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientCommand {
    /// Start a bot; `serverId` defaults to the seeded server
    #[serde(rename_all = "camelCase")]
    CreateBot {
        username: String,
        #[serde(default = "default_server_id")]
        server_id: ServerId,
    },
    /// Say something through a bot
    #[serde(rename_all = "camelCase")]
    SendChat { bot_id: SessionId, message: String },
    /// Disconnect and forget a bot
    #[serde(rename_all = "camelCase")]
    DestroyBot { bot_id: SessionId },
    /// Add a game server (privileged)
    AddServer {
        name: String,
        host: String,
        port: u16,
        version: String,
    },
    /// Add a panel account (privileged)
    AddUser {
        username: String,
        password: String,
        role: Role,
    },
}

fn default_server_id() -> ServerId {
    1
}

impl ClientCommand {
    /// Wire name, used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateBot { .. } => "createBot",
            Self::SendChat { .. } => "sendChat",
            Self::DestroyBot { .. } => "destroyBot",
            Self::AddServer { .. } => "addServer",
            Self::AddUser { .. } => "addUser",
        }
    }

    /// Commands the panel page only offers to admins
    pub fn is_privileged(&self) -> bool {
        matches!(self, Self::AddServer { .. } | Self::AddUser { .. })
    }
}

/// Upgrade to a WebSocket for an authenticated panel user.
///
/// The session middleware has already validated the cookie.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Extension(claims): Extension<PanelClaims>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, claims, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, claims: PanelClaims, state: AppState) {
    let (sender, mut receiver) = socket.split();
    let user = claims.sub.clone();

    // Subscribe before the snapshot so nothing between the two is lost.
    let events = state.panel.subscribe();
    let snapshot = match state.panel.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("WebSocket for '{}' refused: {}", user, e);
            return;
        }
    };

    info!("WebSocket connected: user={}", user);
    metrics::websocket_connected();

    let mut initial = snapshot.into_events();
    initial.push(PanelEvent::ChatOrLog(ChatRecord::panel(
        LogKind::System,
        "[Web] Connected to multi-bot control.",
    )));

    // Replies that go to this surface only
    let (reply_tx, reply_rx) = mpsc::channel::<ChatRecord>(32);
    let send_task = tokio::spawn(forward_events(
        sender,
        state.panel.clone(),
        initial,
        events,
        reply_rx,
    ));

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let reply = match serde_json::from_str::<ClientCommand>(&text) {
                    Ok(command) => handle_command(command, &claims, &state).await,
                    Err(e) => {
                        warn!("Failed to parse command from '{}': {}", user, e);
                        Some(ChatRecord::panel(LogKind::Error, "[Web] Invalid command"))
                    }
                };

                if let Some(reply) = reply
                    && reply_tx.send(reply).await.is_err()
                {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!("WebSocket error for '{}': {}", user, e);
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    metrics::websocket_disconnected();
    info!("WebSocket disconnected: user={}", user);
}

/// Push the initial snapshot, then broadcasts and direct replies.
async fn forward_events(
    mut sender: SplitSink<WebSocket, Message>,
    panel: PanelHandle,
    initial: Vec<PanelEvent>,
    mut events: broadcast::Receiver<PanelEvent>,
    mut replies: mpsc::Receiver<ChatRecord>,
) {
    for event in &initial {
        if send_event(&mut sender, event).await.is_err() {
            return;
        }
    }

    loop {
        let batch = tokio::select! {
            result = events.recv() => match result {
                Ok(event) => vec![event],
                Err(RecvError::Lagged(skipped)) => {
                    warn!("WebSocket lagging, skipped {} event(s)", skipped);
                    match resync(&panel, &mut events).await {
                        Some(batch) => batch,
                        None => return,
                    }
                }
                Err(RecvError::Closed) => return,
            },
            Some(reply) = replies.recv() => vec![PanelEvent::ChatOrLog(reply)],
        };

        for event in &batch {
            if send_event(&mut sender, event).await.is_err() {
                return;
            }
        }
    }
}

/// Full snapshots replacing whatever a lagged surface missed.
/// `None` once the panel has stopped.
async fn resync(
    panel: &PanelHandle,
    events: &mut broadcast::Receiver<PanelEvent>,
) -> Option<Vec<PanelEvent>> {
    match panel.resubscribe(events).await {
        Ok(snapshot) => Some(snapshot.into_events()),
        Err(e) => {
            debug!("Resync failed: {}", e);
            None
        }
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &PanelEvent,
) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize panel event: {}", e);
            return Ok(());
        }
    };
    sender.send(Message::Text(json.into())).await
}

/// Apply one command, returning a line for the issuing surface only.
///
/// Failures the panel already broadcasts produce no reply here.
async fn handle_command(
    command: ClientCommand,
    claims: &PanelClaims,
    state: &AppState,
) -> Option<ChatRecord> {
    metrics::commands_total(command.kind());

    if command.is_privileged() && !claims.is_admin() {
        log_security_event(
            "privileged_command",
            Some(&claims.sub),
            &format!("non-admin sent {}", command.kind()),
        );
        if state.options.enforce_admin_commands {
            return Some(error_line(format!(
                "[Web] Admin role required for {}",
                command.kind()
            )));
        }
    }

    match command {
        ClientCommand::CreateBot {
            username,
            server_id,
        } => {
            let username = username.trim().to_string();
            match state.panel.create_session(username.as_str(), server_id).await {
                Ok(id) => Some(ChatRecord::session(
                    id,
                    &username,
                    LogKind::System,
                    format!("[Web] Starting bot #{id} with username {username}"),
                )),
                Err(e) => closed_reply(e),
            }
        }

        ClientCommand::SendChat { bot_id, message } => {
            match state.panel.relay_chat(bot_id, message).await {
                Ok(()) => None,
                Err(e) => closed_reply(e),
            }
        }

        ClientCommand::DestroyBot { bot_id } => match state.panel.destroy_session(bot_id).await {
            Ok(existed) => {
                if !existed {
                    debug!("destroyBot for unknown bot #{}", bot_id);
                }
                None
            }
            Err(e) => closed_reply(e),
        },

        ClientCommand::AddServer {
            name,
            host,
            port,
            version,
        } => {
            let server = NewServer {
                name: name.trim().to_string(),
                host: host.trim().to_string(),
                port,
                protocol_version: version.trim().to_string(),
            };
            if let Some(field) = blank_server_field(&server) {
                return Some(error_line(format!("[Web] {}", PanelError::EmptyInput(field))));
            }

            match state.panel.add_server(server).await {
                Ok(config) => Some(ChatRecord::panel(
                    LogKind::System,
                    format!("[Web] Added server #{} {}", config.id, config.name),
                )),
                Err(e) => closed_reply(e),
            }
        }

        ClientCommand::AddUser {
            username,
            password,
            role,
        } => {
            if password.is_empty() {
                return Some(error_line(format!(
                    "[Web] {}",
                    PanelError::EmptyInput("password")
                )));
            }

            let secret_hash = match state.credentials.hash_secret(&password) {
                Ok(hash) => hash,
                Err(e) => {
                    error!("Failed to hash password for new user: {}", e);
                    return Some(error_line(format!("[Web] {}", e.client_message())));
                }
            };

            let account = Account {
                username,
                secret_hash,
                role,
            };
            match state.panel.add_account(account).await {
                Ok(view) => Some(ChatRecord::panel(
                    LogKind::System,
                    format!("[Web] Added {} account {}", view.role, view.username),
                )),
                Err(e) => closed_reply(e),
            }
        }
    }
}

fn blank_server_field(server: &NewServer) -> Option<&'static str> {
    if server.name.is_empty() {
        Some("name")
    } else if server.host.is_empty() {
        Some("host")
    } else if server.protocol_version.is_empty() {
        Some("version")
    } else {
        None
    }
}

fn error_line(text: String) -> ChatRecord {
    ChatRecord::panel(LogKind::Error, text)
}

/// Panel errors are broadcast by the actor; only a stopped panel needs a reply.
fn closed_reply(error: PanelError) -> Option<ChatRecord> {
    match error {
        PanelError::PanelClosed => Some(error_line(format!("[Web] {error}"))),
        _ => None,
    }
}
