//! Bot client adapter contract.
//!
//! An adapter owns one external game-client connection per session and
//! reports its lifecycle back to the panel as [`AdapterEvent`]s over an mpsc
//! channel. The panel actor is the only consumer of that channel, so every
//! status change goes through the same serialization point as commands.
//!
//! Two adapters ship with the crate:
//!
//! - [`TcpConnector`]: speaks the length-prefixed frame protocol in [`crate::net`]
//! - [`LoopbackConnector`]: in-process, goes online immediately and echoes chat
//!
//! Adapters never retry. Once a terminal event has been emitted the session
//! is finished and a new `create` is required.

pub mod loopback;
pub mod tcp;

pub use loopback::LoopbackConnector;
pub use tcp::TcpConnector;

use crate::{
    catalog::ServerConfig,
    errors::{PanelError, PanelResult},
    session::{SessionId, SessionStatus},
};
use tokio::{sync::mpsc, task::AbortHandle};

/// Sender half adapters use to report events
pub type AdapterEventSender = mpsc::Sender<AdapterEvent>;

/// Sender name used for server-originated lines
pub const SERVER_SENDER: &str = "Server";

/// Capacity of a connection's outbound queue
pub const OUTBOUND_CAPACITY: usize = 64;

/// Everything an adapter needs to open a connection
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub session_id: SessionId,
    pub username: String,
    pub server: ServerConfig,
}

/// What happened on an adapter connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEventKind {
    /// Handshake completed
    Online,
    /// Graceful or forced termination
    Disconnected,
    /// Removed by the server
    Kicked { reason: String },
    /// Unrecoverable transport fault
    Error { message: String },
    /// Inbound chat or system text
    Message { from: String, text: String },
    /// The bot's player entered the world
    Spawned,
}

impl AdapterEventKind {
    /// The status this event moves a session to, if any
    pub fn status(&self) -> Option<SessionStatus> {
        match self {
            AdapterEventKind::Online => Some(SessionStatus::Online),
            AdapterEventKind::Disconnected => Some(SessionStatus::Disconnected),
            AdapterEventKind::Kicked { .. } => Some(SessionStatus::Kicked),
            AdapterEventKind::Error { .. } => Some(SessionStatus::Error),
            AdapterEventKind::Message { .. } | AdapterEventKind::Spawned => None,
        }
    }
}

/// Lifecycle event for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterEvent {
    pub session_id: SessionId,
    pub kind: AdapterEventKind,
}

impl AdapterEvent {
    pub fn new(session_id: SessionId, kind: AdapterEventKind) -> Self {
        Self { session_id, kind }
    }
}

/// Handle to one live external connection
pub trait BotConnection: Send {
    /// Queue an outbound chat line. `text` is already trimmed and non-empty.
    ///
    /// # Errors
    ///
    /// * `PanelError::AdapterChatFailure` - The line could not be queued
    fn chat(&self, text: &str) -> PanelResult<()>;

    /// Ask the connection to shut down. Best-effort.
    fn close(&mut self) -> Result<(), String>;
}

/// Factory for connections
pub trait BotConnector: Send + Sync {
    /// Start a connection without waiting for it to complete.
    ///
    /// # Errors
    ///
    /// * `PanelError::AdapterConnectFailure` - The attempt could not be scheduled
    fn connect(
        &self,
        request: ConnectRequest,
        events: AdapterEventSender,
    ) -> PanelResult<Box<dyn BotConnection>>;
}

/// Outbound work for a connection task
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outbound {
    Chat(String),
    Quit,
}

/// Connection backed by an outbound queue drained by spawned tasks
pub(crate) struct ChannelConnection {
    outbound: mpsc::Sender<Outbound>,
    tasks: Vec<AbortHandle>,
}

impl ChannelConnection {
    pub(crate) fn new(outbound: mpsc::Sender<Outbound>, tasks: Vec<AbortHandle>) -> Self {
        Self { outbound, tasks }
    }
}

impl BotConnection for ChannelConnection {
    fn chat(&self, text: &str) -> PanelResult<()> {
        self.outbound
            .try_send(Outbound::Chat(text.to_string()))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    PanelError::AdapterChatFailure("outbound queue full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    PanelError::AdapterChatFailure("connection closed".to_string())
                }
            })
    }

    fn close(&mut self) -> Result<(), String> {
        match self.outbound.try_send(Outbound::Quit) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Closed(_)) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                for task in &self.tasks {
                    task.abort();
                }
                Err("outbound queue full, connection aborted".to_string())
            }
        }
    }
}

/// Spawn a connection task on the current runtime.
///
/// Fails with `AdapterConnectFailure` when called outside a tokio runtime.
pub(crate) fn spawn_task<F>(future: F) -> PanelResult<AbortHandle>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| PanelError::AdapterConnectFailure(e.to_string()))?;
    Ok(runtime.spawn(future).abort_handle())
}
