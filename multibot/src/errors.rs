//! Panel error types.

use thiserror::Error;

use crate::{catalog::ServerId, session::SessionId};

/// Errors raised by panel commands.
///
/// None of these are fatal: the panel actor logs them at the command
/// boundary and, where a user should see them, turns them into an
/// `error` line on the chat/log stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    /// The requested server id is not in the catalog
    #[error("Unknown server #{0}")]
    UnknownServer(ServerId),

    /// The requested session id is not in the registry
    #[error("Unknown bot #{0}")]
    UnknownSession(SessionId),

    /// An account with this username already exists
    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),

    /// A required text field was blank after trimming
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),

    /// The adapter could not schedule a connection
    #[error("Failed to start connection: {0}")]
    AdapterConnectFailure(String),

    /// The adapter could not deliver an outbound chat line
    #[error("Failed to send chat: {0}")]
    AdapterChatFailure(String),

    /// The panel actor has stopped
    #[error("Panel is shut down")]
    PanelClosed,
}

/// Result type for panel operations
pub type PanelResult<T> = Result<T, PanelError>;
