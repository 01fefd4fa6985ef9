//! Session data models.

use crate::{adapter::BotConnection, catalog::ServerId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Session ID type
pub type SessionId = u64;

/// Lifecycle status of one bot session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Connecting,
    Online,
    Disconnected,
    Kicked,
    Error,
}

impl SessionStatus {
    /// Terminal statuses never change again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionStatus::Disconnected | SessionStatus::Kicked | SessionStatus::Error
        )
    }

    /// Check whether `self -> next` is an allowed transition
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        matches!(
            (self, next),
            (SessionStatus::Connecting, SessionStatus::Online)
                | (SessionStatus::Connecting, SessionStatus::Error)
                | (SessionStatus::Online, SessionStatus::Disconnected)
                | (SessionStatus::Online, SessionStatus::Kicked)
                | (SessionStatus::Online, SessionStatus::Error)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            SessionStatus::Connecting => "Connecting",
            SessionStatus::Online => "Online",
            SessionStatus::Disconnected => "Disconnected",
            SessionStatus::Kicked => "Kicked",
            SessionStatus::Error => "Error",
        };
        write!(f, "{repr}")
    }
}

/// One tracked bot connection.
///
/// `connection` is `Some` while the adapter connection is live and is
/// dropped as soon as the session reaches a terminal status.
pub struct Session {
    pub id: SessionId,
    pub display_name: String,
    pub server_id: ServerId,
    pub status: SessionStatus,
    pub(crate) connection: Option<Box<dyn BotConnection>>,
}

impl Session {
    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("server_id", &self.server_id)
            .field("status", &self.status)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

/// Read-only projection of a session for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: SessionId,
    pub display_name: String,
    pub status: SessionStatus,
    pub server_id: ServerId,
    pub server_name: Option<String>,
}
