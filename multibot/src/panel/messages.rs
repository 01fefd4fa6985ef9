//! Panel actor message types.

use crate::{
    accounts::{Account, AccountView},
    catalog::{NewServer, ServerConfig, ServerId},
    errors::PanelResult,
    fanout::PanelEvent,
    session::{SessionId, SessionView},
};
use serde::Serialize;
use tokio::sync::oneshot;

/// Messages that can be sent to the PanelActor
#[derive(Debug)]
pub enum PanelMessage {
    /// Create a bot session
    CreateSession {
        display_name: String,
        server_id: ServerId,
        response: oneshot::Sender<PanelResult<SessionId>>,
    },

    /// Destroy a bot session; replies whether it existed
    DestroySession {
        session_id: SessionId,
        response: oneshot::Sender<bool>,
    },

    /// Relay a chat line through a bot
    RelayChat {
        session_id: SessionId,
        message: String,
        response: oneshot::Sender<PanelResult<()>>,
    },

    /// Add a server to the catalog
    AddServer {
        server: NewServer,
        response: oneshot::Sender<ServerConfig>,
    },

    /// Add an account (secret already hashed)
    AddAccount {
        account: Account,
        response: oneshot::Sender<PanelResult<AccountView>>,
    },

    /// Look up an account for login
    LookupAccount {
        username: String,
        response: oneshot::Sender<Option<Account>>,
    },

    /// Get the full current state
    Snapshot {
        response: oneshot::Sender<PanelSnapshot>,
    },

    /// Close every connection and stop the actor
    Shutdown { response: oneshot::Sender<usize> },
}

/// Full panel state, as sent to a newly connected control surface
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSnapshot {
    pub sessions: Vec<SessionView>,
    pub servers: Vec<ServerConfig>,
    pub accounts: Vec<AccountView>,
}

impl PanelSnapshot {
    /// The three full-state broadcasts this snapshot stands for
    pub fn into_events(self) -> Vec<PanelEvent> {
        vec![
            PanelEvent::SessionsChanged(self.sessions),
            PanelEvent::ServersChanged(self.servers),
            PanelEvent::AccountsChanged(self.accounts),
        ]
    }
}
