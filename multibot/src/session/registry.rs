//! Session registry: owns every bot session and its adapter connection.

use super::models::{Session, SessionId, SessionStatus, SessionView};
use crate::{
    adapter::{AdapterEvent, AdapterEventSender, BotConnector, ConnectRequest},
    catalog::{ServerCatalog, ServerId},
    errors::{PanelError, PanelResult},
};
use std::{collections::BTreeMap, sync::Arc};

/// Outcome of applying an adapter status event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The session moved to a new status
    Changed {
        display_name: String,
        from: SessionStatus,
        to: SessionStatus,
    },
    /// The event named a session that is not registered
    UnknownSession,
    /// The state machine does not allow this transition
    Rejected {
        from: SessionStatus,
        to: SessionStatus,
    },
}

/// Registry of bot sessions
pub struct SessionRegistry {
    /// Active sessions (session_id -> Session), iterated in id order
    sessions: BTreeMap<SessionId, Session>,

    /// Next session ID
    next_session_id: SessionId,

    /// Adapter used to open connections
    connector: Arc<dyn BotConnector>,

    /// Channel adapters report lifecycle events on
    events: AdapterEventSender,
}

impl SessionRegistry {
    /// Create a new registry
    ///
    /// # Arguments
    ///
    /// * `connector` - Adapter used for every new session
    /// * `events` - Sender handed to each connection for lifecycle events
    pub fn new(connector: Arc<dyn BotConnector>, events: AdapterEventSender) -> Self {
        Self {
            sessions: BTreeMap::new(),
            next_session_id: 1,
            connector,
            events,
        }
    }

    /// Create a session and start its connection.
    ///
    /// Returns as soon as the adapter has scheduled the attempt; the session
    /// starts out `Connecting`.
    ///
    /// # Errors
    ///
    /// * `PanelError::EmptyInput` - Display name is blank
    /// * `PanelError::UnknownServer` - `server_id` is not in the catalog
    /// * `PanelError::AdapterConnectFailure` - The adapter refused the attempt
    ///
    /// On error the registry is unchanged.
    pub fn create_session(
        &mut self,
        display_name: &str,
        server_id: ServerId,
        catalog: &ServerCatalog,
    ) -> PanelResult<SessionId> {
        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(PanelError::EmptyInput("username"));
        }

        let server = catalog
            .get(server_id)
            .ok_or(PanelError::UnknownServer(server_id))?
            .clone();

        // Ids are never reused, even when the adapter refuses below.
        let id = self.next_session_id;
        self.next_session_id += 1;

        let request = ConnectRequest {
            session_id: id,
            username: display_name.to_string(),
            server,
        };
        let connection = self.connector.connect(request, self.events.clone())?;

        self.sessions.insert(
            id,
            Session {
                id,
                display_name: display_name.to_string(),
                server_id,
                status: SessionStatus::Connecting,
                connection: Some(connection),
            },
        );

        Ok(id)
    }

    /// Remove a session, closing its connection.
    ///
    /// Unknown ids are a no-op and return `None`. Close failures are logged.
    pub fn destroy_session(&mut self, id: SessionId) -> Option<Session> {
        let mut session = self.sessions.remove(&id)?;

        if let Some(mut connection) = session.connection.take()
            && let Err(e) = connection.close()
        {
            log::warn!("Bot #{} '{}': close failed: {}", id, session.display_name, e);
        }

        Some(session)
    }

    /// Forward a chat line to a session's connection.
    ///
    /// Surrounding whitespace is trimmed; the rest of the text is passed on
    /// unchanged.
    ///
    /// # Errors
    ///
    /// * `PanelError::EmptyInput` - Message is blank
    /// * `PanelError::UnknownSession` - No such session, or its connection is gone
    /// * `PanelError::AdapterChatFailure` - The adapter could not queue the line
    pub fn relay_chat(&self, id: SessionId, message: &str) -> PanelResult<()> {
        let message = message.trim();
        if message.is_empty() {
            return Err(PanelError::EmptyInput("message"));
        }

        let connection = self
            .sessions
            .get(&id)
            .and_then(|session| session.connection.as_ref())
            .ok_or(PanelError::UnknownSession(id))?;

        connection.chat(message)
    }

    /// Apply an adapter status event.
    ///
    /// Message events carry no status and are reported as `Rejected` with
    /// `from == to`; callers route them elsewhere.
    pub fn apply(&mut self, event: &AdapterEvent) -> Transition {
        let Some(session) = self.sessions.get_mut(&event.session_id) else {
            return Transition::UnknownSession;
        };

        let from = session.status;
        let Some(to) = event.kind.status() else {
            return Transition::Rejected { from, to: from };
        };

        if !from.can_transition_to(to) {
            return Transition::Rejected { from, to };
        }

        session.status = to;
        if to.is_terminal() {
            // The adapter has finished with this connection.
            session.connection = None;
        }

        Transition::Changed {
            display_name: session.display_name.clone(),
            from,
            to,
        }
    }

    /// Ordered read-only projection of every session
    pub fn snapshot(&self, catalog: &ServerCatalog) -> Vec<SessionView> {
        self.sessions
            .values()
            .map(|session| SessionView {
                id: session.id,
                display_name: session.display_name.clone(),
                status: session.status,
                server_id: session.server_id,
                server_name: catalog.get(session.server_id).map(|s| s.name.clone()),
            })
            .collect()
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
