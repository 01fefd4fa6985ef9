//! Panel actor implementation with async message handling.

use super::messages::{PanelMessage, PanelSnapshot};
use crate::{
    accounts::{Account, AccountStore, AccountView},
    adapter::{AdapterEvent, AdapterEventKind, BotConnector},
    catalog::{NewServer, ServerCatalog, ServerConfig, ServerId},
    errors::{PanelError, PanelResult},
    fanout::{ChatRecord, EventFanout, LogKind, PanelEvent},
    session::{SessionId, SessionRegistry, Transition},
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Command inbox capacity
const INBOX_CAPACITY: usize = 100;

/// Adapter event channel capacity
const ADAPTER_EVENT_CAPACITY: usize = 1024;

/// Panel actor handle for sending commands
#[derive(Clone)]
pub struct PanelHandle {
    sender: mpsc::Sender<PanelMessage>,
    fanout: EventFanout,
}

impl PanelHandle {
    /// Send a message and wait for its reply
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> PanelMessage,
    ) -> PanelResult<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| PanelError::PanelClosed)?;
        rx.await.map_err(|_| PanelError::PanelClosed)
    }

    /// Create a bot session. Returns once the connection is scheduled.
    pub async fn create_session(
        &self,
        display_name: impl Into<String>,
        server_id: ServerId,
    ) -> PanelResult<SessionId> {
        let display_name = display_name.into();
        self.request(|response| PanelMessage::CreateSession {
            display_name,
            server_id,
            response,
        })
        .await?
    }

    /// Destroy a bot session. Returns whether it existed.
    pub async fn destroy_session(&self, session_id: SessionId) -> PanelResult<bool> {
        self.request(|response| PanelMessage::DestroySession {
            session_id,
            response,
        })
        .await
    }

    /// Send a chat line through a bot
    pub async fn relay_chat(
        &self,
        session_id: SessionId,
        message: impl Into<String>,
    ) -> PanelResult<()> {
        let message = message.into();
        self.request(|response| PanelMessage::RelayChat {
            session_id,
            message,
            response,
        })
        .await?
    }

    pub async fn add_server(&self, server: NewServer) -> PanelResult<ServerConfig> {
        self.request(|response| PanelMessage::AddServer { server, response })
            .await
    }

    /// Add an account whose secret is already hashed
    pub async fn add_account(&self, account: Account) -> PanelResult<AccountView> {
        self.request(|response| PanelMessage::AddAccount { account, response })
            .await?
    }

    pub async fn lookup_account(&self, username: impl Into<String>) -> PanelResult<Option<Account>> {
        let username = username.into();
        self.request(|response| PanelMessage::LookupAccount { username, response })
            .await
    }

    pub async fn snapshot(&self) -> PanelResult<PanelSnapshot> {
        self.request(|response| PanelMessage::Snapshot { response })
            .await
    }

    /// Close every bot connection and stop the actor.
    /// Returns the number of sessions that were closed.
    pub async fn shutdown(&self) -> PanelResult<usize> {
        self.request(|response| PanelMessage::Shutdown { response })
            .await
    }

    /// Receive every broadcast from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.fanout.subscribe()
    }

    /// Replace a lagged receiver and fetch the full state it missed.
    ///
    /// Events still buffered in the old receiver predate the snapshot and
    /// are discarded with it.
    pub async fn resubscribe(
        &self,
        events: &mut broadcast::Receiver<PanelEvent>,
    ) -> PanelResult<PanelSnapshot> {
        *events = self.subscribe();
        self.snapshot().await
    }

    pub fn fanout(&self) -> &EventFanout {
        &self.fanout
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Actor owning the registry, catalog and account store
pub struct PanelActor {
    /// Bot sessions
    registry: SessionRegistry,

    /// Configured game servers
    catalog: ServerCatalog,

    /// Panel accounts
    accounts: AccountStore,

    /// Broadcast hub
    fanout: EventFanout,

    /// Command inbox
    inbox: mpsc::Receiver<PanelMessage>,

    /// Adapter lifecycle events
    adapter_events: mpsc::Receiver<AdapterEvent>,

    /// Set by a shutdown command
    is_closed: bool,
}

impl PanelActor {
    /// Create a new panel actor
    ///
    /// # Arguments
    ///
    /// * `connector` - Adapter used to open bot connections
    /// * `catalog` - Initial server catalog
    /// * `accounts` - Initial account store (holding the seeded admin)
    /// * `fanout` - Broadcast hub shared with control surfaces
    ///
    /// # Returns
    ///
    /// * `(PanelActor, PanelHandle)` - Actor and handle for sending messages
    pub fn new(
        connector: Arc<dyn BotConnector>,
        catalog: ServerCatalog,
        accounts: AccountStore,
        fanout: EventFanout,
    ) -> (Self, PanelHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (event_tx, adapter_events) = mpsc::channel(ADAPTER_EVENT_CAPACITY);

        let actor = Self {
            registry: SessionRegistry::new(connector, event_tx),
            catalog,
            accounts,
            fanout: fanout.clone(),
            inbox,
            adapter_events,
            is_closed: false,
        };

        let handle = PanelHandle { sender, fanout };

        (actor, handle)
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        log::info!(
            "Panel starting with {} server(s) and {} account(s)",
            self.catalog.len(),
            self.accounts.len()
        );

        loop {
            // Adapter events already queued are applied before the next command.
            tokio::select! {
                biased;

                Some(event) = self.adapter_events.recv() => {
                    self.handle_adapter_event(event);
                }

                message = self.inbox.recv() => {
                    match message {
                        Some(message) => self.handle_message(message),
                        None => {
                            log::info!("All panel handles dropped");
                            break;
                        }
                    }

                    if self.is_closed {
                        break;
                    }
                }
            }
        }

        self.close_all();
        log::info!("Panel stopped");
    }

    fn handle_message(&mut self, message: PanelMessage) {
        match message {
            PanelMessage::CreateSession {
                display_name,
                server_id,
                response,
            } => {
                let result = self.create_session(&display_name, server_id);
                let _ = response.send(result);
            }

            PanelMessage::DestroySession {
                session_id,
                response,
            } => {
                let existed = self.destroy_session(session_id);
                let _ = response.send(existed);
            }

            PanelMessage::RelayChat {
                session_id,
                message,
                response,
            } => {
                let result = self.relay_chat(session_id, &message);
                let _ = response.send(result);
            }

            PanelMessage::AddServer { server, response } => {
                let config = self.catalog.add(server);
                log::info!(
                    "Added server #{} '{}' at {}:{} (version {})",
                    config.id,
                    config.name,
                    config.host,
                    config.port,
                    config.protocol_version
                );
                self.fanout.servers_changed(self.catalog.list());
                let _ = response.send(config);
            }

            PanelMessage::AddAccount { account, response } => {
                let result = self.add_account(account);
                let _ = response.send(result);
            }

            PanelMessage::LookupAccount { username, response } => {
                let _ = response.send(self.accounts.get(&username).cloned());
            }

            PanelMessage::Snapshot { response } => {
                let _ = response.send(self.snapshot());
            }

            PanelMessage::Shutdown { response } => {
                let closed = self.close_all();
                self.is_closed = true;
                let _ = response.send(closed);
            }
        }
    }

    fn create_session(&mut self, display_name: &str, server_id: ServerId) -> PanelResult<SessionId> {
        match self
            .registry
            .create_session(display_name, server_id, &self.catalog)
        {
            Ok(id) => {
                log::info!(
                    "Creating bot #{} '{}' on server #{}",
                    id,
                    display_name.trim(),
                    server_id
                );
                self.publish_sessions();
                Ok(id)
            }
            Err(e) => {
                log::warn!("Failed to create bot '{}': {}", display_name, e);
                self.fanout
                    .chat_or_log(ChatRecord::panel(LogKind::Error, format!("[Web] {e}")));
                Err(e)
            }
        }
    }

    fn destroy_session(&mut self, session_id: SessionId) -> bool {
        match self.registry.destroy_session(session_id) {
            Some(session) => {
                log::info!("Removed bot #{} '{}'", session_id, session.display_name);
                self.publish_sessions();
                self.fanout.chat_or_log(ChatRecord::session(
                    session_id,
                    &session.display_name,
                    LogKind::System,
                    format!("[{}] Bot removed", session.display_name),
                ));
                true
            }
            None => {
                log::debug!("Destroy for unknown bot #{} ignored", session_id);
                false
            }
        }
    }

    fn relay_chat(&mut self, session_id: SessionId, message: &str) -> PanelResult<()> {
        let result = self.registry.relay_chat(session_id, message);
        match &result {
            Ok(()) => log::debug!("Bot #{} says: {}", session_id, message.trim()),
            Err(PanelError::AdapterChatFailure(reason)) => {
                log::warn!("Error sending chat from bot #{}: {}", session_id, reason);
                self.fanout.chat_or_log(ChatRecord::panel(
                    LogKind::Error,
                    format!("[Web] Failed to send chat from bot #{session_id}"),
                ));
            }
            Err(e) => log::info!("Chat for bot #{} ignored: {}", session_id, e),
        }
        result
    }

    fn add_account(&mut self, account: Account) -> PanelResult<AccountView> {
        match self.accounts.add(account) {
            Ok(view) => {
                log::info!("Added {} account '{}'", view.role, view.username);
                self.fanout.accounts_changed(self.accounts.list());
                Ok(view)
            }
            Err(e) => {
                log::warn!("Failed to add account: {}", e);
                self.fanout
                    .chat_or_log(ChatRecord::panel(LogKind::Error, format!("[Web] {e}")));
                Err(e)
            }
        }
    }

    fn handle_adapter_event(&mut self, event: AdapterEvent) {
        let session_id = event.session_id;

        match &event.kind {
            AdapterEventKind::Message { from, text } => {
                match self.registry.get(session_id) {
                    Some(session) => {
                        log::info!("[{} chat] <{}> {}", session.display_name, from, text);
                        let record = ChatRecord::chat(
                            session_id,
                            &session.display_name,
                            from.clone(),
                            text.clone(),
                        );
                        self.fanout.chat_or_log(record);
                    }
                    None => log::debug!("Dropping message for unknown bot #{}", session_id),
                }
                return;
            }
            AdapterEventKind::Spawned => {
                // Informational only; the status stays Online
                if let Some(session) = self.registry.get(session_id) {
                    let (kind, text) = status_line(&session.display_name, &event.kind);
                    log::info!("{}", text);
                    self.fanout.chat_or_log(ChatRecord::session(
                        session_id,
                        &session.display_name,
                        kind,
                        text,
                    ));
                }
                return;
            }
            _ => {}
        }

        match self.registry.apply(&event) {
            Transition::Changed {
                display_name, to, ..
            } => {
                let (kind, text) = status_line(&display_name, &event.kind);
                log::info!("Bot #{} is now {}: {}", session_id, to, text);
                self.publish_sessions();
                self.fanout
                    .chat_or_log(ChatRecord::session(session_id, &display_name, kind, text));
            }
            Transition::UnknownSession => {
                log::debug!("Event for unknown bot #{} ignored: {:?}", session_id, event.kind);
            }
            Transition::Rejected { from, to } => {
                log::warn!(
                    "Bot #{}: ignoring transition {} -> {} ({:?})",
                    session_id,
                    from,
                    to,
                    event.kind
                );
            }
        }
    }

    /// Destroy every session, returning how many there were
    fn close_all(&mut self) -> usize {
        let ids = self.registry.ids();
        for id in &ids {
            self.registry.destroy_session(*id);
        }
        if !ids.is_empty() {
            log::info!("Closed {} bot connection(s)", ids.len());
            self.publish_sessions();
        }
        ids.len()
    }

    fn publish_sessions(&self) {
        self.fanout
            .sessions_changed(self.registry.snapshot(&self.catalog));
    }

    fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            sessions: self.registry.snapshot(&self.catalog),
            servers: self.catalog.list(),
            accounts: self.accounts.list(),
        }
    }
}

/// Log line kind and text for a status event
fn status_line(display_name: &str, kind: &AdapterEventKind) -> (LogKind, String) {
    match kind {
        AdapterEventKind::Online => (LogKind::System, format!("[{display_name}] Logged in")),
        AdapterEventKind::Spawned => {
            (LogKind::System, format!("[{display_name}] Spawned in world"))
        }
        AdapterEventKind::Disconnected => {
            (LogKind::System, format!("[{display_name}] Disconnected"))
        }
        AdapterEventKind::Kicked { reason } => {
            (LogKind::Error, format!("[{display_name}] Kicked: {reason}"))
        }
        AdapterEventKind::Error { message } => {
            (LogKind::Error, format!("[{display_name}] Error: {message}"))
        }
        AdapterEventKind::Message { text, .. } => (LogKind::Chat, text.clone()),
    }
}
