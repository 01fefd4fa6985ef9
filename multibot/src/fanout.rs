//! Event fanout to every connected control surface.
//!
//! Built on a tokio broadcast channel. Publishing never blocks: a surface
//! that falls behind loses the oldest events and catches up with the next
//! full snapshot, and a surface that went away is simply dropped.

use crate::{
    accounts::AccountView,
    catalog::ServerConfig,
    session::{SessionId, SessionView},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default broadcast buffer per receiver
pub const DEFAULT_CAPACITY: usize = 256;

/// Category of a chat/log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Chat,
    System,
    Error,
}

/// A single chat or log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub session_id: Option<SessionId>,
    pub session_name: Option<String>,
    pub kind: LogKind,
    pub from: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatRecord {
    /// A panel-level line not tied to any session
    pub fn panel(kind: LogKind, text: impl Into<String>) -> Self {
        Self {
            session_id: None,
            session_name: None,
            kind,
            from: None,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// A line about one session
    pub fn session(
        session_id: SessionId,
        session_name: &str,
        kind: LogKind,
        text: impl Into<String>,
    ) -> Self {
        Self {
            session_id: Some(session_id),
            session_name: Some(session_name.to_string()),
            ..Self::panel(kind, text)
        }
    }

    /// Inbound chat relayed from a session
    pub fn chat(session_id: SessionId, session_name: &str, from: String, text: String) -> Self {
        Self {
            from: Some(from),
            ..Self::session(session_id, session_name, LogKind::Chat, text)
        }
    }
}

/// Everything a control surface can receive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum PanelEvent {
    SessionsChanged(Vec<SessionView>),
    ServersChanged(Vec<ServerConfig>),
    AccountsChanged(Vec<AccountView>),
    ChatOrLog(ChatRecord),
}

/// Broadcast hub for panel events
#[derive(Debug, Clone)]
pub struct EventFanout {
    sender: broadcast::Sender<PanelEvent>,
}

impl EventFanout {
    /// Create a fanout buffering up to `capacity` events per receiver
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new control surface
    pub fn subscribe(&self) -> broadcast::Receiver<PanelEvent> {
        self.sender.subscribe()
    }

    /// Number of currently connected surfaces
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Send to every surface. Having no surfaces is not an error.
    pub fn publish(&self, event: PanelEvent) {
        if self.sender.send(event).is_err() {
            log::trace!("No control surfaces connected, event dropped");
        }
    }

    pub fn sessions_changed(&self, sessions: Vec<SessionView>) {
        self.publish(PanelEvent::SessionsChanged(sessions));
    }

    pub fn servers_changed(&self, servers: Vec<ServerConfig>) {
        self.publish(PanelEvent::ServersChanged(servers));
    }

    pub fn accounts_changed(&self, accounts: Vec<AccountView>) {
        self.publish(PanelEvent::AccountsChanged(accounts));
    }

    pub fn chat_or_log(&self, record: ChatRecord) {
        self.publish(PanelEvent::ChatOrLog(record));
    }
}

impl Default for EventFanout {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::{RecvError, TryRecvError};

    #[test]
    fn test_publish_without_receivers_is_fine() {
        let fanout = EventFanout::new(4);
        fanout.chat_or_log(ChatRecord::panel(LogKind::System, "nobody listening"));
        assert_eq!(fanout.receiver_count(), 0);
    }

    #[test]
    fn test_every_receiver_gets_every_event() {
        let fanout = EventFanout::new(4);
        let mut a = fanout.subscribe();
        let mut b = fanout.subscribe();

        fanout.sessions_changed(vec![]);

        assert_eq!(a.try_recv().unwrap(), PanelEvent::SessionsChanged(vec![]));
        assert_eq!(b.try_recv().unwrap(), PanelEvent::SessionsChanged(vec![]));
        assert!(matches!(a.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_slow_receiver_lags_without_blocking() {
        let fanout = EventFanout::new(2);
        let mut slow = fanout.subscribe();
        let mut fast = fanout.subscribe();

        for i in 0..5 {
            fanout.chat_or_log(ChatRecord::panel(LogKind::System, format!("line {i}")));
            assert!(fast.recv().await.is_ok());
        }

        assert!(matches!(slow.recv().await, Err(RecvError::Lagged(3))));
        match slow.recv().await.unwrap() {
            PanelEvent::ChatOrLog(record) => assert_eq!(record.text, "line 3"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_event_json_shape() {
        let record = ChatRecord::chat(1, "Steve", "Alex".to_string(), "hi".to_string());
        let json = serde_json::to_value(PanelEvent::ChatOrLog(record)).unwrap();

        assert_eq!(json["event"], "chatOrLog");
        assert_eq!(json["data"]["sessionId"], 1);
        assert_eq!(json["data"]["kind"], "chat");
        assert_eq!(json["data"]["from"], "Alex");
        assert_eq!(json["data"]["text"], "hi");
    }

    #[test]
    fn test_panel_line_has_no_session() {
        let json = serde_json::to_value(ChatRecord::panel(LogKind::Error, "oops")).unwrap();
        assert!(json["sessionId"].is_null());
        assert_eq!(json["kind"], "error");
    }
}
