//! # Multibot
//!
//! A control panel core for driving many chat bots against remote game
//! servers from one place.
//!
//! All mutable state (bot sessions, the server catalog and panel accounts)
//! is owned by a single [`PanelActor`] task. Control surfaces talk to it
//! through a cloneable [`PanelHandle`] and receive state changes through an
//! [`EventFanout`] broadcast.
//!
//! ## Core Modules
//!
//! - [`session`]: Bot session registry and lifecycle state machine
//! - [`catalog`]: Configured game servers
//! - [`accounts`]: Panel accounts, secret hashing and session tokens
//! - [`adapter`]: Bot client adapter contract with TCP and loopback adapters
//! - [`fanout`]: Broadcast of state changes and chat/log lines
//! - [`panel`]: The actor tying it all together
//! - [`net`]: Wire frames spoken by the TCP adapter
//!
//! ## Example
//!
//! ```no_run
//! use multibot::{EventFanout, LoopbackConnector, PanelActor, ServerCatalog, AccountStore};
//! use std::sync::Arc;
//!
//! # async fn demo() {
//! let (actor, handle) = PanelActor::new(
//!     Arc::new(LoopbackConnector::new()),
//!     ServerCatalog::new(),
//!     AccountStore::new(),
//!     EventFanout::default(),
//! );
//! tokio::spawn(actor.run());
//!
//! let snapshot = handle.snapshot().await.unwrap();
//! assert!(snapshot.sessions.is_empty());
//! # }
//! ```

/// Panel accounts and credentials.
pub mod accounts;
pub use accounts::{Account, AccountStore, AccountView, Credentials, PanelClaims, Role};

/// Bot client adapters.
pub mod adapter;
pub use adapter::{
    AdapterEvent, AdapterEventKind, BotConnection, BotConnector, ConnectRequest,
    LoopbackConnector, TcpConnector,
};

pub mod catalog;
pub use catalog::{NewServer, ServerCatalog, ServerConfig, ServerId};

pub mod errors;
pub use errors::{PanelError, PanelResult};

/// State change broadcast.
pub mod fanout;
pub use fanout::{ChatRecord, EventFanout, LogKind, PanelEvent};

/// Wire frames for the TCP adapter.
pub mod net;

/// The panel actor.
pub mod panel;
pub use panel::{PanelActor, PanelHandle, PanelSnapshot};

/// Bot sessions.
pub mod session;
pub use session::{SessionId, SessionRegistry, SessionStatus, SessionView};
