//! Panel actor: the single owner of all mutable panel state.
//!
//! The session registry, server catalog and account store live inside one
//! Tokio task. Commands arrive on an mpsc inbox as [`PanelMessage`]s with a
//! oneshot reply; adapter lifecycle events arrive on a second channel. Both
//! are drained by the same `select!` loop, so no two mutations ever
//! interleave and cross-references (like resolving a server id on create)
//! always see a consistent state.
//!
//! ## Example
//!
//! ```no_run
//! use multibot::{
//!     accounts::{Account, AccountStore, Role},
//!     adapter::LoopbackConnector,
//!     catalog::ServerCatalog,
//!     fanout::EventFanout,
//!     panel::PanelActor,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let accounts = AccountStore::seeded(Account {
//!         username: "admin".to_string(),
//!         secret_hash: "<argon2 hash>".to_string(),
//!         role: Role::Admin,
//!     });
//!     let (actor, handle) = PanelActor::new(
//!         Arc::new(LoopbackConnector::new()),
//!         ServerCatalog::new(),
//!         accounts,
//!         EventFanout::default(),
//!     );
//!     tokio::spawn(actor.run());
//!
//!     let snapshot = handle.snapshot().await.unwrap();
//!     println!("{} sessions", snapshot.sessions.len());
//! }
//! ```

pub mod actor;
pub mod messages;

pub use actor::{PanelActor, PanelHandle};
pub use messages::{PanelMessage, PanelSnapshot};
