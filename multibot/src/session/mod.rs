//! Bot sessions and the registry that owns them.
//!
//! Each session moves through a small state machine driven only by adapter
//! events:
//!
//! ```text
//! Connecting ──> Online ──> Disconnected
//!     │            ├──────> Kicked
//!     └──> Error <─┘
//! ```
//!
//! Terminal sessions stay visible until they are destroyed. Trying again
//! means creating a new session with a new id.

pub mod models;
pub mod registry;

pub use models::{Session, SessionId, SessionStatus, SessionView};
pub use registry::{SessionRegistry, Transition};
