//! Wire protocol used by the TCP adapter.
//!
//! Frames are bincode-encoded and prefixed with their length as a
//! little-endian `u32`.

/// Codec error types.
pub mod errors;

/// Frame types for bot/game-server communication.
pub mod messages;

/// Length-prefixed frame reading and writing.
pub mod utils;

pub use errors::FrameError;
pub use messages::{ClientFrame, ServerFrame};
pub use utils::{read_prefixed, write_prefixed};
