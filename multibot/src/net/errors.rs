//! Frame codec error types.

use std::io;
use thiserror::Error;

/// Errors that can occur while reading or writing frames
#[derive(Debug, Error)]
pub enum FrameError {
    /// Underlying socket error, including EOF
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to encode a frame
    #[error("Failed to encode frame: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    /// Failed to decode a frame
    #[error("Failed to decode frame: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// Frame size exceeded maximum allowed
    #[error("Frame size {actual} exceeds maximum {max}")]
    TooLarge { actual: usize, max: usize },
}

impl FrameError {
    /// True when the peer closed the stream
    pub fn is_eof(&self) -> bool {
        matches!(self, FrameError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// Result type for frame operations
pub type Result<T> = std::result::Result<T, FrameError>;
