use super::errors::{FrameError, Result};
use bincode::{
    config,
    serde::{decode_from_slice, encode_to_vec},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum allowed frame size (1MB) to prevent unbounded allocation
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

pub async fn read_prefixed<T: DeserializeOwned, R: AsyncRead + Unpin>(reader: &mut R) -> Result<T> {
    // Read the size as a u32
    let mut len_bytes = [0; 4];
    reader.read_exact(&mut len_bytes).await?;
    let len = u32::from_le_bytes(len_bytes) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(FrameError::TooLarge {
            actual: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = vec![0; len];
    reader.read_exact(&mut buf).await?;

    let (value, _) = decode_from_slice(&buf, config::standard())?;
    Ok(value)
}

pub async fn write_prefixed<T: Serialize, W: AsyncWrite + Unpin>(
    writer: &mut W,
    value: &T,
) -> Result<()> {
    let serialized = encode_to_vec(value, config::standard())?;
    if serialized.len() > MAX_MESSAGE_SIZE {
        return Err(FrameError::TooLarge {
            actual: serialized.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }

    // Write the size and the data in one chunk to prevent read-side
    // EOF race conditions.
    let size = serialized.len() as u32;
    let mut buf = Vec::from(size.to_le_bytes());
    buf.extend(serialized);
    writer.write_all(&buf).await?;
    writer.flush().await?;
    Ok(())
}
