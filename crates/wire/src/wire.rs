// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed framing, async (tokio) and blocking (std) flavours.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::MessageError;

/// Size of the big-endian length prefix.
pub const PREFIX_LEN: usize = 4;

/// Default upper bound on a single frame body (1 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Prepend the length prefix to a body.
pub fn frame(body: &[u8]) -> Result<Vec<u8>, MessageError> {
    let len = u32::try_from(body.len())
        .map_err(|_| MessageError::TooLarge { size: body.len(), limit: u32::MAX as usize })?;
    let mut buf = Vec::with_capacity(PREFIX_LEN + body.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(body);
    Ok(buf)
}

/// Read one frame body.
///
/// A frame longer than `max_size` is consumed and discarded, then reported
/// as [`MessageError::TooLarge`]; the stream stays aligned on the next frame.
pub async fn read_message<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_size: usize,
) -> Result<Vec<u8>, MessageError> {
    let mut prefix = [0u8; PREFIX_LEN];
    reader.read_exact(&mut prefix).await.map_err(eof_as_closed)?;
    let len = u32::from_be_bytes(prefix) as usize;

    if len > max_size {
        let skipped =
            tokio::io::copy(&mut (&mut *reader).take(len as u64), &mut tokio::io::sink()).await?;
        if skipped < len as u64 {
            return Err(MessageError::ConnectionClosed);
        }
        return Err(MessageError::TooLarge { size: len, limit: max_size });
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(eof_as_closed)?;
    Ok(body)
}

/// Write one frame (prefix + body) and flush.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    body: &[u8],
) -> Result<(), MessageError> {
    let framed = frame(body)?;
    writer.write_all(&framed).await?;
    writer.flush().await?;
    Ok(())
}

fn eof_as_closed(e: std::io::Error) -> MessageError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        MessageError::ConnectionClosed
    } else {
        MessageError::Io(e)
    }
}

/// Blocking counterparts for thread-per-connection code.
pub mod blocking {
    use std::io::{Read, Write};

    use super::{eof_as_closed, frame, PREFIX_LEN};
    use crate::MessageError;

    /// Read one frame body; see [`super::read_message`] for oversize handling.
    pub fn read_message<R: Read>(reader: &mut R, max_size: usize) -> Result<Vec<u8>, MessageError> {
        let mut prefix = [0u8; PREFIX_LEN];
        reader.read_exact(&mut prefix).map_err(eof_as_closed)?;
        let len = u32::from_be_bytes(prefix) as usize;

        if len > max_size {
            let skipped =
                std::io::copy(&mut reader.by_ref().take(len as u64), &mut std::io::sink())?;
            if skipped < len as u64 {
                return Err(MessageError::ConnectionClosed);
            }
            return Err(MessageError::TooLarge { size: len, limit: max_size });
        }

        let mut body = vec![0u8; len];
        reader.read_exact(&mut body).map_err(eof_as_closed)?;
        Ok(body)
    }

    /// Write one frame (prefix + body) and flush.
    pub fn write_message<W: Write>(writer: &mut W, body: &[u8]) -> Result<(), MessageError> {
        let framed = frame(body)?;
        writer.write_all(&framed)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
