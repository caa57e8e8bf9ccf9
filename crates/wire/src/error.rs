// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Serialization and framing errors.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Message of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl MessageError {
    /// Whether the stream is still usable after this error.
    ///
    /// Decode failures and skipped oversized frames leave the framing intact;
    /// I/O errors and EOF do not.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, MessageError::Decode(_) | MessageError::TooLarge { .. })
    }
}
