// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use herald_core::{ClientId, ValidationError};
use herald_wire::MessageError;
use thiserror::Error;

/// Errors raised by socket servers and clients.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Operation timed out")]
    Timeout,

    #[error("Server at capacity ({0} connections)")]
    MaxConnections(usize),

    #[error("Client not connected: {0}")]
    ClientNotConnected(ClientId),

    #[error("No port available in range {start}-{end}")]
    NoPortAvailable { start: u16, end: u16 },

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server {0} cannot be started again")]
    AlreadyStarted(String),

    #[error("Server {0} is not running")]
    NotRunning(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SocketError {
    /// Map a client-side I/O failure, folding read/write timeouts into [`SocketError::Timeout`].
    pub(crate) fn from_client_io(e: MessageError) -> Self {
        match e {
            MessageError::Io(io)
                if matches!(
                    io.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                SocketError::Timeout
            }
            MessageError::ConnectionClosed => SocketError::Connection("connection closed".into()),
            other => SocketError::Message(other),
        }
    }
}
