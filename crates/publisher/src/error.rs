// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use herald_core::ValidationError;
use herald_transport::SocketError;
use thiserror::Error;

/// Errors from subscribing or querying.
///
/// [`crate::Publisher`] never returns these; it reports failure as `false`.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Channel {channel} did not appear within {waited_ms}ms")]
    ChannelUnavailable { channel: String, waited_ms: u128 },

    #[error("Daemon did not answer within {0}ms")]
    NoAnswer(u128),

    #[error("Unexpected reply: {0}")]
    UnexpectedReply(String),

    #[error(transparent)]
    Socket(#[from] SocketError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
