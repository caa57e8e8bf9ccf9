// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herald-publisher: client helpers for talking to the herald daemon
//!
//! - [`Publisher`] pushes envelopes into the command channel and never fails
//!   the caller when the daemon is missing.
//! - [`Subscriber`] follows one topic channel.
//! - [`QueryClient`] asks the daemon questions over the query channel.

mod error;
mod publisher;
mod query;
mod subscriber;

pub use error::ClientError;
pub use publisher::Publisher;
pub use query::QueryClient;
pub use subscriber::Subscriber;

use herald_transport::{Format, TransportConfig};

/// Daemon channels always carry JSON bodies.
fn daemon_channel(transport: &TransportConfig) -> TransportConfig {
    transport.clone().format(Format::Json)
}
