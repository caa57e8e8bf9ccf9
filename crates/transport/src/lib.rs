// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herald-transport: named pub/sub socket channels.
//!
//! A server binds one named channel, accepts subscribers, and broadcasts
//! (or unicasts) framed messages to them. While nobody is attached, messages
//! wait in a bounded drop-oldest queue and are replayed to the first client
//! that connects.
//!
//! Two backends satisfy the same contract:
//! - [`ThreadedServer`]: one OS thread for accepts, one per connection.
//! - [`AsyncServer`]: one tokio task per connection, suitable for a
//!   single-threaded runtime.

mod address;
mod blocking_client;
mod client;
mod config;
mod cooperative;
pub mod env;
mod error;
mod hooks;
mod registry;
mod server;
mod stream;
mod threaded;

pub use address::{Address, Endpoint, PortSpec};
pub use client::SocketClient;
pub use config::{TcpConfig, TransportConfig};
pub use cooperative::AsyncServer;
pub use error::SocketError;
pub use hooks::{NoHooks, ServerHooks};
pub use registry::ClientInfo;
pub use server::SocketServer;
pub use threaded::ThreadedServer;

pub use herald_wire::{Format, MessageError};

/// Blocking client for thread-based consumers.
pub mod blocking {
    pub use crate::blocking_client::SocketClient;
}
