// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport configuration shared by servers and clients.

use std::path::PathBuf;
use std::time::Duration;

use herald_wire::{Format, DEFAULT_MAX_MESSAGE_SIZE};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::env;

/// Settings for one server (or the clients talking to it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Directory holding `{name}.sock` files
    pub socket_dir: PathBuf,
    /// Upper bound on one frame body, in bytes
    pub max_message_size: usize,
    /// Connection establishment timeout (seconds in config files)
    #[serde(serialize_with = "ser_secs", deserialize_with = "de_secs")]
    pub connection_timeout: Duration,
    /// Connections beyond this count are closed on accept
    pub max_connections: usize,
    /// Pending-queue capacity while no client is attached
    pub message_queue_size: usize,
    /// Mode bits applied to the socket file after bind
    pub socket_permissions: u32,
    /// Run the accept loop on the caller instead of in the background
    pub blocking: bool,
    /// Deliver client-to-server messages to `on_message_received`
    pub allow_client_send: bool,
    /// Remove the socket file when the server stops
    pub remove_socket_on_stop: bool,
    /// Body serialization for this channel
    pub format: Format,
    /// Bind TCP instead of a Unix socket
    pub tcp: Option<TcpConfig>,
}

/// TCP binding: an explicit port, or the first free port in `port_range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcpConfig {
    pub host: String,
    pub port: Option<u16>,
    pub port_range: (u16, u16),
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: None, port_range: (47_800, 47_899) }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            socket_dir: env::socket_dir(),
            max_message_size: env::max_message_size().unwrap_or(DEFAULT_MAX_MESSAGE_SIZE),
            connection_timeout: env::connect_timeout().unwrap_or(Duration::from_secs(5)),
            max_connections: env::max_connections().unwrap_or(64),
            message_queue_size: env::queue_size().unwrap_or(100),
            socket_permissions: 0o600,
            blocking: false,
            allow_client_send: false,
            remove_socket_on_stop: true,
            format: Format::default(),
            tcp: None,
        }
    }
}

impl TransportConfig {
    /// Defaults rooted at a specific socket directory.
    pub fn in_dir(socket_dir: impl Into<PathBuf>) -> Self {
        Self { socket_dir: socket_dir.into(), ..Self::default() }
    }

    herald_core::setters! {
        into { socket_dir: PathBuf }
        set {
            max_message_size: usize,
            connection_timeout: Duration,
            max_connections: usize,
            message_queue_size: usize,
            socket_permissions: u32,
            blocking: bool,
            allow_client_send: bool,
            remove_socket_on_stop: bool,
            format: Format,
        }
        option { tcp: TcpConfig }
    }

    /// Socket file for a channel name under `socket_dir`.
    pub fn socket_path(&self, name: &str) -> PathBuf {
        self.socket_dir.join(format!("{name}.sock"))
    }
}

fn ser_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

fn de_secs<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
    let secs = f64::deserialize(d)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
