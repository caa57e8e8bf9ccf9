// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.
//!
//! Resolution order: built-in defaults, then the TOML file, then environment
//! variables.

use std::path::{Path, PathBuf};

use herald_core::{topic_channel, COMMAND_CHANNEL, QUERY_CHANNEL, TOPIC_SUFFIX};
use herald_transport::{Format, TransportConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::env;
use crate::index::DEFAULT_OPERATION_LIMIT;
use crate::lifecycle::DaemonError;

/// Daemon configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings shared by every channel the daemon binds
    pub transport: TransportConfig,
    /// Command channel name (`command.sock`)
    pub command_channel: String,
    /// Query channel name (`query.sock`)
    pub query_channel: String,
    /// Appended to a topic to name its channel
    pub topic_suffix: String,
    /// Envelopes kept for `get_event_history`
    pub history_size: usize,
    /// Operations remembered for `get_operation_status`
    pub operation_limit: usize,
    /// Write logs here instead of stderr
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            command_channel: COMMAND_CHANNEL.to_string(),
            query_channel: QUERY_CHANNEL.to_string(),
            topic_suffix: TOPIC_SUFFIX.to_string(),
            history_size: 256,
            operation_limit: DEFAULT_OPERATION_LIMIT,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration for the user-level daemon.
    pub fn load() -> Result<Self, DaemonError> {
        let mut config = match env::config_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading config file");
                Self::from_file(&path)?
            }
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, DaemonError> {
        let config_err =
            |message: String| DaemonError::Config { path: path.to_path_buf(), message };
        let text = std::fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        Self::from_toml(&text).map_err(|e| config_err(e.to_string()))
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Defaults with every socket under `socket_dir`.
    pub fn in_dir(socket_dir: impl Into<PathBuf>) -> Self {
        Self { transport: TransportConfig::in_dir(socket_dir), ..Self::default() }
    }

    /// Overlay environment variables onto file and default values.
    pub fn apply_env(&mut self) {
        if let Some(dir) = env::socket_dir_override() {
            self.transport.socket_dir = dir;
        }
        if let Some(size) = herald_transport::env::max_message_size() {
            self.transport.max_message_size = size;
        }
        if let Some(timeout) = herald_transport::env::connect_timeout() {
            self.transport.connection_timeout = timeout;
        }
        if let Some(max) = herald_transport::env::max_connections() {
            self.transport.max_connections = max;
        }
        if let Some(size) = herald_transport::env::queue_size() {
            self.transport.message_queue_size = size;
        }
        if let Some(suffix) = env::topic_suffix() {
            self.topic_suffix = suffix;
        }
        if let Some(path) = env::log_file() {
            self.log_file = Some(path);
        }
    }

    pub fn socket_dir(&self) -> &Path {
        &self.transport.socket_dir
    }

    pub fn command_socket(&self) -> PathBuf {
        self.transport.socket_path(&self.command_channel)
    }

    pub fn query_socket(&self) -> PathBuf {
        self.transport.socket_path(&self.query_channel)
    }

    /// Socket a topic's subscribers connect to.
    pub fn topic_socket(&self, topic: &str) -> PathBuf {
        self.transport.socket_path(&topic_channel(topic, &self.topic_suffix))
    }

    /// Transport settings for daemon channels: JSON bodies, background accept,
    /// always Unix sockets under `socket_dir`. A `tcp` section only applies to
    /// channels bound directly through the transport crate.
    pub(crate) fn channel_config(&self) -> TransportConfig {
        let mut config = self.transport.clone().format(Format::Json).blocking(false);
        config.tcp = None;
        config
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
