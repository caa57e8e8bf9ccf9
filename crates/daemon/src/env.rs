// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! Transport knobs (`HERALD_MAX_CONNECTIONS` and friends) are read by
//! [`herald_transport::env`]; this module covers the daemon-only ones.

use std::path::PathBuf;

/// Config file: HERALD_CONFIG > XDG_CONFIG_HOME/herald/config.toml > ~/.config/herald/config.toml
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = non_empty("HERALD_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("herald").join("config.toml"))
}

/// Explicit socket directory, when the user set one.
pub fn socket_dir_override() -> Option<PathBuf> {
    non_empty("HERALD_SOCKET_DIR").map(PathBuf::from)
}

/// Per-topic channel suffix override
pub fn topic_suffix() -> Option<String> {
    non_empty("HERALD_TOPIC_SUFFIX")
}

/// Log file path; logs go to stderr when unset
pub fn log_file() -> Option<PathBuf> {
    non_empty("HERALD_LOG_FILE").map(PathBuf::from)
}

/// Log filter directive: HERALD_LOG > RUST_LOG > "info"
pub fn log_filter() -> String {
    non_empty("HERALD_LOG")
        .or_else(|| non_empty("RUST_LOG"))
        .unwrap_or_else(|| "info".to_string())
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}
