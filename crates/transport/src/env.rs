// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for transport defaults.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve socket directory: HERALD_SOCKET_DIR > XDG_RUNTIME_DIR/herald > $TMPDIR/herald-$USER
pub fn socket_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("HERALD_SOCKET_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    if let Ok(runtime) = std::env::var("XDG_RUNTIME_DIR") {
        if !runtime.is_empty() {
            return PathBuf::from(runtime).join("herald");
        }
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "default".to_string());
    std::env::temp_dir().join(format!("herald-{user}"))
}

/// Connection establishment timeout override
pub fn connect_timeout() -> Option<Duration> {
    parse_var::<u64>("HERALD_CONNECT_TIMEOUT_MS").map(Duration::from_millis)
}

/// Frame body size limit override
pub fn max_message_size() -> Option<usize> {
    parse_var("HERALD_MAX_MESSAGE_SIZE")
}

/// Per-server connection limit override
pub fn max_connections() -> Option<usize> {
    parse_var("HERALD_MAX_CONNECTIONS")
}

/// Pending-queue capacity override
pub fn queue_size() -> Option<usize> {
    parse_var("HERALD_QUEUE_SIZE")
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}
