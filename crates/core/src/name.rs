// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Channel and topic name rules.
//!
//! Names end up as socket file stems, so they are restricted to
//! `[A-Za-z0-9_-]{1,64}`.

use crate::validate::ValidationError;

/// Longest accepted channel or topic name.
pub const MAX_NAME_LEN: usize = 64;

/// Channel producers push envelopes into.
pub const COMMAND_CHANNEL: &str = "command";

/// Channel monitors send queries on.
pub const QUERY_CHANNEL: &str = "query";

/// Appended to a topic to name its broadcast channel.
pub const TOPIC_SUFFIX: &str = "_events";

/// Channel name carrying a topic's events, e.g. `wallpaper_events`.
pub fn topic_channel(topic: &str, suffix: &str) -> String {
    format!("{topic}{suffix}")
}

/// Check a channel (or topic) name before any socket operation uses it.
pub fn validate_channel_name(name: &str) -> Result<(), ValidationError> {
    let invalid = |reason| ValidationError::InvalidName { name: name.to_string(), reason };
    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("longer than 64 characters"));
    }
    if !name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-') {
        return Err(invalid("only ASCII letters, digits, '_' and '-' are allowed"));
    }
    Ok(())
}
