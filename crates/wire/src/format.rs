// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::MessageError;

/// Body serialization used on a channel. One format per channel; mixing is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// Textual JSON, used for daemon envelope traffic.
    Json,
    /// Compact MessagePack with named fields, the generic transport default.
    #[default]
    #[serde(rename = "msgpack")]
    MessagePack,
}

impl Format {
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, MessageError> {
        match self {
            Format::Json => {
                serde_json::to_vec(value).map_err(|e| MessageError::Encode(e.to_string()))
            }
            Format::MessagePack => {
                rmp_serde::to_vec_named(value).map_err(|e| MessageError::Encode(e.to_string()))
            }
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, MessageError> {
        match self {
            Format::Json => {
                serde_json::from_slice(bytes).map_err(|e| MessageError::Decode(e.to_string()))
            }
            Format::MessagePack => {
                rmp_serde::from_slice(bytes).map_err(|e| MessageError::Decode(e.to_string()))
            }
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Format::Json => "json",
            Format::MessagePack => "msgpack",
        })
    }
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
