// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Envelope validation: untyped wire data in, typed [`Envelope`] out.
//!
//! Checks run in wire order so errors name the first offending field:
//! envelope shape, `event_type`, `payload.type`, payload fields, then
//! value ranges. `message_id` and `timestamp` are filled in when absent.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::envelope::{Envelope, MessageKind, Payload};
use crate::id::MessageId;
use crate::name::validate_channel_name;

/// Reasons an envelope (or a channel name) is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("envelope must be a JSON object")]
    NotAnObject,

    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be {expected}")]
    WrongType { field: &'static str, expected: &'static str },

    #[error("unknown message kind: {0:?}")]
    UnknownKind(String),

    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: MessageKind, reason: String },

    #[error("{field} out of range: {value} (expected 0..=100)")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Parses and checks envelopes received from the wire.
pub struct Validator;

impl Validator {
    /// Parse a JSON body into a validated envelope.
    pub fn parse(bytes: &[u8]) -> Result<Envelope, ValidationError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ValidationError::Malformed(e.to_string()))?;
        Self::validate(value)
    }

    /// Validate an already-decoded untyped value.
    pub fn validate(value: Value) -> Result<Envelope, ValidationError> {
        let Value::Object(mut obj) = value else {
            return Err(ValidationError::NotAnObject);
        };

        let event_type = match obj.remove("event_type") {
            Some(Value::String(s)) => s,
            Some(_) => {
                return Err(ValidationError::WrongType {
                    field: "event_type",
                    expected: "a string",
                })
            }
            None => return Err(ValidationError::MissingField("event_type")),
        };
        validate_channel_name(&event_type)?;

        let payload = match obj.remove("payload") {
            Some(v) => Self::validate_payload(v)?,
            None => return Err(ValidationError::MissingField("payload")),
        };

        let message_id = match obj.remove("message_id") {
            None | Some(Value::Null) => MessageId::new(),
            Some(Value::String(s)) if !s.is_empty() => MessageId::from_string(s),
            Some(_) => {
                return Err(ValidationError::WrongType {
                    field: "message_id",
                    expected: "a non-empty string",
                })
            }
        };

        let timestamp = match obj.remove("timestamp") {
            None | Some(Value::Null) => Utc::now(),
            Some(v) => parse_timestamp(&v)?,
        };

        Ok(Envelope::from_parts(event_type, payload, message_id, timestamp))
    }

    /// Validate a bare payload object.
    pub fn validate_payload(value: Value) -> Result<Payload, ValidationError> {
        let kind = {
            let Value::Object(obj) = &value else {
                return Err(ValidationError::WrongType { field: "payload", expected: "an object" });
            };
            match obj.get("type") {
                Some(Value::String(s)) => {
                    MessageKind::parse(s).ok_or_else(|| ValidationError::UnknownKind(s.clone()))?
                }
                Some(_) => {
                    return Err(ValidationError::WrongType {
                        field: "payload.type",
                        expected: "a string",
                    })
                }
                None => return Err(ValidationError::MissingField("payload.type")),
            }
        };

        let payload: Payload = serde_json::from_value(value)
            .map_err(|e| ValidationError::InvalidPayload { kind, reason: e.to_string() })?;
        payload.check()?;
        Ok(payload)
    }
}

/// Accepts RFC 3339, naive ISO 8601 (taken as UTC), or epoch seconds.
fn parse_timestamp(value: &Value) -> Result<DateTime<Utc>, ValidationError> {
    match value {
        Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Ok(dt.with_timezone(&Utc));
            }
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .map_err(|_| ValidationError::InvalidTimestamp(s.clone()))
        }
        Value::Number(n) => n
            .as_f64()
            .filter(|secs| secs.is_finite())
            .and_then(|secs| DateTime::from_timestamp_micros((secs * 1_000_000.0) as i64))
            .ok_or_else(|| ValidationError::InvalidTimestamp(n.to_string())),
        other => Err(ValidationError::InvalidTimestamp(other.to_string())),
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
