// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Envelope: the unit of transmission between producers and monitors.
//!
//! An envelope groups one typed [`Payload`] under a free-form `event_type`
//! (the topic). The payload is internally tagged by `type`, so on the wire
//! an operation progress event looks like:
//!
//! ```json
//! {
//!   "event_type": "wallpaper",
//!   "payload": {"type": "operation_progress", "operation_id": "op-1", ...},
//!   "message_id": "msg-...",
//!   "timestamp": "2026-01-01T00:00:00Z"
//! }
//! ```
//!
//! Envelopes are immutable once built. Deserialization always goes through
//! the [`Validator`](crate::Validator), so a decoded envelope is a valid one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::MessageId;
use crate::validate::{ValidationError, Validator};

/// Free-form JSON object used for parameters, results and state values.
pub type Fields = serde_json::Map<String, Value>;

/// Closed set of payload kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    OperationStarted,
    OperationProgress,
    OperationCompleted,
    OperationFailed,
    StateUpdate,
    QueryRequest,
    QueryResponse,
}

impl MessageKind {
    pub const ALL: [MessageKind; 7] = [
        MessageKind::OperationStarted,
        MessageKind::OperationProgress,
        MessageKind::OperationCompleted,
        MessageKind::OperationFailed,
        MessageKind::StateUpdate,
        MessageKind::QueryRequest,
        MessageKind::QueryResponse,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }
}

crate::wire_names! {
    MessageKind {
        OperationStarted => "operation_started",
        OperationProgress => "operation_progress",
        OperationCompleted => "operation_completed",
        OperationFailed => "operation_failed",
        StateUpdate => "state_update",
        QueryRequest => "query_request",
        QueryResponse => "query_response",
    }
}

/// Questions a monitor can ask the daemon over the query channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    GetCurrentState,
    GetOperationStatus,
    ListEventTypes,
    GetEventHistory,
}

crate::wire_names! {
    QueryType {
        GetCurrentState => "get_current_state",
        GetOperationStatus => "get_operation_status",
        ListEventTypes => "list_event_types",
        GetEventHistory => "get_event_history",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStarted {
    pub operation_id: String,
    pub operation_name: String,
    pub parameters: Fields,
}

impl OperationStarted {
    pub fn new(operation_id: impl Into<String>, operation_name: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            operation_name: operation_name.into(),
            parameters: Fields::new(),
        }
    }

    crate::setters! {
        set { parameters: Fields }
    }
}

/// Progress of one step of a running operation. Percentages are in `0..=100`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationProgress {
    pub operation_id: String,
    pub step_id: String,
    pub step_progress: f64,
    pub overall_progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<u32>,
}

impl OperationProgress {
    pub fn new(
        operation_id: impl Into<String>,
        step_id: impl Into<String>,
        step_progress: f64,
        overall_progress: f64,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            step_id: step_id.into(),
            step_progress,
            overall_progress,
            step_name: None,
            total_steps: None,
            current_step: None,
        }
    }

    crate::setters! {
        option { step_name: String }
        some { total_steps: u32, current_step: u32 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationCompleted {
    pub operation_id: String,
    pub duration_seconds: f64,
    pub result: Fields,
}

impl OperationCompleted {
    pub fn new(operation_id: impl Into<String>, duration_seconds: f64) -> Self {
        Self { operation_id: operation_id.into(), duration_seconds, result: Fields::new() }
    }

    crate::setters! {
        set { result: Fields }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationFailed {
    pub operation_id: String,
    pub error_code: String,
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl OperationFailed {
    pub fn new(
        operation_id: impl Into<String>,
        error_code: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            error_code: error_code.into(),
            error_message: error_message.into(),
            step_id: None,
            traceback: None,
        }
    }

    crate::setters! {
        option { step_id: String, traceback: String }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    pub state_key: String,
    pub state_value: Fields,
}

impl StateUpdate {
    pub fn new(state_key: impl Into<String>, state_value: Fields) -> Self {
        Self { state_key: state_key.into(), state_value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query_type: QueryType,
    pub parameters: Fields,
}

impl QueryRequest {
    pub fn new(query_type: QueryType) -> Self {
        Self { query_type, parameters: Fields::new() }
    }

    crate::setters! {
        set { parameters: Fields }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query_id: String,
    pub result: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    pub fn new(query_id: impl Into<String>, result: Fields) -> Self {
        Self { query_id: query_id.into(), result, error: None }
    }

    crate::setters! {
        option { error: String }
    }
}

/// Typed payload, tagged on the wire by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    OperationStarted(OperationStarted),
    OperationProgress(OperationProgress),
    OperationCompleted(OperationCompleted),
    OperationFailed(OperationFailed),
    StateUpdate(StateUpdate),
    QueryRequest(QueryRequest),
    QueryResponse(QueryResponse),
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Payload::OperationStarted(_) => MessageKind::OperationStarted,
            Payload::OperationProgress(_) => MessageKind::OperationProgress,
            Payload::OperationCompleted(_) => MessageKind::OperationCompleted,
            Payload::OperationFailed(_) => MessageKind::OperationFailed,
            Payload::StateUpdate(_) => MessageKind::StateUpdate,
            Payload::QueryRequest(_) => MessageKind::QueryRequest,
            Payload::QueryResponse(_) => MessageKind::QueryResponse,
        }
    }

    /// Operation this payload belongs to, for the operation lifecycle kinds.
    pub fn operation_id(&self) -> Option<&str> {
        match self {
            Payload::OperationStarted(p) => Some(&p.operation_id),
            Payload::OperationProgress(p) => Some(&p.operation_id),
            Payload::OperationCompleted(p) => Some(&p.operation_id),
            Payload::OperationFailed(p) => Some(&p.operation_id),
            Payload::StateUpdate(_) | Payload::QueryRequest(_) | Payload::QueryResponse(_) => None,
        }
    }

    /// Value-level checks that serde cannot express.
    pub(crate) fn check(&self) -> Result<(), ValidationError> {
        let kind = self.kind();
        let invalid =
            |reason: &str| ValidationError::InvalidPayload { kind, reason: reason.into() };
        if let Some(operation_id) = self.operation_id() {
            if operation_id.is_empty() {
                return Err(invalid("operation_id must not be empty"));
            }
        }
        match self {
            Payload::OperationProgress(p) => {
                check_percent("step_progress", p.step_progress)?;
                check_percent("overall_progress", p.overall_progress)?;
                if p.total_steps == Some(0) {
                    return Err(invalid("total_steps must be at least 1"));
                }
                if let (Some(current), Some(total)) = (p.current_step, p.total_steps) {
                    if current > total {
                        return Err(invalid("current_step exceeds total_steps"));
                    }
                }
            }
            Payload::OperationCompleted(p) => {
                if !p.duration_seconds.is_finite() || p.duration_seconds < 0.0 {
                    return Err(invalid("duration_seconds must be a non-negative number"));
                }
            }
            Payload::OperationFailed(p) => {
                if p.error_code.is_empty() {
                    return Err(invalid("error_code must not be empty"));
                }
            }
            Payload::StateUpdate(p) => {
                if p.state_key.is_empty() {
                    return Err(invalid("state_key must not be empty"));
                }
            }
            Payload::QueryResponse(p) => {
                if p.query_id.is_empty() {
                    return Err(invalid("query_id must not be empty"));
                }
            }
            Payload::OperationStarted(_) | Payload::QueryRequest(_) => {}
        }
        Ok(())
    }
}

fn check_percent(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange { field, value })
    }
}

macro_rules! payload_from {
    ($($variant:ident),+ $(,)?) => {
        $(
            impl From<$variant> for Payload {
                fn from(p: $variant) -> Self {
                    Payload::$variant(p)
                }
            }
        )+
    };
}

payload_from!(
    OperationStarted,
    OperationProgress,
    OperationCompleted,
    OperationFailed,
    StateUpdate,
    QueryRequest,
    QueryResponse,
);

/// A validated, immutable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct Envelope {
    event_type: String,
    payload: Payload,
    message_id: MessageId,
    timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Assemble an envelope from already-checked parts.
    pub(crate) fn from_parts(
        event_type: String,
        payload: Payload,
        message_id: MessageId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self { event_type, payload, message_id, timestamp }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn kind(&self) -> MessageKind {
        self.payload.kind()
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    /// Serialize to the JSON body carried on daemon channels.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl TryFrom<Value> for Envelope {
    type Error = ValidationError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Validator::validate(value)
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
