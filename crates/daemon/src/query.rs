// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query resolution against the event index and live broker state.

use herald_core::{
    Envelope, Fields, MessageBuilder, Payload, QueryRequest, QueryType, ValidationError, Validator,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use crate::{Broker, EventIndex};

/// Why a query could not be answered.
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("parameter {name} must be {expected}")]
    InvalidParameter { name: &'static str, expected: &'static str },

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("unknown state key: {0}")]
    UnknownStateKey(String),

    #[error("expected a query_request payload, got {0}")]
    NotAQuery(String),
}

/// Turn a raw request body into the response envelope sent back to the
/// asking client.
///
/// Every request gets a reply: malformed envelopes and failed lookups come
/// back as a `query_response` with `error` set and an empty result.
pub fn answer(
    request: Value,
    index: &EventIndex,
    broker: &Broker,
    responder: &MessageBuilder,
) -> Result<Envelope, ValidationError> {
    let fallback_id = request
        .get("message_id")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let envelope = match Validator::validate(request) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(error = %e, "rejected query");
            return responder.query_response(fallback_id, Fields::new(), Some(e.to_string()));
        }
    };
    let query_id = envelope.message_id().to_string();
    let outcome = match envelope.payload() {
        Payload::QueryRequest(request) => resolve(request, index, broker),
        other => Err(QueryError::NotAQuery(other.kind().to_string())),
    };
    match outcome {
        Ok(result) => responder.query_response(query_id, result, None),
        Err(e) => {
            debug!(query_id, error = %e, "query failed");
            responder.query_response(query_id, Fields::new(), Some(e.to_string()))
        }
    }
}

/// Answer one query. The returned map becomes `QueryResponse.result`.
pub fn resolve(
    request: &QueryRequest,
    index: &EventIndex,
    broker: &Broker,
) -> Result<Fields, QueryError> {
    let params = &request.parameters;
    let result = match request.query_type {
        QueryType::GetCurrentState => match optional_str(params, "state_key")? {
            Some(key) => {
                let state = index
                    .state(key)
                    .ok_or_else(|| QueryError::UnknownStateKey(key.to_string()))?;
                json!({
                    "state_key": key,
                    "value": state.value,
                    "event_type": state.event_type,
                    "updated_at": state.updated_at,
                })
            }
            None => {
                let states: serde_json::Map<String, Value> = index
                    .states()
                    .map(|(key, state)| {
                        let entry = json!({
                            "value": state.value,
                            "event_type": state.event_type,
                            "updated_at": state.updated_at,
                        });
                        (key.to_string(), entry)
                    })
                    .collect();
                json!({ "states": states })
            }
        },
        QueryType::GetOperationStatus => {
            let id = optional_str(params, "operation_id")?
                .ok_or(QueryError::MissingParameter("operation_id"))?;
            let record = index
                .operation(id)
                .ok_or_else(|| QueryError::UnknownOperation(id.to_string()))?;
            json!({ "operation": record })
        }
        QueryType::ListEventTypes => {
            let event_types: Vec<Value> = index
                .topics()
                .map(|(topic, stats)| {
                    json!({
                        "event_type": topic,
                        "socket_path": broker.socket_path(topic).map(|p| p.display().to_string()),
                        "message_count": stats.message_count,
                        "last_seen": stats.last_seen,
                        "subscribers": broker.subscriber_count(topic).unwrap_or(0),
                    })
                })
                .collect();
            json!({ "event_types": event_types })
        }
        QueryType::GetEventHistory => {
            let event_type = optional_str(params, "event_type")?;
            let limit = match params.get("limit") {
                None | Some(Value::Null) => index.history_size(),
                Some(v) => v.as_u64().map(|n| n as usize).ok_or(QueryError::InvalidParameter {
                    name: "limit",
                    expected: "a non-negative integer",
                })?,
            };
            let events = index.history(event_type, limit);
            json!({ "count": events.len(), "events": events })
        }
    };

    match result {
        Value::Object(map) => Ok(map),
        _ => Ok(Fields::new()),
    }
}

fn optional_str<'a>(params: &'a Fields, name: &'static str) -> Result<Option<&'a str>, QueryError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if !s.is_empty() => Ok(Some(s)),
        Some(_) => Err(QueryError::InvalidParameter { name, expected: "a non-empty string" }),
    }
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
