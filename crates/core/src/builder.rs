// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Envelope construction for producers.
//!
//! A builder is bound to one `event_type` (topic) and stamps every envelope
//! it builds with a fresh [`MessageId`] and the clock's current time.

use crate::clock::{Clock, SystemClock};
use crate::envelope::{
    Envelope, Fields, OperationCompleted, OperationFailed, OperationProgress, OperationStarted,
    Payload, QueryRequest, QueryResponse, QueryType, StateUpdate,
};
use crate::id::MessageId;
use crate::name::validate_channel_name;
use crate::validate::ValidationError;

/// Builds validated envelopes for one topic.
#[derive(Clone)]
pub struct MessageBuilder<C: Clock = SystemClock> {
    event_type: String,
    clock: C,
}

impl MessageBuilder<SystemClock> {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self { event_type: event_type.into(), clock: SystemClock }
    }
}

impl<C: Clock> MessageBuilder<C> {
    pub fn with_clock<D: Clock>(self, clock: D) -> MessageBuilder<D> {
        MessageBuilder { event_type: self.event_type, clock }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Build an envelope around any payload, running the same checks the
    /// validator applies to wire data.
    pub fn build(&self, payload: impl Into<Payload>) -> Result<Envelope, ValidationError> {
        validate_channel_name(&self.event_type)?;
        let payload = payload.into();
        payload.check()?;
        Ok(Envelope::from_parts(
            self.event_type.clone(),
            payload,
            MessageId::new(),
            self.clock.utc_now(),
        ))
    }

    pub fn operation_started(
        &self,
        operation_id: impl Into<String>,
        operation_name: impl Into<String>,
        parameters: Fields,
    ) -> Result<Envelope, ValidationError> {
        self.build(OperationStarted::new(operation_id, operation_name).parameters(parameters))
    }

    pub fn operation_progress(
        &self,
        operation_id: impl Into<String>,
        step_id: impl Into<String>,
        step_progress: f64,
        overall_progress: f64,
    ) -> Result<Envelope, ValidationError> {
        self.build(OperationProgress::new(operation_id, step_id, step_progress, overall_progress))
    }

    pub fn operation_completed(
        &self,
        operation_id: impl Into<String>,
        duration_seconds: f64,
        result: Fields,
    ) -> Result<Envelope, ValidationError> {
        self.build(OperationCompleted::new(operation_id, duration_seconds).result(result))
    }

    pub fn operation_failed(
        &self,
        operation_id: impl Into<String>,
        error_code: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Result<Envelope, ValidationError> {
        self.build(OperationFailed::new(operation_id, error_code, error_message))
    }

    pub fn state_update(
        &self,
        state_key: impl Into<String>,
        state_value: Fields,
    ) -> Result<Envelope, ValidationError> {
        self.build(StateUpdate::new(state_key, state_value))
    }

    pub fn query_request(
        &self,
        query_type: QueryType,
        parameters: Fields,
    ) -> Result<Envelope, ValidationError> {
        self.build(QueryRequest::new(query_type).parameters(parameters))
    }

    pub fn query_response(
        &self,
        query_id: impl Into<String>,
        result: Fields,
        error: Option<String>,
    ) -> Result<Envelope, ValidationError> {
        let mut response = QueryResponse::new(query_id, result);
        response.error = error;
        self.build(response)
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
