// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory view of broadcast traffic, used to answer queries.
//!
//! Owned by the daemon event loop and never persisted; it starts empty on
//! every daemon start.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use herald_core::{Envelope, Fields, Payload};
use indexmap::IndexMap;
use serde::Serialize;

/// Default cap on tracked operations.
pub const DEFAULT_OPERATION_LIMIT: usize = 1024;

/// Lifecycle position of an operation, from its most recent event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Started,
    Running,
    Completed,
    Failed,
}

herald_core::wire_names! {
    OperationStatus {
        Started => "started",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

/// Everything known about one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationRecord {
    pub operation_id: String,
    pub event_type: String,
    pub status: OperationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Fields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl OperationRecord {
    pub fn is_finished(&self) -> bool {
        matches!(self.status, OperationStatus::Completed | OperationStatus::Failed)
    }

    fn new(operation_id: &str, envelope: &Envelope) -> Self {
        Self {
            operation_id: operation_id.to_string(),
            event_type: envelope.event_type().to_string(),
            status: OperationStatus::Started,
            operation_name: None,
            started_at: None,
            updated_at: envelope.timestamp(),
            step_id: None,
            step_name: None,
            step_progress: None,
            overall_progress: None,
            duration_seconds: None,
            result: None,
            error_code: None,
            error_message: None,
        }
    }
}

/// Latest value published for a state key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateRecord {
    pub value: Fields,
    pub event_type: String,
    pub updated_at: DateTime<Utc>,
}

/// Traffic seen on one topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicStats {
    pub message_count: u64,
    pub last_seen: DateTime<Utc>,
}

/// Operations, states, topic counters and a bounded history of envelopes.
///
/// Operations are kept in first-seen order. Past `operation_limit` the oldest
/// finished operation is forgotten first, then the oldest running one.
#[derive(Debug)]
pub struct EventIndex {
    operations: IndexMap<String, OperationRecord>,
    operation_limit: usize,
    states: BTreeMap<String, StateRecord>,
    topics: BTreeMap<String, TopicStats>,
    history: VecDeque<Envelope>,
    history_size: usize,
}

impl EventIndex {
    pub fn new(history_size: usize) -> Self {
        Self {
            operations: IndexMap::new(),
            operation_limit: DEFAULT_OPERATION_LIMIT,
            states: BTreeMap::new(),
            topics: BTreeMap::new(),
            history: VecDeque::new(),
            history_size,
        }
    }

    pub fn with_operation_limit(mut self, limit: usize) -> Self {
        self.operation_limit = limit;
        self
    }

    /// Fold one broadcast envelope into the index.
    pub fn record(&mut self, envelope: &Envelope) {
        let at = envelope.timestamp();
        let stats = self
            .topics
            .entry(envelope.event_type().to_string())
            .or_insert(TopicStats { message_count: 0, last_seen: at });
        stats.message_count += 1;
        stats.last_seen = stats.last_seen.max(at);

        match envelope.payload() {
            Payload::OperationStarted(p) => {
                let op = self.operation_mut(&p.operation_id, envelope);
                op.status = OperationStatus::Started;
                op.operation_name = Some(p.operation_name.clone());
                op.started_at = Some(at);
            }
            Payload::OperationProgress(p) => {
                let op = self.operation_mut(&p.operation_id, envelope);
                // Late progress never reopens a finished operation
                if !op.is_finished() {
                    op.status = OperationStatus::Running;
                }
                op.step_id = Some(p.step_id.clone());
                op.step_name = p.step_name.clone().or(op.step_name.take());
                op.step_progress = Some(p.step_progress);
                op.overall_progress = Some(p.overall_progress);
            }
            Payload::OperationCompleted(p) => {
                let op = self.operation_mut(&p.operation_id, envelope);
                op.status = OperationStatus::Completed;
                op.duration_seconds = Some(p.duration_seconds);
                op.overall_progress = Some(100.0);
                op.result = Some(p.result.clone());
            }
            Payload::OperationFailed(p) => {
                let op = self.operation_mut(&p.operation_id, envelope);
                op.status = OperationStatus::Failed;
                op.error_code = Some(p.error_code.clone());
                op.error_message = Some(p.error_message.clone());
                if let Some(step) = &p.step_id {
                    op.step_id = Some(step.clone());
                }
            }
            Payload::StateUpdate(p) => {
                self.states.insert(
                    p.state_key.clone(),
                    StateRecord {
                        value: p.state_value.clone(),
                        event_type: envelope.event_type().to_string(),
                        updated_at: at,
                    },
                );
            }
            Payload::QueryRequest(_) | Payload::QueryResponse(_) => {}
        }
        self.evict_operations();

        if self.history_size > 0 {
            while self.history.len() >= self.history_size {
                self.history.pop_front();
            }
            self.history.push_back(envelope.clone());
        }
    }

    fn operation_mut(&mut self, operation_id: &str, envelope: &Envelope) -> &mut OperationRecord {
        let op = self
            .operations
            .entry(operation_id.to_string())
            .or_insert_with(|| OperationRecord::new(operation_id, envelope));
        op.updated_at = envelope.timestamp();
        op
    }

    fn evict_operations(&mut self) {
        while self.operations.len() > self.operation_limit {
            let victim =
                self.operations.values().position(OperationRecord::is_finished).unwrap_or(0);
            self.operations.shift_remove_index(victim);
        }
    }

    pub fn operation(&self, operation_id: &str) -> Option<&OperationRecord> {
        self.operations.get(operation_id)
    }

    pub fn state(&self, state_key: &str) -> Option<&StateRecord> {
        self.states.get(state_key)
    }

    /// All state keys, sorted.
    pub fn states(&self) -> impl Iterator<Item = (&str, &StateRecord)> {
        self.states.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every topic seen so far, sorted by name.
    pub fn topics(&self) -> impl Iterator<Item = (&str, &TopicStats)> {
        self.topics.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The most recent `limit` envelopes, oldest first, optionally for one topic.
    pub fn history(&self, event_type: Option<&str>, limit: usize) -> Vec<&Envelope> {
        let mut matching: Vec<&Envelope> = self
            .history
            .iter()
            .rev()
            .filter(|e| event_type.map_or(true, |t| e.event_type() == t))
            .take(limit)
            .collect();
        matching.reverse();
        matching
    }

    pub fn history_size(&self) -> usize {
        self.history_size
    }
}

#[cfg(test)]
#[path = "index_tests.rs"]
mod tests;
