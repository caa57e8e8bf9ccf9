// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic registry: one broadcast channel per topic, created on first use.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use herald_core::{topic_channel, validate_channel_name, Envelope, ValidationError};
use herald_transport::{AsyncServer, SocketError, SocketServer, TransportConfig};
use thiserror::Error;
use tracing::info;

/// Errors from broadcasting to a topic.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Topic {topic:?} cannot be used as a channel name: {source}")]
    InvalidTopic {
        topic: String,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Socket(#[from] SocketError),
}

struct TopicEntry {
    server: AsyncServer<Envelope>,
    socket_path: PathBuf,
    created_at: DateTime<Utc>,
}

/// Maps topics to live broadcast servers.
///
/// Owned by one daemon and only touched from its event loop, so it needs no
/// locking of its own.
pub struct Broker {
    topics: BTreeMap<String, TopicEntry>,
    transport: TransportConfig,
    suffix: String,
}

impl Broker {
    /// `transport` is used for every topic channel. Subscribers never send,
    /// so client-to-server delivery is always disabled.
    pub fn new(transport: TransportConfig, suffix: impl Into<String>) -> Self {
        Self {
            topics: BTreeMap::new(),
            transport: transport.allow_client_send(false),
            suffix: suffix.into(),
        }
    }

    /// Fan an envelope out on its topic's channel, creating the channel if
    /// this is the topic's first message.
    pub async fn broadcast(&mut self, envelope: &Envelope) -> Result<(), BrokerError> {
        let topic = envelope.event_type();
        if !self.topics.contains_key(topic) {
            let entry = self.create_topic(topic).await?;
            self.topics.insert(topic.to_string(), entry);
        }
        if let Some(entry) = self.topics.get(topic) {
            entry.server.send(envelope, None)?;
        }
        Ok(())
    }

    async fn create_topic(&self, topic: &str) -> Result<TopicEntry, BrokerError> {
        let channel = topic_channel(topic, &self.suffix);
        validate_channel_name(&channel)
            .map_err(|source| BrokerError::InvalidTopic { topic: topic.to_string(), source })?;

        let server = AsyncServer::new(&channel, self.transport.clone())?;
        server.start().await?;
        let socket_path = server
            .local_address()
            .and_then(|a| a.as_path().map(Path::to_path_buf))
            .unwrap_or_else(|| self.transport.socket_path(&channel));
        info!(topic, path = %socket_path.display(), "created topic channel");
        Ok(TopicEntry { server, socket_path, created_at: Utc::now() })
    }

    /// Stop every topic server and forget them. Safe to call repeatedly.
    pub async fn stop(&mut self) {
        let topics = std::mem::take(&mut self.topics);
        if !topics.is_empty() {
            info!(count = topics.len(), "stopping topic channels");
        }
        for (_, entry) in topics {
            entry.server.stop().await;
        }
    }

    /// Registered topics, sorted.
    pub fn topics(&self) -> Vec<&str> {
        self.topics.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.topics.contains_key(topic)
    }

    pub fn subscriber_count(&self, topic: &str) -> Option<usize> {
        self.topics.get(topic).map(|e| e.server.list_clients().len())
    }

    pub fn socket_path(&self, topic: &str) -> Option<&Path> {
        self.topics.get(topic).map(|e| e.socket_path.as_path())
    }

    pub fn created_at(&self, topic: &str) -> Option<DateTime<Utc>> {
        self.topics.get(topic).map(|e| e.created_at)
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
