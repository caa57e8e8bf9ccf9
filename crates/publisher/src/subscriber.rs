// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Consumer side of a topic channel.

use std::time::Duration;

use herald_core::{topic_channel, Envelope, Validator};
use herald_transport::{SocketClient, SocketError, TransportConfig};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::ClientError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A connection to one topic's broadcast channel.
pub struct Subscriber {
    topic: String,
    client: SocketClient<Value>,
}

impl Subscriber {
    /// Connect to `{topic}{suffix}.sock`.
    ///
    /// The daemon creates a topic channel on the first message for that
    /// topic, so a missing socket is retried until `wait` elapses.
    pub async fn connect(
        topic: &str,
        suffix: &str,
        transport: &TransportConfig,
        wait: Duration,
    ) -> Result<Self, ClientError> {
        let channel = topic_channel(topic, suffix);
        let config = crate::daemon_channel(transport);
        let deadline = Instant::now() + wait;

        loop {
            match SocketClient::connect_channel(&channel, &config).await {
                Ok(client) => {
                    debug!(topic, "subscribed");
                    return Ok(Self { topic: topic.to_string(), client });
                }
                Err(SocketError::Connection(_) | SocketError::Timeout) => {
                    if Instant::now() + POLL_INTERVAL > deadline {
                        return Err(ClientError::ChannelUnavailable {
                            channel,
                            waited_ms: wait.as_millis(),
                        });
                    }
                    tokio::time::sleep(POLL_INTERVAL).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Wait for the next valid envelope. Undecodable frames and envelopes
    /// that fail validation are logged and skipped.
    pub async fn next(&mut self) -> Result<Envelope, ClientError> {
        loop {
            let value = match self.client.receive().await {
                Ok(value) => value,
                Err(SocketError::Message(e)) if e.is_recoverable() => {
                    warn!(topic = %self.topic, error = %e, "skipping unreadable frame");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            match Validator::validate(value) {
                Ok(envelope) => return Ok(envelope),
                Err(e) => warn!(topic = %self.topic, error = %e, "skipping invalid envelope"),
            }
        }
    }
}

#[cfg(test)]
#[path = "subscriber_tests.rs"]
mod tests;
