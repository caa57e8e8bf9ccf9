// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fire-and-forget producer client.

use std::time::Duration;

use herald_core::{Envelope, COMMAND_CHANNEL};
use herald_transport::{Address, SocketClient, SocketError, TransportConfig};
use tracing::{debug, warn};

/// Sends envelopes to the daemon's command channel.
///
/// Every failure is logged and reported as `false`; a producer keeps working
/// when nobody is listening. The connection is opened lazily by
/// [`Publisher::publish`] and closed when the publisher is dropped.
pub struct Publisher {
    address: Address,
    transport: TransportConfig,
    client: Option<SocketClient<Envelope>>,
}

impl Publisher {
    /// Target the command channel under `transport.socket_dir`.
    pub fn new(transport: TransportConfig) -> Self {
        let address = Address::Unix(transport.socket_path(COMMAND_CHANNEL));
        Self::at(address, transport)
    }

    /// Target an explicit address (another channel name or a TCP endpoint).
    pub fn at(address: Address, transport: TransportConfig) -> Self {
        Self { address, transport: crate::daemon_channel(&transport), client: None }
    }

    /// Connect now and keep the connection for the publisher's lifetime.
    pub async fn open(transport: TransportConfig) -> Self {
        let mut publisher = Self::new(transport);
        let timeout = publisher.transport.connection_timeout;
        publisher.connect(timeout).await;
        publisher
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// Open the connection, giving up after `timeout`.
    pub async fn connect(&mut self, timeout: Duration) -> bool {
        if self.client.is_some() {
            return true;
        }
        let config = self.transport.clone().connection_timeout(timeout);
        match SocketClient::connect(&self.address, &config).await {
            Ok(client) => {
                debug!(address = %self.address, "publisher connected");
                self.client = Some(client);
                true
            }
            Err(e) => {
                warn!(address = %self.address, error = %e, "daemon unreachable, not publishing");
                false
            }
        }
    }

    /// Send one envelope. Returns `false` if it could not be handed to the
    /// daemon; the next call reconnects.
    pub async fn publish(&mut self, envelope: &Envelope) -> bool {
        let timeout = self.transport.connection_timeout;
        if !self.connect(timeout).await {
            return false;
        }
        let Some(client) = self.client.as_mut() else {
            return false;
        };

        let outcome = tokio::time::timeout(timeout, client.send(envelope)).await;
        match outcome {
            Ok(Ok(())) => true,
            // Rejected before anything was written; the stream is still usable
            Ok(Err(SocketError::Message(e))) if e.is_recoverable() => {
                warn!(event_type = envelope.event_type(), error = %e, "envelope not sent");
                false
            }
            Ok(Err(e)) => {
                warn!(event_type = envelope.event_type(), error = %e, "publish failed");
                self.disconnect();
                false
            }
            Err(_) => {
                warn!(event_type = envelope.event_type(), "publish timed out");
                self.disconnect();
                false
            }
        }
    }

    pub fn disconnect(&mut self) {
        if self.client.take().is_some() {
            debug!(address = %self.address, "publisher disconnected");
        }
    }
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
