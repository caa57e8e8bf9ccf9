// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hooks that move inbound traffic off connection tasks and into the daemon
//! event loop.

use herald_core::{ClientId, Envelope, Validator};
use herald_transport::{ClientInfo, ServerHooks};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Work for the event loop.
#[derive(Debug)]
pub(crate) enum Inbound {
    /// A valid envelope from a producer, to be broadcast on its topic
    Command(Envelope),
    /// A raw query body and the client waiting for the answer
    Query { client_id: ClientId, request: Value },
}

/// Command channel: validate, then forward. Invalid envelopes stop here.
pub(crate) struct CommandHooks {
    pub(crate) tx: mpsc::UnboundedSender<Inbound>,
}

impl ServerHooks<Value> for CommandHooks {
    fn on_client_connected(&self, client: &ClientInfo) {
        debug!(client = %client.client_id, "producer connected");
    }

    fn on_client_disconnected(&self, client: &ClientInfo) {
        debug!(client = %client.client_id, "producer disconnected");
    }

    fn on_message_received(&self, client: &ClientInfo, message: Value) {
        match Validator::validate(message) {
            Ok(envelope) => {
                let _ = self.tx.send(Inbound::Command(envelope));
            }
            Err(e) => {
                warn!(client = %client.client_id, error = %e, "dropping invalid envelope");
            }
        }
    }
}

/// Query channel: forward every request; validation happens while answering
/// so malformed queries still get an error reply.
pub(crate) struct QueryHooks {
    pub(crate) tx: mpsc::UnboundedSender<Inbound>,
}

impl ServerHooks<Value> for QueryHooks {
    fn on_message_received(&self, client: &ClientInfo, message: Value) {
        let client_id = client.client_id.clone();
        let _ = self.tx.send(Inbound::Query { client_id, request: message });
    }
}
