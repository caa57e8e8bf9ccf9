// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::ClientInfo;

/// Lifecycle callbacks for a socket server.
///
/// Hooks run on the connection's own thread or task, so they must not block
/// for long. `on_message_received` only fires when the server was configured
/// with `allow_client_send`.
pub trait ServerHooks<M>: Send + Sync {
    fn on_client_connected(&self, _client: &ClientInfo) {}

    fn on_client_disconnected(&self, _client: &ClientInfo) {}

    fn on_message_received(&self, _client: &ClientInfo, _message: M) {}
}

/// Hooks that do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl<M> ServerHooks<M> for NoHooks {}
