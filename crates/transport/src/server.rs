// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server contract and the state both backends share.

use std::sync::Arc;

use herald_core::{validate_channel_name, ClientId};
use herald_wire::{frame, MessageError};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::registry::{ClientRegistry, ClientSink};
use crate::{Address, ClientInfo, ServerHooks, SocketError, TransportConfig};

/// Operations every socket server backend supports.
///
/// `start`/`stop` are backend-specific (blocking vs. async) and live on the
/// concrete types.
pub trait SocketServer<M> {
    /// Channel name this server was created with.
    fn name(&self) -> &str;

    /// Broadcast `message` to every client, or unicast it to `client_id`.
    ///
    /// With no clients attached a broadcast is queued for the next one.
    fn send(&self, message: &M, client_id: Option<&ClientId>) -> Result<(), SocketError>;

    fn is_running(&self) -> bool;

    fn list_clients(&self) -> Vec<ClientInfo>;

    fn queue_depth(&self) -> usize;

    fn clear_queue(&self);

    /// Bound address, once started.
    fn local_address(&self) -> Option<Address>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Running,
    Stopped,
}

pub(crate) struct ServerShared<M> {
    pub name: String,
    pub config: TransportConfig,
    pub registry: ClientRegistry,
    hooks: Arc<dyn ServerHooks<M>>,
    phase: Mutex<Phase>,
    address: Mutex<Option<Address>>,
}

impl<M> ServerShared<M>
where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    pub fn new(
        name: &str,
        config: TransportConfig,
        hooks: Arc<dyn ServerHooks<M>>,
    ) -> Result<Self, SocketError> {
        validate_channel_name(name)?;
        let registry = ClientRegistry::new(config.max_connections, config.message_queue_size);
        Ok(Self {
            name: name.to_string(),
            config,
            registry,
            hooks,
            phase: Mutex::new(Phase::Idle),
            address: Mutex::new(None),
        })
    }

    pub fn encode(&self, message: &M) -> Result<Vec<u8>, SocketError> {
        let body = self.config.format.encode(message)?;
        if body.len() > self.config.max_message_size {
            return Err(MessageError::TooLarge {
                size: body.len(),
                limit: self.config.max_message_size,
            }
            .into());
        }
        Ok(frame(&body)?)
    }

    pub fn send(&self, message: &M, client_id: Option<&ClientId>) -> Result<(), SocketError> {
        if *self.phase.lock() == Phase::Stopped {
            return Err(SocketError::NotRunning(self.name.clone()));
        }
        let framed = self.encode(message)?;
        match client_id {
            None => {
                for info in self.registry.broadcast(&framed) {
                    self.hooks.on_client_disconnected(&info);
                }
            }
            Some(id) => {
                if let Some(info) = self.registry.unicast(id, &framed)? {
                    self.hooks.on_client_disconnected(&info);
                }
            }
        }
        Ok(())
    }

    /// Register an accepted connection. Returns false if it must be closed.
    pub fn attach(&self, info: &ClientInfo, sink: Arc<dyn ClientSink>) -> bool {
        match self.registry.attach(info.clone(), sink) {
            Ok(()) => {
                debug!(channel = %self.name, client_id = %info.client_id, "client connected");
                self.hooks.on_client_connected(info);
                true
            }
            Err(SocketError::MaxConnections(max)) => {
                warn!(channel = %self.name, max, "connection limit reached, rejecting client");
                false
            }
            Err(e) => {
                warn!(channel = %self.name, error = %e, "failed to attach client");
                false
            }
        }
    }

    pub fn disconnect(&self, client_id: &ClientId) {
        if let Some(info) = self.registry.detach(client_id) {
            debug!(channel = %self.name, %client_id, "client disconnected");
            self.hooks.on_client_disconnected(&info);
        }
    }

    /// Handle one inbound frame body from a client.
    pub fn handle_inbound(&self, client: &ClientInfo, body: &[u8]) {
        if !self.config.allow_client_send {
            debug!(channel = %self.name, client_id = %client.client_id, "ignoring client message");
            return;
        }
        match self.config.format.decode::<M>(body) {
            Ok(message) => self.hooks.on_message_received(client, message),
            Err(e) => warn!(
                channel = %self.name,
                client_id = %client.client_id,
                error = %e,
                "dropping undecodable message"
            ),
        }
    }

    /// Classify a read error. Returns true if the connection should keep reading.
    pub fn read_error(&self, client: &ClientInfo, e: &MessageError) -> bool {
        if e.is_recoverable() {
            warn!(
                channel = %self.name,
                client_id = %client.client_id,
                error = %e,
                "dropping frame"
            );
            return true;
        }
        if !matches!(e, MessageError::ConnectionClosed) {
            debug!(channel = %self.name, client_id = %client.client_id, error = %e, "read failed");
        }
        false
    }
}

impl<M> ServerShared<M> {
    pub fn set_hooks(&mut self, hooks: Arc<dyn ServerHooks<M>>) {
        self.hooks = hooks;
    }

    pub fn is_running(&self) -> bool {
        *self.phase.lock() == Phase::Running
    }

    pub fn ensure_startable(&self) -> Result<(), SocketError> {
        match *self.phase.lock() {
            Phase::Idle => Ok(()),
            Phase::Running | Phase::Stopped => Err(SocketError::AlreadyStarted(self.name.clone())),
        }
    }

    pub fn mark_running(&self, address: Address) {
        *self.address.lock() = Some(address);
        *self.phase.lock() = Phase::Running;
    }

    /// Transition to stopped. Returns true only for the call that stopped a
    /// running server, so cleanup happens once.
    pub fn begin_stop(&self) -> bool {
        let mut phase = self.phase.lock();
        let was_running = *phase == Phase::Running;
        *phase = Phase::Stopped;
        was_running
    }

    pub fn address(&self) -> Option<Address> {
        self.address.lock().clone()
    }

    /// Address recorded for clients whose transport has no peer address.
    pub fn address_label(&self) -> String {
        self.address().map(|a| a.to_string()).unwrap_or_else(|| self.name.clone())
    }

    /// Close every client, firing disconnect hooks.
    pub fn shutdown_clients(&self) {
        for info in self.registry.close_all() {
            self.hooks.on_client_disconnected(&info);
        }
    }

    pub fn cleanup_socket(&self) {
        if self.config.remove_socket_on_stop {
            if let Some(address) = self.address() {
                address.remove_socket_file();
            }
        }
        info!(channel = %self.name, "server stopped");
    }
}
