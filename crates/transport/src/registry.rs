// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client registry and pending-message queue shared by both backends.
//!
//! Frames are stored already encoded, so the registry is independent of the
//! message type and body format.

use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use herald_core::{ClientId, Clock, SystemClock};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::SocketError;

/// A connected client, as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    pub client_id: ClientId,
    /// Epoch milliseconds at accept time
    pub connected_at: u64,
    /// Socket path for Unix channels, `host:port` of the peer for TCP
    pub address: String,
}

impl ClientInfo {
    pub(crate) fn accepted(address: String) -> Self {
        Self { client_id: ClientId::new(), connected_at: SystemClock.epoch_ms(), address }
    }
}

/// Write side of one connection.
pub(crate) trait ClientSink: Send + Sync {
    /// Deliver one framed message. An error means the client is gone.
    fn deliver(&self, frame: &[u8]) -> io::Result<()>;

    /// Close the connection, unblocking its reader.
    fn close(&self);
}

struct Attached {
    info: ClientInfo,
    sink: Arc<dyn ClientSink>,
}

#[derive(Default)]
struct Inner {
    clients: IndexMap<ClientId, Attached>,
    pending: VecDeque<Vec<u8>>,
}

pub(crate) struct ClientRegistry {
    inner: Mutex<Inner>,
    max_connections: usize,
    queue_capacity: usize,
}

impl ClientRegistry {
    pub fn new(max_connections: usize, queue_capacity: usize) -> Self {
        Self { inner: Mutex::new(Inner::default()), max_connections, queue_capacity }
    }

    /// Register a client, first replaying any pending frames to it in order.
    ///
    /// Replay happens under the lock so no live broadcast can overtake it.
    pub fn attach(&self, info: ClientInfo, sink: Arc<dyn ClientSink>) -> Result<(), SocketError> {
        let mut inner = self.inner.lock();
        if inner.clients.len() >= self.max_connections {
            return Err(SocketError::MaxConnections(self.max_connections));
        }

        if !inner.pending.is_empty() {
            debug!(client_id = %info.client_id, count = inner.pending.len(), "replaying queue");
        }
        while let Some(frame) = inner.pending.pop_front() {
            if let Err(e) = sink.deliver(&frame) {
                inner.pending.push_front(frame);
                return Err(SocketError::Io(e));
            }
        }

        inner.clients.insert(info.client_id.clone(), Attached { info, sink });
        Ok(())
    }

    pub fn detach(&self, client_id: &ClientId) -> Option<ClientInfo> {
        let removed = self.inner.lock().clients.shift_remove(client_id)?;
        removed.sink.close();
        Some(removed.info)
    }

    /// Send a frame to every attached client, or queue it if there are none.
    ///
    /// Returns the clients removed because their write failed.
    pub fn broadcast(&self, frame: &[u8]) -> Vec<ClientInfo> {
        let targets: Vec<(ClientId, Arc<dyn ClientSink>)> = {
            let mut inner = self.inner.lock();
            if inner.clients.is_empty() {
                self.enqueue(&mut inner, frame);
                return Vec::new();
            }
            inner.clients.iter().map(|(id, c)| (id.clone(), Arc::clone(&c.sink))).collect()
        };

        let mut failed = Vec::new();
        for (id, sink) in targets {
            if let Err(e) = sink.deliver(frame) {
                warn!(client_id = %id, error = %e, "write failed, dropping client");
                if let Some(info) = self.detach(&id) {
                    failed.push(info);
                }
            }
        }
        failed
    }

    /// Send a frame to one client.
    ///
    /// On write failure the client is removed and returned as `Ok(Some(..))`.
    pub fn unicast(
        &self,
        client_id: &ClientId,
        frame: &[u8],
    ) -> Result<Option<ClientInfo>, SocketError> {
        let sink = match self.inner.lock().clients.get(client_id) {
            Some(c) => Arc::clone(&c.sink),
            None => return Err(SocketError::ClientNotConnected(client_id.clone())),
        };
        match sink.deliver(frame) {
            Ok(()) => Ok(None),
            Err(e) => {
                warn!(%client_id, error = %e, "write failed, dropping client");
                Ok(self.detach(client_id))
            }
        }
    }

    fn enqueue(&self, inner: &mut Inner, frame: &[u8]) {
        if self.queue_capacity == 0 {
            return;
        }
        while inner.pending.len() >= self.queue_capacity {
            inner.pending.pop_front();
        }
        inner.pending.push_back(frame.to_vec());
    }

    pub fn clients(&self) -> Vec<ClientInfo> {
        self.inner.lock().clients.values().map(|c| c.info.clone()).collect()
    }

    pub fn queue_depth(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn clear_queue(&self) {
        self.inner.lock().pending.clear();
    }

    /// Close and forget every client, returning who was attached.
    pub fn close_all(&self) -> Vec<ClientInfo> {
        let drained: Vec<Attached> = self.inner.lock().clients.drain(..).map(|(_, c)| c).collect();
        drained
            .into_iter()
            .map(|c| {
                c.sink.close();
                c.info
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
