// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thread-per-connection server over blocking sockets.

use std::io::Write;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use herald_core::ClientId;
use herald_wire::blocking::read_message;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::registry::ClientSink;
use crate::server::ServerShared;
use crate::stream::{StdListener, StdStream};
use crate::{
    Address, ClientInfo, Endpoint, NoHooks, ServerHooks, SocketError, SocketServer,
    TransportConfig,
};

/// Upper bound on how long `stop()` waits for connection threads.
const STOP_GRACE: Duration = Duration::from_secs(1);

/// A socket server that runs its accept loop and every connection on OS threads.
pub struct ThreadedServer<M> {
    shared: Arc<ServerShared<M>>,
    endpoint: Endpoint,
    accept_thread: Mutex<Option<JoinHandle<()>>>,
    handlers: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl<M> ThreadedServer<M>
where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    /// Create a server for a named channel. The name is validated here,
    /// before any socket exists.
    pub fn new(name: &str, config: TransportConfig) -> Result<Self, SocketError> {
        let endpoint = Endpoint::for_channel(name, &config);
        let shared = ServerShared::new(name, config, Arc::new(NoHooks))?;
        Ok(Self {
            shared: Arc::new(shared),
            endpoint,
            accept_thread: Mutex::new(None),
            handlers: Arc::new(Mutex::new(Vec::new())),
        })
    }

    /// Install lifecycle hooks. Must be called before `start()`.
    pub fn with_hooks(mut self, hooks: Arc<dyn ServerHooks<M>>) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.set_hooks(hooks);
        }
        self
    }

    /// Bind somewhere other than the config-derived endpoint.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn config(&self) -> &TransportConfig {
        &self.shared.config
    }

    /// Bind and start accepting.
    ///
    /// In blocking mode this does not return until `stop()` is called from
    /// another thread. Bind failures are returned to the caller.
    pub fn start(&self) -> Result<(), SocketError> {
        self.shared.ensure_startable()?;
        let (listener, address) = self.endpoint.bind(&self.shared.config)?;
        info!(channel = %self.shared.name, %address, "server started");
        self.shared.mark_running(address);

        let shared = Arc::clone(&self.shared);
        let handlers = Arc::clone(&self.handlers);
        if self.shared.config.blocking {
            accept_loop(listener, shared, handlers);
            return Ok(());
        }

        let handle = std::thread::Builder::new()
            .name(format!("herald-accept-{}", self.shared.name))
            .spawn(move || accept_loop(listener, shared, handlers))?;
        *self.accept_thread.lock() = Some(handle);
        Ok(())
    }
}

impl<M> ThreadedServer<M> {
    /// Close all clients and the listener, then wait briefly for threads to exit.
    /// Safe to call more than once.
    pub fn stop(&self) {
        if !self.shared.begin_stop() {
            return;
        }

        // Wake the accept loop so it observes the stopped state
        if let Some(address) = self.shared.address() {
            let _ = StdStream::connect(&address, Duration::from_millis(100));
        }
        self.shared.shutdown_clients();

        let deadline = Instant::now() + STOP_GRACE;
        let mut threads: Vec<JoinHandle<()>> = self.handlers.lock().drain(..).collect();
        if let Some(accept) = self.accept_thread.lock().take() {
            threads.push(accept);
        }
        while threads.iter().any(|t| !t.is_finished()) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        for thread in threads {
            if thread.is_finished() {
                let _ = thread.join();
            } else {
                debug!(channel = %self.shared.name, "thread still running after stop");
            }
        }

        self.shared.cleanup_socket();
    }
}

impl<M> SocketServer<M> for ThreadedServer<M>
where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    fn name(&self) -> &str {
        &self.shared.name
    }

    fn send(&self, message: &M, client_id: Option<&ClientId>) -> Result<(), SocketError> {
        self.shared.send(message, client_id)
    }

    fn is_running(&self) -> bool {
        self.shared.is_running()
    }

    fn list_clients(&self) -> Vec<ClientInfo> {
        self.shared.registry.clients()
    }

    fn queue_depth(&self) -> usize {
        self.shared.registry.queue_depth()
    }

    fn clear_queue(&self) {
        self.shared.registry.clear_queue()
    }

    fn local_address(&self) -> Option<Address> {
        self.shared.address()
    }
}

impl<M> Drop for ThreadedServer<M> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop<M>(
    listener: StdListener,
    shared: Arc<ServerShared<M>>,
    handlers: Arc<Mutex<Vec<JoinHandle<()>>>>,
) where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    loop {
        let accepted = listener.accept();
        if !shared.is_running() {
            break;
        }
        let (stream, peer) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                error!(channel = %shared.name, error = %e, "accept error");
                std::thread::sleep(Duration::from_millis(10));
                continue;
            }
        };

        let address = peer.map(|p| p.to_string()).unwrap_or_else(|| shared.address_label());
        let info = ClientInfo::accepted(address);
        let sink = match ThreadSink::new(&stream, shared.config.connection_timeout) {
            Ok(sink) => Arc::new(sink),
            Err(e) => {
                error!(channel = %shared.name, error = %e, "failed to prepare connection");
                continue;
            }
        };
        if !shared.attach(&info, sink) {
            let _ = stream.shutdown();
            continue;
        }

        let conn_shared = Arc::clone(&shared);
        let spawned = std::thread::Builder::new()
            .name(format!("herald-conn-{}", info.client_id.suffix()))
            .spawn(move || serve_connection(stream, info, conn_shared));
        match spawned {
            Ok(handle) => {
                let mut handlers = handlers.lock();
                handlers.retain(|h| !h.is_finished());
                handlers.push(handle);
            }
            Err(e) => error!(channel = %shared.name, error = %e, "failed to spawn handler"),
        }
    }
    debug!(channel = %shared.name, "accept loop exited");
}

fn serve_connection<M>(mut stream: StdStream, info: ClientInfo, shared: Arc<ServerShared<M>>)
where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    loop {
        match read_message(&mut stream, shared.config.max_message_size) {
            Ok(body) => shared.handle_inbound(&info, &body),
            Err(e) => {
                if !shared.read_error(&info, &e) {
                    break;
                }
            }
        }
    }
    shared.disconnect(&info.client_id);
}

/// Write half of a blocking connection.
struct ThreadSink {
    stream: Mutex<StdStream>,
}

impl ThreadSink {
    fn new(stream: &StdStream, write_timeout: Duration) -> std::io::Result<Self> {
        let writer = stream.try_clone()?;
        writer.set_write_timeout(Some(write_timeout))?;
        Ok(Self { stream: Mutex::new(writer) })
    }
}

impl ClientSink for ThreadSink {
    fn deliver(&self, frame: &[u8]) -> std::io::Result<()> {
        let mut stream = self.stream.lock();
        stream.write_all(frame)?;
        stream.flush()
    }

    fn close(&self) {
        let _ = self.stream.lock().shutdown();
    }
}

#[cfg(test)]
#[path = "threaded_tests.rs"]
mod tests;
