// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task-per-connection server for a tokio runtime.
//!
//! Every connection gets a reader task and a writer task. Writes are queued
//! on an unbounded channel so `send()` never awaits, which lets it be called
//! from synchronous code inside the event loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use herald_core::ClientId;
use herald_wire::read_message;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::registry::ClientSink;
use crate::server::ServerShared;
use crate::stream::{AsyncListener, AsyncStream, BoxReader, BoxWriter};
use crate::{
    Address, ClientInfo, Endpoint, NoHooks, ServerHooks, SocketError, SocketServer,
    TransportConfig,
};

/// Upper bound on how long `stop()` waits for connection tasks.
const STOP_GRACE: Duration = Duration::from_secs(1);

/// A socket server driven by tokio tasks.
pub struct AsyncServer<M> {
    shared: Arc<ServerShared<M>>,
    endpoint: Endpoint,
    cancel: CancellationToken,
    tracker: TaskTracker,
}

impl<M> AsyncServer<M>
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
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
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
    /// In blocking mode the returned future runs the accept loop and only
    /// completes after `stop()`. Bind failures are returned to the caller.
    pub async fn start(&self) -> Result<(), SocketError> {
        self.shared.ensure_startable()?;
        let (listener, address) = self.endpoint.bind(&self.shared.config)?;
        let listener = listener.into_async()?;
        info!(channel = %self.shared.name, %address, "server started");
        self.shared.mark_running(address);

        let accept = accept_loop(
            listener,
            Arc::clone(&self.shared),
            self.cancel.clone(),
            self.tracker.clone(),
        );
        if self.shared.config.blocking {
            accept.await;
        } else {
            self.tracker.spawn(accept);
        }
        Ok(())
    }
}

impl<M> AsyncServer<M> {
    /// Close all clients and the listener, then wait briefly for tasks to exit.
    /// Safe to call more than once.
    pub async fn stop(&self) {
        if !self.shared.begin_stop() {
            return;
        }
        self.cancel.cancel();
        self.shared.shutdown_clients();

        self.tracker.close();
        if tokio::time::timeout(STOP_GRACE, self.tracker.wait()).await.is_err() {
            warn!(channel = %self.shared.name, "tasks still running after stop");
        }
        self.shared.cleanup_socket();
    }
}

impl<M> SocketServer<M> for AsyncServer<M>
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

impl<M> Drop for AsyncServer<M> {
    fn drop(&mut self) {
        // No grace wait here; tasks observe the cancellation on their own
        if self.shared.begin_stop() {
            self.cancel.cancel();
            self.shared.shutdown_clients();
            self.shared.cleanup_socket();
        }
    }
}

async fn accept_loop<M>(
    listener: AsyncListener,
    shared: Arc<ServerShared<M>>,
    cancel: CancellationToken,
    tracker: TaskTracker,
) where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            result = listener.accept() => match result {
                Ok((stream, peer)) => serve(stream, peer, &shared, &cancel, &tracker),
                Err(e) => {
                    error!(channel = %shared.name, error = %e, "accept error");
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            },
        }
    }
    debug!(channel = %shared.name, "accept loop exited");
}

fn serve<M>(
    stream: AsyncStream,
    peer: Option<SocketAddr>,
    shared: &Arc<ServerShared<M>>,
    cancel: &CancellationToken,
    tracker: &TaskTracker,
) where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    let address = peer.map(|p| p.to_string()).unwrap_or_else(|| shared.address_label());
    let info = ClientInfo::accepted(address);
    let (reader, writer) = stream.into_split();
    let (tx, rx) = mpsc::unbounded_channel();
    let conn_cancel = cancel.child_token();

    let sink = Arc::new(TaskSink { tx, cancel: conn_cancel.clone() });
    if !shared.attach(&info, sink) {
        // Dropping both halves closes the connection
        return;
    }

    let client_id = info.client_id.clone();
    tracker.spawn(write_task(writer, rx, client_id, Arc::clone(shared), conn_cancel.clone()));
    tracker.spawn(read_task(reader, info, Arc::clone(shared), conn_cancel));
}

async fn read_task<M>(
    mut reader: BoxReader,
    info: ClientInfo,
    shared: Arc<ServerShared<M>>,
    cancel: CancellationToken,
) where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    let max = shared.config.max_message_size;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            result = read_message(&mut reader, max) => match result {
                Ok(body) => shared.handle_inbound(&info, &body),
                Err(e) => {
                    if !shared.read_error(&info, &e) {
                        break;
                    }
                }
            },
        }
    }
    shared.disconnect(&info.client_id);
    cancel.cancel();
}

async fn write_task<M>(
    mut writer: BoxWriter,
    mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
    client_id: ClientId,
    shared: Arc<ServerShared<M>>,
    cancel: CancellationToken,
) where
    M: Serialize + DeserializeOwned + Send + 'static,
{
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = rx.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };
        let written = match writer.write_all(&frame).await {
            Ok(()) => writer.flush().await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            warn!(channel = %shared.name, %client_id, error = %e, "write failed, dropping client");
            shared.disconnect(&client_id);
            break;
        }
    }
    let _ = writer.shutdown().await;
    cancel.cancel();
}

/// Write side of a connection task pair.
struct TaskSink {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    cancel: CancellationToken,
}

impl ClientSink for TaskSink {
    fn deliver(&self, frame: &[u8]) -> std::io::Result<()> {
        self.tx
            .send(frame.to_vec())
            .map_err(|_| std::io::Error::from(std::io::ErrorKind::BrokenPipe))
    }

    fn close(&self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
#[path = "cooperative_tests.rs"]
mod tests;
