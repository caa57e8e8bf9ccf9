// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: bind the well-known channels, run the event loop, shut
//! everything down.

mod channels;

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use herald_core::{ClientId, Envelope, MessageBuilder};
use herald_transport::{AsyncServer, SocketError, SocketServer};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use self::channels::{CommandHooks, Inbound, QueryHooks};
use crate::{query, Broker, Config, EventIndex};

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Invalid config at {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Socket(#[from] SocketError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Asks a running daemon to stop from outside its event loop.
#[derive(Debug, Clone)]
pub struct DaemonHandle {
    shutdown: Arc<Notify>,
}

impl DaemonHandle {
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

/// The broker process: a command channel in, one broadcast channel per
/// topic out, and a query channel on the side.
pub struct Daemon {
    config: Config,
    broker: Broker,
    index: EventIndex,
    command: AsyncServer<Value>,
    query: AsyncServer<Value>,
    responder: MessageBuilder,
    inbox: mpsc::UnboundedReceiver<Inbound>,
    shutdown: Arc<Notify>,
    stopped: bool,
}

impl Daemon {
    pub fn new(config: Config) -> Result<Self, DaemonError> {
        let (tx, inbox) = mpsc::unbounded_channel();
        let channel = config.channel_config();
        let inbound = channel.clone().allow_client_send(true);

        let command = AsyncServer::new(&config.command_channel, inbound.clone())?
            .with_hooks(Arc::new(CommandHooks { tx: tx.clone() }));
        let query = AsyncServer::new(&config.query_channel, inbound)?
            .with_hooks(Arc::new(QueryHooks { tx }));

        Ok(Self {
            broker: Broker::new(channel, config.topic_suffix.clone()),
            index: EventIndex::new(config.history_size)
                .with_operation_limit(config.operation_limit),
            responder: MessageBuilder::new(config.query_channel.clone()),
            command,
            query,
            inbox,
            shutdown: Arc::new(Notify::new()),
            stopped: false,
            config,
        })
    }

    /// Bind the command and query channels.
    pub async fn start(&self) -> Result<(), DaemonError> {
        std::fs::create_dir_all(self.config.socket_dir())?;
        self.command.start().await?;
        if let Err(e) = self.query.start().await {
            self.command.stop().await;
            return Err(e.into());
        }
        info!(
            socket_dir = %self.config.socket_dir().display(),
            command = %self.config.command_channel,
            query = %self.config.query_channel,
            "daemon started"
        );
        Ok(())
    }

    pub fn handle(&self) -> DaemonHandle {
        DaemonHandle { shutdown: Arc::clone(&self.shutdown) }
    }

    /// Process inbound traffic until a shutdown request or signal, then stop.
    pub async fn run(&mut self) -> Result<(), DaemonError> {
        self.run_until(shutdown_signal()).await;
        Ok(())
    }

    /// Event loop that ends on `signal`, the shutdown handle or a closed
    /// inbox. Always stops the daemon before returning.
    pub(crate) async fn run_until(&mut self, signal: impl Future<Output = ()>) {
        let shutdown = Arc::clone(&self.shutdown);
        tokio::pin!(signal);

        loop {
            tokio::select! {
                inbound = self.inbox.recv() => match inbound {
                    Some(inbound) => self.dispatch(inbound).await,
                    None => break,
                },
                _ = shutdown.notified() => {
                    info!("shutdown requested");
                    break;
                }
                _ = &mut signal => break,
            }
        }

        self.stop().await;
    }

    async fn dispatch(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Command(envelope) => self.dispatch_command(envelope).await,
            Inbound::Query { client_id, request } => self.answer_query(&client_id, request),
        }
    }

    /// Fan a validated envelope out on its topic. Only envelopes that reached
    /// a topic channel are indexed.
    pub async fn dispatch_command(&mut self, envelope: Envelope) {
        debug!(
            event_type = envelope.event_type(),
            kind = %envelope.kind(),
            message_id = %envelope.message_id(),
            "dispatching"
        );
        match self.broker.broadcast(&envelope).await {
            Ok(()) => self.index.record(&envelope),
            Err(e) => warn!(event_type = envelope.event_type(), error = %e, "broadcast failed"),
        }
    }

    fn answer_query(&self, client_id: &ClientId, request: Value) {
        let response = match query::answer(request, &self.index, &self.broker, &self.responder) {
            Ok(response) => response,
            Err(e) => {
                warn!(client = %client_id, error = %e, "could not build query response");
                return;
            }
        };
        let body = match response.to_value() {
            Ok(body) => body,
            Err(e) => {
                warn!(client = %client_id, error = %e, "could not encode query response");
                return;
            }
        };
        if let Err(e) = self.query.send(&body, Some(client_id)) {
            debug!(client = %client_id, error = %e, "query client went away");
        }
    }

    /// Stop every channel and remove their sockets. Safe to call repeatedly.
    pub async fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        info!("shutting down daemon");
        self.command.stop().await;
        self.query.stop().await;
        self.broker.stop().await;
        info!("daemon shutdown complete");
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn index(&self) -> &EventIndex {
        &self.index
    }
}

/// Resolves on interrupt or SIGTERM. A signal that cannot be watched is
/// logged and never fires, so the daemon still shuts down through the others.
async fn shutdown_signal() {
    let interrupt = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("received interrupt"),
            Err(e) => {
                warn!(error = %e, "cannot watch for interrupts");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("received SIGTERM");
            }
            Err(e) => {
                warn!(error = %e, "cannot watch for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
