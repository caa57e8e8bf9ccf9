// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness: a daemon running in a background task over a private
//! socket directory.

pub use std::time::Duration;

pub use herald_core::{Envelope, Fields, MessageBuilder, QueryType};
pub use herald_daemon::{Config, Daemon, DaemonError, DaemonHandle};
pub use herald_publisher::{ClientError, Publisher, QueryClient, Subscriber};
pub use herald_transport::{SocketClient, TransportConfig};
pub use serde_json::{json, Value};
pub use tempfile::TempDir;
use tokio::task::JoinHandle;

/// Generous upper bound for anything that should happen "immediately".
pub const SETTLE: Duration = Duration::from_secs(3);

pub struct Harness {
    _dir: TempDir,
    pub config: Config,
    handle: DaemonHandle,
    task: Option<JoinHandle<Result<(), DaemonError>>>,
}

impl Harness {
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::in_dir(dir.path());
        let mut daemon = Daemon::new(config.clone()).unwrap();
        daemon.start().await.unwrap();
        let handle = daemon.handle();
        let task = tokio::spawn(async move { daemon.run().await });
        Self { _dir: dir, config, handle, task: Some(task) }
    }

    pub fn transport(&self) -> TransportConfig {
        self.config.transport.clone()
    }

    pub fn publisher(&self) -> Publisher {
        Publisher::new(self.transport())
    }

    pub async fn subscribe(&self, topic: &str) -> Subscriber {
        Subscriber::connect(topic, &self.config.topic_suffix, &self.transport(), SETTLE)
            .await
            .unwrap()
    }

    pub async fn query(&self) -> QueryClient {
        QueryClient::connect("specs", &self.transport()).await.unwrap()
    }

    /// Request shutdown and wait for the event loop to finish.
    pub async fn stop(&mut self) {
        self.handle.shutdown();
        if let Some(task) = self.task.take() {
            let result = tokio::time::timeout(SETTLE, task).await.unwrap().unwrap();
            assert!(result.is_ok(), "daemon exited with {result:?}");
        }
    }
}

pub fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

pub fn state(topic: &str, key: &str) -> Envelope {
    MessageBuilder::new(topic).state_update(key, Fields::new()).unwrap()
}

pub async fn next(subscriber: &mut Subscriber) -> Envelope {
    tokio::time::timeout(SETTLE, subscriber.next()).await.expect("no envelope").unwrap()
}

/// Assert nothing arrives for a short while.
pub async fn silent(subscriber: &mut Subscriber) {
    let got = tokio::time::timeout(Duration::from_millis(150), subscriber.next()).await;
    assert!(got.is_err(), "unexpected envelope: {got:?}");
}

pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + SETTLE;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition never held");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
