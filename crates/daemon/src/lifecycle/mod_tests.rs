// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::*;
use herald_core::{Fields, Payload, QueryType, Validator};
use herald_transport::SocketClient;
use serde_json::json;
use tempfile::tempdir;

async fn started(dir: &std::path::Path) -> Daemon {
    let daemon = Daemon::new(Config::in_dir(dir)).unwrap();
    daemon.start().await.unwrap();
    daemon
}

/// Drain the inbox until `done` holds or the deadline passes.
async fn pump(daemon: &mut Daemon, done: impl Fn(&Daemon) -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !done(daemon) {
        let inbound = tokio::time::timeout_at(deadline, daemon.inbox.recv())
            .await
            .expect("timed out waiting for inbound traffic")
            .expect("inbox closed");
        daemon.dispatch(inbound).await;
    }
}

#[tokio::test]
async fn start_binds_command_and_query_sockets() {
    let dir = tempdir().unwrap();
    let mut daemon = started(dir.path()).await;

    assert!(daemon.config().command_socket().exists());
    assert!(daemon.config().query_socket().exists());

    daemon.stop().await;
    assert!(!daemon.config().command_socket().exists());
    assert!(!daemon.config().query_socket().exists());
}

#[tokio::test]
async fn tcp_settings_do_not_move_daemon_channels_off_unix_sockets() {
    let dir = tempdir().unwrap();
    let mut config = Config::in_dir(dir.path());
    let tcp = herald_transport::TcpConfig { port: Some(47_951), ..Default::default() };
    config.transport = config.transport.tcp(tcp);
    let mut daemon = Daemon::new(config).unwrap();
    daemon.start().await.unwrap();

    assert!(daemon.config().command_socket().exists());
    assert!(daemon.config().query_socket().exists());
    daemon.stop().await;
}

#[tokio::test]
async fn commands_are_indexed_and_broadcast() {
    let dir = tempdir().unwrap();
    let mut daemon = started(dir.path()).await;
    let channel = daemon.config().channel_config();

    let mut producer = SocketClient::<Value>::connect_channel("command", &channel).await.unwrap();
    let envelope = MessageBuilder::new("wallpaper")
        .operation_started("op-1", "generate", Fields::new())
        .unwrap();
    producer.send(&envelope.to_value().unwrap()).await.unwrap();

    pump(&mut daemon, |d| d.index().operation("op-1").is_some()).await;
    assert_eq!(daemon.broker().topics(), vec!["wallpaper"]);
    assert!(daemon.config().topic_socket("wallpaper").exists());

    daemon.stop().await;
}

#[tokio::test]
async fn invalid_commands_are_dropped() {
    let dir = tempdir().unwrap();
    let mut daemon = started(dir.path()).await;
    let channel = daemon.config().channel_config();

    let mut producer = SocketClient::<Value>::connect_channel("command", &channel).await.unwrap();
    producer
        .send(&json!({"event_type": "bad", "payload": {"type": "operation_progress",
            "operation_id": "x", "step_id": "s", "step_progress": 500.0, "overall_progress": 1.0}}))
        .await
        .unwrap();
    let good = MessageBuilder::new("good").state_update("k", Fields::new()).unwrap();
    producer.send(&good.to_value().unwrap()).await.unwrap();

    pump(&mut daemon, |d| d.index().state("k").is_some()).await;
    assert_eq!(daemon.broker().topics(), vec!["good"]);

    daemon.stop().await;
}

#[tokio::test]
async fn queries_are_answered_on_the_asking_connection() {
    let dir = tempdir().unwrap();
    let mut daemon = started(dir.path()).await;
    daemon
        .dispatch_command(
            MessageBuilder::new("theme")
                .state_update("mode", json!({"dark": true}).as_object().cloned().unwrap())
                .unwrap(),
        )
        .await;
    let channel = daemon.config().channel_config();

    let mut monitor = SocketClient::<Value>::connect_channel("query", &channel).await.unwrap();
    let mut bystander = SocketClient::<Value>::connect_channel("query", &channel).await.unwrap();
    let mut params = Fields::new();
    params.insert("state_key".into(), json!("mode"));
    let request =
        MessageBuilder::new("monitor").query_request(QueryType::GetCurrentState, params).unwrap();
    monitor.send(&request.to_value().unwrap()).await.unwrap();

    let inbound = tokio::time::timeout(Duration::from_secs(2), daemon.inbox.recv())
        .await
        .unwrap()
        .unwrap();
    daemon.dispatch(inbound).await;

    let reply = tokio::time::timeout(Duration::from_secs(2), monitor.receive())
        .await
        .unwrap()
        .unwrap();
    let reply = Validator::validate(reply).unwrap();
    match reply.payload() {
        Payload::QueryResponse(r) => {
            assert_eq!(r.query_id, request.message_id().as_str());
            assert_eq!(r.result["value"]["dark"], true);
        }
        other => panic!("unexpected payload {other:?}"),
    }
    let nothing = tokio::time::timeout(Duration::from_millis(100), bystander.receive()).await;
    assert!(nothing.is_err(), "bystander must not see the reply");

    daemon.stop().await;
}

#[tokio::test]
async fn handle_stops_a_running_daemon() {
    let dir = tempdir().unwrap();
    let mut daemon = started(dir.path()).await;
    let handle = daemon.handle();
    let command_socket = daemon.config().command_socket();

    let runner = tokio::spawn(async move { daemon.run().await });
    handle.shutdown();

    let result = tokio::time::timeout(Duration::from_secs(3), runner).await.unwrap().unwrap();
    assert!(result.is_ok());
    assert!(!command_socket.exists());
}

#[tokio::test]
async fn stop_is_idempotent() {
    let dir = tempdir().unwrap();
    let mut daemon = started(dir.path()).await;
    let envelope = MessageBuilder::new("a").state_update("k", Fields::new()).unwrap();
    daemon.dispatch_command(envelope).await;
    daemon.stop().await;
    daemon.stop().await;
    assert!(daemon.broker().topics().is_empty());
    assert!(!daemon.config().topic_socket("a").exists());
}

#[tokio::test]
async fn signal_ends_the_loop_and_stops_the_daemon() {
    let dir = tempdir().unwrap();
    let mut daemon = started(dir.path()).await;

    tokio::time::timeout(Duration::from_secs(3), daemon.run_until(async {})).await.unwrap();

    assert!(!daemon.config().command_socket().exists());
    assert!(!daemon.config().query_socket().exists());
}

#[tokio::test]
async fn undeliverable_envelopes_are_not_indexed() {
    let dir = tempdir().unwrap();
    let mut daemon = started(dir.path()).await;
    // Valid event_type, but too long once the topic suffix is appended
    let topic = "t".repeat(60);
    let envelope = MessageBuilder::new(topic.as_str()).state_update("k", Fields::new()).unwrap();

    daemon.dispatch_command(envelope).await;

    assert!(daemon.broker().topics().is_empty());
    assert!(daemon.index().state("k").is_none());
    assert!(daemon.index().history(None, 10).is_empty());
    daemon.stop().await;
}
