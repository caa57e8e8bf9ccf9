// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown.

use crate::prelude::*;

#[tokio::test]
async fn shutdown_removes_every_socket() {
    let mut harness = Harness::start().await;
    assert!(harness.config.command_socket().exists());
    assert!(harness.config.query_socket().exists());

    let mut publisher = harness.publisher();
    assert!(publisher.publish(&state("wallpaper", "path")).await);
    let topic = harness.config.topic_socket("wallpaper");
    eventually(|| topic.exists()).await;

    harness.stop().await;
    assert!(!harness.config.command_socket().exists());
    assert!(!harness.config.query_socket().exists());
    assert!(!topic.exists());
}

#[tokio::test]
async fn repeated_shutdown_requests_are_harmless() {
    let dir = tempfile::tempdir().unwrap();
    let mut daemon = Daemon::new(Config::in_dir(dir.path())).unwrap();
    daemon.start().await.unwrap();
    let handle = daemon.handle();
    handle.shutdown();
    handle.shutdown();

    tokio::time::timeout(SETTLE, daemon.run()).await.unwrap().unwrap();
    daemon.stop().await;
    assert!(!daemon.config().command_socket().exists());
}

#[tokio::test]
async fn subscribers_see_the_channel_close() {
    let mut harness = Harness::start().await;
    let mut publisher = harness.publisher();
    assert!(publisher.publish(&state("theme", "mode")).await);
    let mut subscriber = harness.subscribe("theme").await;
    next(&mut subscriber).await;

    harness.stop().await;
    let result = tokio::time::timeout(SETTLE, subscriber.next()).await.unwrap();
    assert!(matches!(result, Err(ClientError::Socket(_))));
}

#[tokio::test]
async fn daemon_restarts_on_the_same_directory() {
    let mut first = Harness::start().await;
    let config = first.config.clone();
    first.stop().await;

    let mut daemon = Daemon::new(config).unwrap();
    daemon.start().await.unwrap();
    assert!(daemon.config().command_socket().exists());
    daemon.stop().await;
}
