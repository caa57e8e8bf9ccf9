// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic channels: created on demand, isolated, replaying to late subscribers.

use crate::prelude::*;

#[tokio::test]
async fn first_publish_creates_the_topic_socket() {
    let mut harness = Harness::start().await;
    let socket = harness.config.topic_socket("backup");
    assert!(!socket.exists());

    let mut publisher = harness.publisher();
    assert!(publisher.publish(&state("backup", "last_run")).await);
    eventually(|| socket.exists()).await;

    let mut subscriber = harness.subscribe("backup").await;
    assert_eq!(next(&mut subscriber).await.event_type(), "backup");
    harness.stop().await;
}

#[tokio::test]
async fn subscribers_only_receive_their_topic() {
    let mut harness = Harness::start().await;
    let mut publisher = harness.publisher();
    assert!(publisher.publish(&state("wallpaper", "seed")).await);
    assert!(publisher.publish(&state("theme", "seed")).await);

    let mut wallpaper = harness.subscribe("wallpaper").await;
    let mut theme = harness.subscribe("theme").await;
    next(&mut wallpaper).await;
    next(&mut theme).await;

    let for_theme = state("theme", "mode");
    assert!(publisher.publish(&for_theme).await);
    assert_eq!(next(&mut theme).await.message_id(), for_theme.message_id());
    silent(&mut wallpaper).await;

    let for_wallpaper = state("wallpaper", "path");
    assert!(publisher.publish(&for_wallpaper).await);
    assert_eq!(next(&mut wallpaper).await.message_id(), for_wallpaper.message_id());
    silent(&mut theme).await;

    harness.stop().await;
}

#[tokio::test]
async fn late_subscriber_gets_queued_messages_in_order() {
    let mut harness = Harness::start().await;
    let mut publisher = harness.publisher();
    let sent: Vec<Envelope> = (0..3).map(|i| state("backup", &format!("step-{i}"))).collect();
    for envelope in &sent {
        assert!(publisher.publish(envelope).await);
    }
    eventually(|| harness.config.topic_socket("backup").exists()).await;

    let mut subscriber = harness.subscribe("backup").await;
    let mut received = Vec::new();
    for _ in 0..3 {
        received.push(next(&mut subscriber).await.message_id().to_string());
    }
    let live = state("backup", "live");
    assert!(publisher.publish(&live).await);
    received.push(next(&mut subscriber).await.message_id().to_string());

    let expected: Vec<String> =
        sent.iter().chain([&live]).map(|e| e.message_id().to_string()).collect();
    similar_asserts::assert_eq!(received, expected);
    harness.stop().await;
}

#[tokio::test]
async fn invalid_envelopes_never_reach_subscribers() {
    let mut harness = Harness::start().await;
    let channel = harness.transport().format(herald_transport::Format::Json);
    let mut producer = SocketClient::<Value>::connect_channel("command", &channel).await.unwrap();

    producer
        .send(&json!({"event_type": "ghost", "payload": {"type": "operation_paused"}}))
        .await
        .unwrap();
    producer
        .send(&json!({"event_type": "backup", "payload": {"type": "teleported"}}))
        .await
        .unwrap();
    let valid = state("backup", "ok");
    producer.send(&valid.to_value().unwrap()).await.unwrap();

    let mut subscriber = harness.subscribe("backup").await;
    assert_eq!(next(&mut subscriber).await.message_id(), valid.message_id());
    silent(&mut subscriber).await;
    assert!(!harness.config.topic_socket("ghost").exists());
    harness.stop().await;
}

#[tokio::test]
async fn producers_do_not_block_each_other() {
    let mut harness = Harness::start().await;
    let channel = harness.transport().format(herald_transport::Format::Json);

    // Stays connected after sending garbage
    let mut stalled = SocketClient::<Value>::connect_channel("command", &channel).await.unwrap();
    stalled.send(&json!("nonsense")).await.unwrap();

    let mut publisher = harness.publisher();
    let envelope = state("theme", "mode");
    assert!(publisher.publish(&envelope).await);
    let mut subscriber = harness.subscribe("theme").await;
    assert_eq!(next(&mut subscriber).await.message_id(), envelope.message_id());
    harness.stop().await;
}
