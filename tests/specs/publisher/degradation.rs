// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Producers keep working when the daemon is absent.

use std::time::Instant;

use crate::prelude::*;

#[tokio::test]
async fn publish_without_daemon_fails_fast() {
    let dir = tempfile::tempdir().unwrap();
    let transport =
        TransportConfig::in_dir(dir.path()).connection_timeout(Duration::from_millis(300));
    let mut publisher = Publisher::new(transport);

    let started = Instant::now();
    for _ in 0..3 {
        assert!(!publisher.publish(&state("wallpaper", "path")).await);
    }
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn publisher_picks_up_a_daemon_that_starts_later() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::in_dir(dir.path());
    let mut publisher = Publisher::new(config.transport.clone());
    assert!(!publisher.publish(&state("wallpaper", "early")).await);

    let mut daemon = Daemon::new(config.clone()).unwrap();
    daemon.start().await.unwrap();
    let handle = daemon.handle();
    let task = tokio::spawn(async move { daemon.run().await });

    let envelope = state("wallpaper", "late");
    assert!(publisher.publish(&envelope).await);
    let mut subscriber =
        Subscriber::connect("wallpaper", &config.topic_suffix, &config.transport, SETTLE)
            .await
            .unwrap();
    assert_eq!(next(&mut subscriber).await.message_id(), envelope.message_id());

    handle.shutdown();
    tokio::time::timeout(SETTLE, task).await.unwrap().unwrap().unwrap();
}
