// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query channel answers built from live traffic.

use crate::prelude::*;

/// Publish and wait until a subscriber has seen the last envelope, so the
/// daemon has indexed everything.
async fn publish_all(harness: &Harness, topic: &str, envelopes: &[Envelope]) -> Subscriber {
    let mut publisher = harness.publisher();
    for envelope in envelopes {
        assert!(publisher.publish(envelope).await);
    }
    let mut subscriber = harness.subscribe(topic).await;
    for _ in envelopes {
        next(&mut subscriber).await;
    }
    subscriber
}

#[tokio::test]
async fn operation_status_tracks_progress() {
    let mut harness = Harness::start().await;
    let wallpaper = MessageBuilder::new("wallpaper");
    publish_all(
        &harness,
        "wallpaper",
        &[
            wallpaper.operation_started("op-7", "generate", Fields::new()).unwrap(),
            wallpaper.operation_progress("op-7", "blur", 100.0, 50.0).unwrap(),
        ],
    )
    .await;

    let mut query = harness.query().await;
    let params = fields(json!({"operation_id": "op-7"}));
    let response = query.ask(QueryType::GetOperationStatus, params).await.unwrap();
    assert!(response.error.is_none(), "{:?}", response.error);
    let operation = &response.result["operation"];
    assert_eq!(operation["status"], "running");
    assert_eq!(operation["operation_name"], "generate");
    assert_eq!(operation["overall_progress"], 50.0);

    harness.stop().await;
}

#[tokio::test]
async fn list_event_types_reports_subscribers() {
    let mut harness = Harness::start().await;
    let _subscriber = publish_all(&harness, "backup", &[state("backup", "last_run")]).await;

    let mut query = harness.query().await;
    let response = query.ask(QueryType::ListEventTypes, Fields::new()).await.unwrap();
    let topics = response.result["event_types"].as_array().unwrap();
    assert_eq!(topics.len(), 1);
    assert_eq!(topics[0]["event_type"], "backup");
    assert_eq!(topics[0]["message_count"], 1);
    assert_eq!(topics[0]["subscribers"], 1);

    harness.stop().await;
}

#[tokio::test]
async fn current_state_and_history() {
    let mut harness = Harness::start().await;
    let theme = MessageBuilder::new("theme");
    publish_all(
        &harness,
        "theme",
        &[
            theme.state_update("mode", fields(json!({"dark": false}))).unwrap(),
            theme.state_update("mode", fields(json!({"dark": true}))).unwrap(),
        ],
    )
    .await;

    let mut query = harness.query().await;
    let state = query
        .ask(QueryType::GetCurrentState, fields(json!({"state_key": "mode"})))
        .await
        .unwrap();
    assert_eq!(state.result["value"], json!({"dark": true}));

    let history = query
        .ask(QueryType::GetEventHistory, fields(json!({"event_type": "theme", "limit": 1})))
        .await
        .unwrap();
    assert_eq!(history.result["count"], 1);
    assert_eq!(history.result["events"][0]["payload"]["state_value"]["dark"], true);

    harness.stop().await;
}

#[tokio::test]
async fn unknown_lookups_come_back_as_errors() {
    let mut harness = Harness::start().await;
    let mut query = harness.query().await;

    let response = query
        .ask(QueryType::GetOperationStatus, fields(json!({"operation_id": "missing"})))
        .await
        .unwrap();
    assert_eq!(response.error.as_deref(), Some("unknown operation: missing"));

    // The connection stays usable after an error
    let response = query.ask(QueryType::ListEventTypes, Fields::new()).await.unwrap();
    assert!(response.error.is_none());
    harness.stop().await;
}
