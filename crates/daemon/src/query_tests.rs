// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use herald_core::{MessageBuilder, QueryResponse};
use herald_transport::TransportConfig;
use serde_json::json;
use tempfile::tempdir;
use yare::parameterized;

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn idle_broker(dir: &std::path::Path) -> Broker {
    Broker::new(TransportConfig::in_dir(dir), "_events")
}

fn request(query_type: QueryType, parameters: Value) -> QueryRequest {
    QueryRequest::new(query_type).parameters(fields(parameters))
}

fn populated() -> EventIndex {
    let mut index = EventIndex::new(8);
    let wallpaper = MessageBuilder::new("wallpaper");
    let theme = MessageBuilder::new("theme");
    index.record(&wallpaper.operation_started("op-1", "generate", Fields::new()).unwrap());
    index.record(&wallpaper.operation_progress("op-1", "blur", 40.0, 20.0).unwrap());
    index.record(&theme.state_update("mode", fields(json!({"dark": true}))).unwrap());
    index
}

fn response(envelope: &Envelope) -> &QueryResponse {
    match envelope.payload() {
        Payload::QueryResponse(r) => r,
        other => panic!("expected query_response, got {other:?}"),
    }
}

#[test]
fn current_state_for_one_key() {
    let dir = tempdir().unwrap();
    let result = resolve(
        &request(QueryType::GetCurrentState, json!({"state_key": "mode"})),
        &populated(),
        &idle_broker(dir.path()),
    )
    .unwrap();

    assert_eq!(result["state_key"], "mode");
    assert_eq!(result["value"], json!({"dark": true}));
    assert_eq!(result["event_type"], "theme");
}

#[test]
fn current_state_without_key_lists_everything() {
    let dir = tempdir().unwrap();
    let result = resolve(
        &request(QueryType::GetCurrentState, json!({})),
        &populated(),
        &idle_broker(dir.path()),
    )
    .unwrap();
    assert_eq!(result["states"]["mode"]["value"]["dark"], true);
}

#[test]
fn operation_status_returns_the_record() {
    let dir = tempdir().unwrap();
    let result = resolve(
        &request(QueryType::GetOperationStatus, json!({"operation_id": "op-1"})),
        &populated(),
        &idle_broker(dir.path()),
    )
    .unwrap();

    assert_eq!(result["operation"]["status"], "running");
    assert_eq!(result["operation"]["step_id"], "blur");
    assert_eq!(result["operation"]["overall_progress"], 20.0);
}

fn invalid(name: &'static str, expected: &'static str) -> QueryError {
    QueryError::InvalidParameter { name, expected }
}

#[parameterized(
    missing_operation_id = {
        QueryType::GetOperationStatus, json!({}),
        QueryError::MissingParameter("operation_id")
    },
    unknown_operation = {
        QueryType::GetOperationStatus, json!({"operation_id": "nope"}),
        QueryError::UnknownOperation("nope".into())
    },
    unknown_state = {
        QueryType::GetCurrentState, json!({"state_key": "nope"}),
        QueryError::UnknownStateKey("nope".into())
    },
    numeric_state_key = {
        QueryType::GetCurrentState, json!({"state_key": 7}),
        invalid("state_key", "a non-empty string")
    },
    negative_limit = {
        QueryType::GetEventHistory, json!({"limit": -1}),
        invalid("limit", "a non-negative integer")
    },
)]
fn bad_queries_are_rejected(query_type: QueryType, parameters: Value, expected: QueryError) {
    let dir = tempdir().unwrap();
    let err = resolve(&request(query_type, parameters), &populated(), &idle_broker(dir.path()))
        .unwrap_err();
    assert_eq!(err, expected);
}

#[test]
fn event_history_honours_filter_and_limit() {
    let dir = tempdir().unwrap();
    let broker = idle_broker(dir.path());
    let index = populated();

    let all =
        resolve(&request(QueryType::GetEventHistory, json!({})), &index, &broker).unwrap();
    assert_eq!(all["count"], 3);
    assert_eq!(all["events"][0]["payload"]["type"], "operation_started");

    let filtered = resolve(
        &request(QueryType::GetEventHistory, json!({"event_type": "wallpaper", "limit": 1})),
        &index,
        &broker,
    )
    .unwrap();
    assert_eq!(filtered["count"], 1);
    assert_eq!(filtered["events"][0]["payload"]["type"], "operation_progress");
}

#[tokio::test]
async fn list_event_types_includes_live_channels() {
    let dir = tempdir().unwrap();
    let mut broker = idle_broker(dir.path());
    let mut index = EventIndex::new(8);
    let envelope = MessageBuilder::new("wallpaper").state_update("k", Fields::new()).unwrap();
    index.record(&envelope);
    broker.broadcast(&envelope).await.unwrap();

    let result =
        resolve(&request(QueryType::ListEventTypes, json!({})), &index, &broker).unwrap();
    let entry = &result["event_types"][0];
    assert_eq!(entry["event_type"], "wallpaper");
    assert_eq!(entry["message_count"], 1);
    assert_eq!(entry["subscribers"], 0);
    assert!(entry["socket_path"].as_str().unwrap().ends_with("wallpaper_events.sock"));

    broker.stop().await;
}

#[test]
fn answer_echoes_the_request_id() {
    let dir = tempdir().unwrap();
    let query = MessageBuilder::new("monitor")
        .query_request(QueryType::GetCurrentState, fields(json!({"state_key": "mode"})))
        .unwrap();
    let responder = MessageBuilder::new("query");

    let reply =
        answer(query.to_value().unwrap(), &populated(), &idle_broker(dir.path()), &responder)
            .unwrap();

    assert_eq!(reply.event_type(), "query");
    let body = response(&reply);
    assert_eq!(body.query_id, query.message_id().as_str());
    assert!(body.error.is_none());
    assert_eq!(body.result["value"]["dark"], true);
}

#[test]
fn answer_reports_lookup_errors() {
    let dir = tempdir().unwrap();
    let query = MessageBuilder::new("monitor")
        .query_request(QueryType::GetOperationStatus, fields(json!({"operation_id": "ghost"})))
        .unwrap();

    let reply = answer(
        query.to_value().unwrap(),
        &populated(),
        &idle_broker(dir.path()),
        &MessageBuilder::new("query"),
    )
    .unwrap();

    let body = response(&reply);
    assert_eq!(body.error.as_deref(), Some("unknown operation: ghost"));
    assert!(body.result.is_empty());
}

#[test]
fn answer_rejects_non_query_payloads() {
    let dir = tempdir().unwrap();
    let update = MessageBuilder::new("theme").state_update("mode", Fields::new()).unwrap();

    let reply = answer(
        update.to_value().unwrap(),
        &populated(),
        &idle_broker(dir.path()),
        &MessageBuilder::new("query"),
    )
    .unwrap();

    let body = response(&reply);
    assert_eq!(body.query_id, update.message_id().as_str());
    assert!(body.error.as_deref().unwrap().contains("state_update"));
}

#[test]
fn answer_reports_malformed_envelopes() {
    let dir = tempdir().unwrap();
    let reply = answer(
        json!({"message_id": "msg-abc", "event_type": "x"}),
        &populated(),
        &idle_broker(dir.path()),
        &MessageBuilder::new("query"),
    )
    .unwrap();

    let body = response(&reply);
    assert_eq!(body.query_id, "msg-abc");
    assert!(body.error.as_deref().unwrap().contains("payload"), "{:?}", body.error);
}
