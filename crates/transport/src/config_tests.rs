// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn clear_env() {
    for var in [
        "HERALD_SOCKET_DIR",
        "HERALD_MAX_MESSAGE_SIZE",
        "HERALD_CONNECT_TIMEOUT_MS",
        "HERALD_MAX_CONNECTIONS",
        "HERALD_QUEUE_SIZE",
    ] {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn defaults_match_documented_values() {
    clear_env();
    let config = TransportConfig::default();
    assert_eq!(config.max_message_size, 1024 * 1024);
    assert_eq!(config.connection_timeout, Duration::from_secs(5));
    assert_eq!(config.max_connections, 64);
    assert_eq!(config.message_queue_size, 100);
    assert_eq!(config.socket_permissions, 0o600);
    assert!(!config.blocking);
    assert!(!config.allow_client_send);
    assert!(config.remove_socket_on_stop);
    assert_eq!(config.format, Format::MessagePack);
    assert!(config.tcp.is_none());
}

#[test]
#[serial]
fn env_overrides_defaults() {
    clear_env();
    std::env::set_var("HERALD_SOCKET_DIR", "/tmp/herald-env-test");
    std::env::set_var("HERALD_MAX_MESSAGE_SIZE", "2048");
    std::env::set_var("HERALD_CONNECT_TIMEOUT_MS", "250");
    std::env::set_var("HERALD_MAX_CONNECTIONS", "3");
    std::env::set_var("HERALD_QUEUE_SIZE", "7");

    let config = TransportConfig::default();
    clear_env();

    assert_eq!(config.socket_dir, PathBuf::from("/tmp/herald-env-test"));
    assert_eq!(config.max_message_size, 2048);
    assert_eq!(config.connection_timeout, Duration::from_millis(250));
    assert_eq!(config.max_connections, 3);
    assert_eq!(config.message_queue_size, 7);
}

#[test]
#[serial]
fn unparsable_env_values_fall_back() {
    clear_env();
    std::env::set_var("HERALD_QUEUE_SIZE", "lots");
    let config = TransportConfig::default();
    clear_env();
    assert_eq!(config.message_queue_size, 100);
}

#[test]
#[serial]
fn socket_dir_prefers_runtime_dir_without_override() {
    clear_env();
    let saved = std::env::var("XDG_RUNTIME_DIR").ok();
    std::env::set_var("XDG_RUNTIME_DIR", "/run/user/1234");

    let dir = crate::env::socket_dir();

    match saved {
        Some(v) => std::env::set_var("XDG_RUNTIME_DIR", v),
        None => std::env::remove_var("XDG_RUNTIME_DIR"),
    }
    assert_eq!(dir, PathBuf::from("/run/user/1234/herald"));
}

#[test]
fn deserializes_partial_document_with_seconds() {
    let config: TransportConfig = serde_json::from_str(
        r#"{"socket_dir": "/tmp/x", "connection_timeout": 0.5, "format": "json"}"#,
    )
    .unwrap();
    assert_eq!(config.socket_dir, PathBuf::from("/tmp/x"));
    assert_eq!(config.connection_timeout, Duration::from_millis(500));
    assert_eq!(config.format, Format::Json);
    assert_eq!(config.socket_permissions, 0o600);
}

#[test]
fn negative_timeout_is_rejected() {
    let result = serde_json::from_str::<TransportConfig>(r#"{"connection_timeout": -1}"#);
    assert!(result.is_err());
}

#[test]
fn setters_chain() {
    let config = TransportConfig::in_dir("/tmp/chan")
        .max_connections(2)
        .message_queue_size(0)
        .allow_client_send(true)
        .tcp(TcpConfig::default());
    assert_eq!(config.max_connections, 2);
    assert_eq!(config.message_queue_size, 0);
    assert!(config.allow_client_send);
    assert_eq!(config.tcp.map(|t| t.host), Some("127.0.0.1".to_string()));
    assert_eq!(
        TransportConfig::in_dir("/tmp/chan").socket_path("wallpaper"),
        PathBuf::from("/tmp/chan/wallpaper.sock")
    );
}
