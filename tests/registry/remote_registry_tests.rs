// Registry tests with remote sources
//
// Mixes compiled-in tools with tools discovered from `mock-provider`.

use orrery_core::builtin::Weather;
use orrery_core::config::ProviderConfig;
use orrery_core::tooling::{
    ConnectionState, ProviderClient, RegistryError, ToolError, ToolRegistry, ToolSource,
    ValidationError,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn mock(name: &str) -> ProviderConfig {
    ProviderConfig::new(name, env!("CARGO_BIN_EXE_mock-provider"))
        .with_env("MOCK_PROVIDER_MODE", "normal")
        .with_handshake_timeout(Duration::from_secs(5))
        .with_call_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn remote_and_local_tools_share_one_dispatch_surface() {
    let client = ProviderClient::connect(mock("search")).await.expect("connects");
    let mut registry = ToolRegistry::new();
    registry
        .register(ToolSource::Local(Arc::new(Weather)))
        .expect("weather");
    let added = registry
        .register(ToolSource::Remote(client.clone()))
        .expect("remote");

    assert_eq!(registry.len(), added + 1);
    assert_eq!(registry.source_of("weather"), Some("local:weather"));
    assert_eq!(registry.source_of("echo"), Some("search"));

    let local = registry
        .dispatch("weather", json!({ "city": "Tokyo" }))
        .await
        .expect("local dispatch");
    assert_eq!(local, "It's always sunny in Tokyo!");

    let remote = registry
        .dispatch("web_search", json!({ "query": "rust" }))
        .await
        .expect("remote dispatch");
    assert_eq!(remote, "Results for rust: 3 articles");

    registry.shutdown().await;
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn remote_schemas_are_enforced_before_the_call_leaves_the_process() {
    let client = ProviderClient::connect(mock("search")).await.expect("connects");
    let mut registry = ToolRegistry::new();
    registry
        .register(ToolSource::Remote(client.clone()))
        .expect("remote");

    let err = registry
        .dispatch("echo", json!({ "text": 42 }))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ToolError::Validation(ValidationError::TypeMismatch { ref field, .. }) if field == "text"
    ));
    assert_eq!(client.pending_calls(), 0);

    registry.shutdown().await;
}

#[tokio::test]
async fn second_provider_with_same_tools_is_rejected_whole() {
    let first = ProviderClient::connect(mock("first")).await.expect("first");
    let second = ProviderClient::connect(mock("second")).await.expect("second");
    let mut registry = ToolRegistry::new();
    registry
        .register(ToolSource::Remote(first.clone()))
        .expect("first registers");
    let before = registry.len();

    let err = registry
        .register(ToolSource::Remote(second.clone()))
        .unwrap_err();

    match err {
        RegistryError::NameCollision {
            incoming, owner, ..
        } => {
            assert_eq!(incoming, "second");
            assert_eq!(owner, "first");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(registry.len(), before);
    assert_eq!(registry.providers().len(), 1);
    assert_eq!(registry.source_of("echo"), Some("first"));

    second.close().await;
    registry.shutdown().await;
}

#[tokio::test]
async fn undiscovered_provider_is_not_ready() {
    let client = ProviderClient::spawn(mock("early")).expect("spawn");
    let mut registry = ToolRegistry::new();

    let err = registry
        .register(ToolSource::Remote(client.clone()))
        .unwrap_err();

    assert!(matches!(
        err,
        RegistryError::ProviderNotReady {
            state: ConnectionState::Starting,
            ..
        }
    ));
    assert!(registry.is_empty());
    client.close().await;
}

#[tokio::test]
async fn crashed_provider_only_affects_its_own_tools() {
    let crashy = ProviderConfig::new("crashy", env!("CARGO_BIN_EXE_mock-provider"))
        .with_env("MOCK_PROVIDER_MODE", "crash_on_call")
        .with_handshake_timeout(Duration::from_secs(5));
    let client = ProviderClient::connect(crashy).await.expect("connects");
    let mut registry = ToolRegistry::new();
    registry
        .register(ToolSource::Local(Arc::new(Weather)))
        .expect("weather");
    registry
        .register(ToolSource::Remote(client))
        .expect("remote");

    let crashed = registry.dispatch("echo", json!({ "text": "x" })).await;
    assert!(matches!(crashed, Err(ToolError::ProviderCrashed { .. })), "{crashed:?}");

    let local = registry
        .dispatch("weather", json!({ "city": "Oslo" }))
        .await
        .expect("local tool unaffected");
    assert_eq!(local, "It's always sunny in Oslo!");

    registry.shutdown().await;
}
