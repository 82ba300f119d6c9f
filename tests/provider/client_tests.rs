// Provider client tests - spawning, discovery, calls and failure handling
//
// Every test drives the `mock-provider` binary over stdio.

use orrery_core::config::ProviderConfig;
use orrery_core::tooling::{ConnectionState, ProviderClient, ToolError};
use serde_json::json;
use std::time::{Duration, Instant};

fn mock(name: &str, mode: &str) -> ProviderConfig {
    ProviderConfig::new(name, env!("CARGO_BIN_EXE_mock-provider"))
        .with_env("MOCK_PROVIDER_MODE", mode)
        .with_handshake_timeout(Duration::from_secs(5))
        .with_call_timeout(Duration::from_secs(5))
        .with_shutdown_grace(Duration::from_secs(2))
}

async fn wait_for_state(client: &ProviderClient, expected: ConnectionState) {
    let deadline = Instant::now() + Duration::from_secs(3);
    while client.state() != expected {
        assert!(
            Instant::now() < deadline,
            "provider stayed {} instead of {}",
            client.state(),
            expected
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn discovery_lists_tools_and_keeps_instructions() {
    let config = mock("mock", "normal").with_env("MOCK_PROVIDER_INSTRUCTIONS", "Echo politely.");
    let client = ProviderClient::spawn(config).expect("spawn");
    assert_eq!(client.state(), ConnectionState::Starting);

    let descriptors = client.discover().await.expect("discovery");

    assert_eq!(client.state(), ConnectionState::Ready);
    let names: Vec<&str> = descriptors.iter().map(|d| d.name()).collect();
    assert!(names.contains(&"echo"));
    assert!(names.contains(&"web_search"));
    assert_eq!(client.instructions().as_deref(), Some("Echo politely."));
    assert_eq!(client.tools().len(), descriptors.len());

    client.close().await;
}

#[tokio::test]
async fn empty_catalogue_is_a_valid_provider() {
    let client = ProviderClient::connect(mock("empty", "empty"))
        .await
        .expect("connects");
    assert_eq!(client.state(), ConnectionState::Ready);
    assert!(client.descriptors().is_empty());
    client.close().await;
}

#[tokio::test]
async fn calls_return_joined_text_content() {
    let client = ProviderClient::connect(mock("mock", "normal"))
        .await
        .expect("connects");

    let echoed = client
        .call("echo", json!({ "text": "hello" }))
        .await
        .expect("echo");
    assert_eq!(echoed, "echo: hello");

    let multi = client.call("multi", serde_json::Value::Null).await.expect("multi");
    assert_eq!(multi, "line one\nline two");

    client.close().await;
}

#[tokio::test]
async fn tool_level_and_rpc_errors_are_typed() {
    let client = ProviderClient::connect(mock("mock", "normal"))
        .await
        .expect("connects");

    let failed = client.call("fail", json!({})).await.unwrap_err();
    assert!(
        matches!(failed, ToolError::Execution { ref message, .. } if message.contains("deliberate failure")),
        "{failed:?}"
    );

    let rpc = client.call("rpc_error", json!({})).await.unwrap_err();
    assert!(matches!(rpc, ToolError::Rpc { code: -32000, .. }), "{rpc:?}");

    // The connection survives both failures.
    assert_eq!(client.state(), ConnectionState::Ready);
    assert_eq!(client.call("echo", json!({"text": "still"})).await.expect("echo"), "echo: still");
    client.close().await;
}

#[tokio::test]
async fn env_overlay_reaches_the_subprocess() {
    let config = mock("mock", "normal").with_env("ORRERY_MOCK_SECRET", "s3cret");
    let client = ProviderClient::connect(config).await.expect("connects");

    let value = client
        .call("env", json!({ "name": "ORRERY_MOCK_SECRET" }))
        .await
        .expect("env");
    assert_eq!(value, "s3cret");
    client.close().await;
}

#[tokio::test]
async fn crash_mid_call_resolves_pending_calls_with_provider_crashed() {
    let client = ProviderClient::connect(mock("crashy", "crash_on_call"))
        .await
        .expect("connects");

    let outcome = tokio::time::timeout(
        Duration::from_secs(3),
        client.call("echo", json!({ "text": "boom" })),
    )
    .await
    .expect("crash is noticed promptly");

    assert!(
        matches!(outcome, Err(ToolError::ProviderCrashed { ref provider }) if provider == "crashy"),
        "{outcome:?}"
    );
    assert_eq!(client.pending_calls(), 0);
    wait_for_state(&client, ConnectionState::Closed).await;

    // No automatic respawn: later calls fail fast.
    let later = client.call("echo", json!({ "text": "again" })).await;
    assert!(matches!(later, Err(ToolError::ProviderCrashed { .. })), "{later:?}");

    client.close().await;
}

#[tokio::test]
async fn unanswered_call_times_out_and_frees_its_slot() {
    let config = mock("hang", "hang_on_call").with_call_timeout(Duration::from_millis(300));
    let client = ProviderClient::connect(config).await.expect("connects");

    let err = client
        .call("echo", json!({ "text": "anyone?" }))
        .await
        .unwrap_err();

    assert!(
        matches!(err, ToolError::ToolTimeout { ref tool, .. } if tool == "echo"),
        "{err:?}"
    );
    assert_eq!(client.pending_calls(), 0);
    assert_eq!(client.state(), ConnectionState::Ready);
    client.close().await;
}

#[tokio::test]
async fn silent_provider_handshake_times_out_as_degraded() {
    let config = mock("silent", "silent").with_handshake_timeout(Duration::from_millis(300));
    let client = ProviderClient::spawn(config).expect("spawn");

    let err = client.discover().await.unwrap_err();

    assert!(matches!(err, ToolError::ProviderUnavailable { .. }), "{err:?}");
    assert_eq!(client.state(), ConnectionState::Degraded);
    assert!(client.descriptors().is_empty());
    // Releasing again is a no-op.
    client.close().await;
    client.close().await;
}

#[tokio::test]
async fn missing_executable_is_unavailable() {
    let config = ProviderConfig::new("ghost", "/definitely/not/a/provider");
    let err = ProviderClient::spawn(config).unwrap_err();
    assert!(
        matches!(err, ToolError::ProviderUnavailable { ref provider, .. } if provider == "ghost"),
        "{err:?}"
    );
}

#[tokio::test]
async fn close_fails_in_flight_calls_and_rejects_new_ones() {
    let config = mock("hang", "hang_on_call").with_call_timeout(Duration::from_secs(10));
    let client = ProviderClient::connect(config).await.expect("connects");

    let in_flight = {
        let client = client.clone();
        tokio::spawn(async move { client.call("echo", json!({ "text": "wait" })).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(client.pending_calls(), 1);

    client.close().await;

    let outcome = in_flight.await.expect("task joins");
    assert!(
        matches!(outcome, Err(ToolError::ProviderUnavailable { .. })),
        "{outcome:?}"
    );
    assert_eq!(client.state(), ConnectionState::Closed);
    assert_eq!(client.pending_calls(), 0);

    let after = client.call("echo", json!({ "text": "late" })).await;
    assert!(matches!(after, Err(ToolError::ProviderUnavailable { .. })), "{after:?}");
}

#[tokio::test]
async fn interleaved_calls_overlap() {
    let client = ProviderClient::connect(mock("mock", "normal"))
        .await
        .expect("connects");

    let (first, second) = tokio::join!(
        client.call("rendezvous", json!({})),
        client.call("rendezvous", json!({}))
    );

    assert_eq!(first.expect("first"), "met");
    assert_eq!(second.expect("second"), "met");
    client.close().await;
}

#[tokio::test]
async fn non_interleaved_provider_queues_calls() {
    let config = mock("queued", "normal").with_interleaved(false);
    let client = ProviderClient::connect(config).await.expect("connects");

    let (first, second) = tokio::join!(
        client.call("rendezvous", json!({})),
        client.call("rendezvous", json!({}))
    );

    let mut replies = vec![first.expect("first"), second.expect("second")];
    replies.sort();
    assert_eq!(replies, vec!["alone".to_string(), "met".to_string()]);
    client.close().await;
}
