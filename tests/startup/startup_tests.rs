// Startup tests - building the registry from configuration

use orrery_core::config::{AgentSettings, ModelConfig, ProviderConfig, ToolSettings};
use orrery_core::startup::{StartupError, build_registry};
use orrery_core::tooling::{ConnectionState, RegistryError};
use orrery_core::AppConfig;
use std::time::Duration;

fn mock(name: &str, mode: &str) -> ProviderConfig {
    ProviderConfig::new(name, env!("CARGO_BIN_EXE_mock-provider"))
        .with_env("MOCK_PROVIDER_MODE", mode)
        .with_handshake_timeout(Duration::from_millis(1500))
}

fn config(providers: Vec<ProviderConfig>) -> AppConfig {
    AppConfig {
        model: ModelConfig::default(),
        agent: AgentSettings::default(),
        tools: ToolSettings {
            builtin: vec!["weather".to_string()],
            filesystem_root: None,
        },
        providers,
    }
}

#[tokio::test]
async fn healthy_and_silent_providers_start_gracefully() {
    let report = build_registry(&config(vec![
        mock("search", "normal"),
        mock("mute", "silent"),
    ]))
    .await
    .expect("startup succeeds");

    assert_eq!(report.started, vec!["search".to_string()]);
    assert_eq!(report.excluded.len(), 1);
    assert_eq!(report.excluded[0].name, "mute");
    assert!(report.excluded[0].reason.contains("timed out"));
    assert!(report.registry.contains("weather"));
    assert!(report.registry.contains("echo"));

    report.registry.shutdown().await;
}

#[tokio::test]
async fn required_provider_that_never_answers_aborts_startup() {
    let err = build_registry(&config(vec![
        mock("search", "normal"),
        mock("mute", "silent").with_required(true),
    ]))
    .await
    .err()
    .expect("startup fails");

    assert!(matches!(
        err,
        StartupError::RequiredProvider { ref provider, .. } if provider == "mute"
    ));
}

#[tokio::test]
async fn colliding_providers_are_fatal_at_startup() {
    let err = build_registry(&config(vec![mock("first", "normal"), mock("second", "normal")]))
        .await
        .err()
        .expect("collision is fatal");

    match err {
        StartupError::Registry(RegistryError::NameCollision { incoming, owner, .. }) => {
            assert_eq!(owner, "first");
            assert_eq!(incoming, "second");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn shutdown_closes_every_started_provider() {
    let report = build_registry(&config(vec![mock("search", "normal")]))
        .await
        .expect("startup");
    let providers = report.registry.providers().to_vec();
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].state(), ConnectionState::Ready);

    report.registry.shutdown().await;

    assert!(providers.iter().all(|p| p.state() == ConnectionState::Closed));
}
