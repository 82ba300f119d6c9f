// Config loading tests - AppConfig::load from files on disk

use orrery_core::config::{AppConfig, ConfigError, ModelPreset};
use orrery_core::tooling::Strictness;
use serial_test::serial;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("orrery.toml");
    fs::write(&path, content).expect("Failed to write config");
    path
}

#[test]
fn returns_error_when_explicit_file_not_found() {
    let result = AppConfig::load(Some(Path::new("/nonexistent/path/orrery.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
}

#[test]
fn loads_model_agent_and_provider_tables() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[model]
preset = "moonshot"
temperature = 0.2
timeout_secs = 30

[agent]
system_prompt = "Answer in one sentence."
max_turns = 4
strictness = "strict"

[tools]
builtin = ["weather"]

[[providers]]
name = "search"
command = "npx"
args = ["-y", "tavily-mcp@0.1.3"]
call_timeout_secs = 15
interleaved = false
"#,
    );

    let config = AppConfig::load(Some(&path)).expect("loads");

    assert_eq!(config.model.preset, ModelPreset::Moonshot);
    assert_eq!(config.model.endpoint, "https://api.moonshot.cn/v1");
    assert_eq!(config.model.api_key_env, "MOONSHOT_API_KEY");
    assert_eq!(config.model.request_timeout, Duration::from_secs(30));
    assert_eq!(config.agent.max_turns, 4);
    assert_eq!(config.agent.strictness, Strictness::Strict);
    assert_eq!(config.tools.builtin, vec!["weather".to_string()]);

    let search = config.provider("search").expect("search provider");
    assert_eq!(search.command, PathBuf::from("npx"));
    assert_eq!(search.args, vec!["-y", "tavily-mcp@0.1.3"]);
    assert_eq!(search.call_timeout, Duration::from_secs(15));
    assert!(!search.interleaved);
    assert!(!search.required);
}

#[test]
#[serial]
fn provider_fields_expand_environment_variables() {
    unsafe { std::env::set_var("ORRERY_TEST_SEARCH_KEY", "tvly-123") };
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[[providers]]
name = "search"
command = "npx"
args = ["--key=${ORRERY_TEST_SEARCH_KEY}"]
env = { TAVILY_API_KEY = "${ORRERY_TEST_SEARCH_KEY}" }
"#,
    );

    let config = AppConfig::load(Some(&path)).expect("loads");
    unsafe { std::env::remove_var("ORRERY_TEST_SEARCH_KEY") };

    let search = config.provider("search").expect("search provider");
    assert_eq!(search.args, vec!["--key=tvly-123"]);
    assert_eq!(
        search.env.get("TAVILY_API_KEY").map(String::as_str),
        Some("tvly-123")
    );
}

#[test]
#[serial]
fn missing_providers_table_selects_presets_rooted_at_filesystem_root() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path().join("sandbox");
    let path = write_config(
        dir.path(),
        &format!("[tools]\nfilesystem_root = \"{}\"\n", root.display()),
    );

    let config = AppConfig::load(Some(&path)).expect("loads");

    let names: Vec<&str> = config.providers.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["tavily", "sequential-thinking", "filesystem"]);
    let filesystem = config.provider("filesystem").expect("filesystem preset");
    assert_eq!(
        filesystem.args.last().map(String::as_str),
        Some(root.to_string_lossy().as_ref())
    );
    let thinking = config.provider("sequential-thinking").expect("thinking preset");
    assert_eq!(
        thinking.env.get("DISABLE_THOUGHT_LOGGING").map(String::as_str),
        Some("true")
    );
}

#[test]
fn duplicate_provider_names_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
[[providers]]
name = "fs"
command = "npx"

[[providers]]
name = "fs"
command = "uvx"
"#,
    );

    let result = AppConfig::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::DuplicateProvider { .. })));
}

#[test]
fn malformed_file_reports_its_path() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), "[agent\nmax_turns = ");

    match AppConfig::load(Some(&path)) {
        Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn shipped_config_declares_every_default_provider() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/orrery.toml");

    let config = AppConfig::load(Some(&path)).expect("shipped config loads");

    let names: Vec<&str> = config.providers.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["tavily", "sequential-thinking", "filesystem"]);
    let filesystem = config.provider("filesystem").expect("filesystem provider");
    assert_eq!(filesystem.args.last().map(String::as_str), Some("."));
    assert_eq!(config.tools.builtin, vec!["weather", "kimi_cli"]);
}
