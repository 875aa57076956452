//! Integration tests for configuration management
//!
//! These tests verify that a Config can be loaded from a TOML file, that
//! environment overrides win over the file, and that invalid values are
//! rejected.

use mathcrew_engine::config::Config;
use mathcrew_engine::orchestrator::PipelineKind;
use sdk::errors::{EngineError, ErrorExt};
use std::collections::HashMap;
use tempfile::TempDir;

fn write_config(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn test_config_toml_parsing() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[core]
log_level = "debug"

[llm]
base_url = "http://localhost:8080/v1"
model = "gpt-4o"
temperature = 0.4

[pipeline]
default = "tool-driven"
max_controller_rounds = 6
"#,
    );

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.llm.base_url, "http://localhost:8080/v1");
    assert_eq!(config.llm.model, "gpt-4o");
    assert_eq!(config.llm.temperature, 0.4);
    assert_eq!(config.pipeline.default, PipelineKind::ToolDriven);
    assert_eq!(config.pipeline.max_controller_rounds, 6);
    // Unset values fall back to defaults
    assert_eq!(config.pipeline.max_tool_iterations, 8);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[llm]\nmodel = \"gpt-4.1-mini\"\n");

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.core.log_level, "info");
    assert_eq!(config.llm.model, "gpt-4.1-mini");
    assert_eq!(config.llm.temperature, 0.2);
    assert_eq!(config.pipeline.default, PipelineKind::Sequential);
}

#[test]
fn test_environment_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[llm]\nmodel = \"from-file\"\ntemperature = 0.1\n");

    let mut config = Config::from_file(&path).unwrap();
    config
        .apply_env(env(&[
            ("OPENAI_MODEL", "from-env"),
            ("OPENAI_TEMPERATURE", "0.7"),
            ("OPENAI_API_KEY", "sk-env"),
            ("OPENAI_BASE_URL", "http://proxy.local/v1"),
        ]))
        .unwrap();

    assert_eq!(config.llm.model, "from-env");
    assert_eq!(config.llm.temperature, 0.7);
    assert_eq!(config.llm.base_url, "http://proxy.local/v1");
    assert_eq!(config.api_key().unwrap().unsecure(), "sk-env");
    assert_eq!(config.llm.creative_temperature(), 0.7);
}

#[test]
fn test_api_key_in_file_is_ignored() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[llm]\napi_key = \"sk-file\"\n");

    let config = Config::from_file(&path).unwrap();
    let err = config.api_key().unwrap_err();
    assert!(matches!(err, EngineError::Configuration(_)));
    assert!(!err.is_recoverable());
    assert!(err.to_string().contains("OPENAI_API_KEY"));
}

#[test]
fn test_invalid_files_are_rejected() {
    let dir = TempDir::new().unwrap();

    let path = write_config(&dir, "[llm\nmodel = ");
    assert!(matches!(
        Config::from_file(&path),
        Err(EngineError::Configuration(_))
    ));

    let path = write_config(&dir, "[pipeline]\ndefault = \"parallel\"\n");
    assert!(Config::from_file(&path).is_err());

    let path = write_config(&dir, "[llm]\ntemperature = 2.5\n");
    assert!(Config::from_file(&path).unwrap().validate().is_err());

    assert!(Config::from_file(&dir.path().join("missing.toml")).is_err());
}
