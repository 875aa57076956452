//! Configuration management
//!
//! Configuration is built exactly once at process start and then shared
//! immutably (by reference or `Arc`) with every component that needs it.
//!
//! # Sources
//!
//! Later sources override earlier ones:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config PATH`, or `~/.mathcrew/config.toml` when present)
//! 3. Environment: `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_TEMPERATURE`,
//!    `OPENAI_BASE_URL`
//!
//! The API key is never read from or written to the TOML file. When the
//! environment does not provide it, the OS keychain is consulted
//! (service `mathcrew`, key `openai_api_key`).
//!
//! # Examples
//!
//! ```no_run
//! use mathcrew_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?;
//! let key = config.api_key()?;
//! println!("Model: {} (key {})", config.llm.model, key);
//! # Ok(())
//! # }
//! ```

use crate::orchestrator::PipelineKind;
use crate::secrets::{SecretManager, SecretString};
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the provider credential
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
const MODEL_ENV: &str = "OPENAI_MODEL";
const TEMPERATURE_ENV: &str = "OPENAI_TEMPERATURE";
const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Keychain key for the provider credential
pub const API_KEY_SECRET: &str = "openai_api_key";

/// Minimum temperature used by the creative-writing capability
pub const CREATIVE_MIN_TEMPERATURE: f64 = 0.6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Inference provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Resolved at load time; never serialized
    #[serde(skip)]
    pub api_key: Option<SecretString>,
}

impl LlmConfig {
    /// Temperature for creative writing: never below 0.6
    pub fn creative_temperature(&self) -> f64 {
        self.temperature.max(CREATIVE_MIN_TEMPERATURE)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Strategy used when the CLI does not choose one
    #[serde(default)]
    pub default: PipelineKind,

    /// Controller decisions allowed before a tool-driven run is abandoned
    #[serde(default = "default_max_controller_rounds")]
    pub max_controller_rounds: usize,

    /// Model calls allowed inside one math invocation
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_controller_rounds() -> usize {
    16
}

fn default_max_tool_iterations() -> usize {
    8
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            api_key: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default: PipelineKind::default(),
            max_controller_rounds: default_max_controller_rounds(),
            max_tool_iterations: default_max_tool_iterations(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            llm: LlmConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    ///
    /// Reads `path` if given, otherwise `~/.mathcrew/config.toml` if it exists,
    /// otherwise starts from defaults. Environment variables are applied on top
    /// and the credential is resolved. A missing credential is *not* an error
    /// here; see [`Config::api_key`].
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Configuration` if the file cannot be read or
    /// parsed, an environment value is malformed, or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, EngineError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(default_path) if default_path.exists() => Self::from_file(&default_path)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|name| std::env::var(name).ok())?;
        if config.llm.api_key.is_none() {
            config.llm.api_key = SecretManager::default().lookup(API_KEY_SECRET)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without consulting the environment
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            EngineError::Configuration(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, EngineError> {
        toml::from_str(contents)
            .map_err(|e| EngineError::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), EngineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).map(SecretString::new) {
            if !key.is_blank() {
                self.llm.api_key = Some(key);
            }
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
            self.llm.model = model;
        }
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.llm.base_url = base_url;
        }
        if let Some(raw) = lookup(TEMPERATURE_ENV) {
            self.llm.temperature = raw.trim().parse().map_err(|_| {
                EngineError::Configuration(format!(
                    "{} must be numeric, got '{}'.",
                    TEMPERATURE_ENV, raw
                ))
            })?;
        }
        Ok(())
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Configuration(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(EngineError::Configuration(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(EngineError::Configuration("model must not be empty".to_string()));
        }

        if self.pipeline.max_controller_rounds == 0 || self.pipeline.max_tool_iterations == 0 {
            return Err(EngineError::Configuration(
                "max_controller_rounds and max_tool_iterations must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// The provider credential, required before any pipeline is built
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Configuration` when no credential was found.
    pub fn api_key(&self) -> Result<&SecretString, EngineError> {
        self.llm.api_key.as_ref().ok_or_else(|| {
            EngineError::Configuration(format!(
                "{} not found in the environment or keychain. Set it before running.",
                API_KEY_ENV
            ))
        })
    }

    fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".mathcrew").join("config.toml"))
    }
}
