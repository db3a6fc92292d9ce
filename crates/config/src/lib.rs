//! Configuration loading, validation, and management for culturedrone.
//!
//! Loads configuration from `~/.culturedrone/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.culturedrone/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bearer credential for the oracle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider name: "xai", "openai", "openrouter", "ollama" or "custom"
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Override the provider's base URL (required for "custom")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature; high by default for varied phrasing
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus-sampling cutoff
    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Max tokens per oracle reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// The simulated drone
    #[serde(default)]
    pub drone: DroneConfig,

    /// Repair budgets for malformed and repetitive replies
    #[serde(default)]
    pub retry: RetryConfig,

    /// Append-only diagnostic log
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

fn default_provider() -> String {
    "xai".into()
}
fn default_model() -> String {
    "grok-2-latest".into()
}
fn default_temperature() -> f32 {
    1.2
}
fn default_top_p() -> f32 {
    0.9
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_request_timeout_secs() -> u64 {
    120
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_p", &self.top_p)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("drone", &self.drone)
            .field("retry", &self.retry)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneConfig {
    #[serde(default = "default_drone_name")]
    pub name: String,

    #[serde(default = "default_personality")]
    pub personality: String,

    #[serde(default)]
    pub x: f64,

    #[serde(default)]
    pub y: f64,

    #[serde(default = "default_user_coordinate")]
    pub user_x: f64,

    #[serde(default = "default_user_coordinate")]
    pub user_y: f64,

    /// Input handled once at startup so the drone greets the user.
    /// Empty disables the greeting.
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_drone_name() -> String {
    "Mavvik".into()
}
fn default_personality() -> String {
    "sarcastic".into()
}
fn default_user_coordinate() -> f64 {
    5.0
}
fn default_greeting() -> String {
    "Say hello to the user.".into()
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            name: default_drone_name(),
            personality: default_personality(),
            x: 0.0,
            y: 0.0,
            user_x: default_user_coordinate(),
            user_y: default_user_coordinate(),
            greeting: default_greeting(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Replies more similar than this to the previous turn are retried
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Corrective round-trips per input for non-JSON replies (0 or 1)
    #[serde(default = "default_max_malformed_retries")]
    pub max_malformed_retries: u32,

    /// Session-wide budget of repetition retries before duplicates are accepted
    #[serde(default = "default_max_repetition_retries")]
    pub max_repetition_retries: u32,
}

fn default_similarity_threshold() -> f64 {
    0.8
}
fn default_max_malformed_retries() -> u32 {
    1
}
fn default_max_repetition_retries() -> u32 {
    2
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_malformed_retries: default_max_malformed_retries(),
            max_repetition_retries: default_max_repetition_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSONL file; defaults to `~/.culturedrone/drone_api.jsonl`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

impl DiagnosticsConfig {
    /// The file diagnostics are appended to.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| AppConfig::config_dir().join("drone_api.jsonl"))
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.culturedrone/config.toml).
    ///
    /// Also checks environment variables for the credential:
    /// - `CULTUREDRONE_API_KEY` (highest priority)
    /// - `XAI_API_KEY`
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if self.api_key.is_none() {
            self.api_key = std::env::var("CULTUREDRONE_API_KEY")
                .ok()
                .or_else(|| std::env::var("XAI_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok())
                .filter(|key| !key.trim().is_empty());
        }

        if let Ok(provider) = std::env::var("CULTUREDRONE_PROVIDER") {
            self.provider = provider;
        }

        if let Ok(model) = std::env::var("CULTUREDRONE_MODEL") {
            self.model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".culturedrone")
    }

    /// Get the configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.top_p <= 0.0 || self.top_p > 1.0 {
            return Err(ConfigError::ValidationError(
                "top_p must be in (0.0, 1.0]".into(),
            ));
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError("max_tokens must be > 0".into()));
        }

        if !(0.0..=1.0).contains(&self.retry.similarity_threshold) {
            return Err(ConfigError::ValidationError(
                "retry.similarity_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if self.retry.max_malformed_retries > 1 {
            return Err(ConfigError::ValidationError(
                "retry.max_malformed_retries must be 0 or 1".into(),
            ));
        }

        Ok(())
    }

    /// The credential, if one is configured and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.credential().is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// Write the default config to `path` unless a file already exists there.
    /// Returns `true` if a file was written.
    pub fn write_default(path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: parent.to_path_buf(),
                reason: e.to_string(),
            })?;
        }
        std::fs::write(path, Self::default_toml()).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(true)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            api_url: None,
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            drone: DroneConfig::default(),
            retry: RetryConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("No API key configured for provider '{provider}'")]
    MissingCredential { provider: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.provider, "xai");
        assert_eq!(config.model, "grok-2-latest");
        assert!((config.temperature - 1.2).abs() < f32::EPSILON);
        assert!((config.top_p - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.max_tokens, 4096);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_drone_matches_startup_scene() {
        let drone = DroneConfig::default();
        assert_eq!(drone.name, "Mavvik");
        assert_eq!(drone.personality, "sarcastic");
        assert_eq!((drone.x, drone.y), (0.0, 0.0));
        assert_eq!((drone.user_x, drone.user_y), (5.0, 5.0));
        assert_eq!(drone.greeting, "Say hello to the user.");
    }

    #[test]
    fn default_retry_budgets() {
        let retry = RetryConfig::default();
        assert!((retry.similarity_threshold - 0.8).abs() < f64::EPSILON);
        assert_eq!(retry.max_malformed_retries, 1);
        assert_eq!(retry.max_repetition_retries, 2);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider, config.provider);
        assert_eq!(parsed.drone.name, config.drone.name);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
model = "grok-beta"

[drone]
name = "Falling Outside The Normal Moral Constraints"
"#,
        )
        .unwrap();
        assert_eq!(config.model, "grok-beta");
        assert_eq!(config.drone.name, "Falling Outside The Normal Moral Constraints");
        assert_eq!(config.drone.personality, "sarcastic");
        assert_eq!(config.retry.max_repetition_retries, 2);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_top_p_rejected() {
        let config = AppConfig {
            top_p: 0.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_budget_above_one_rejected() {
        let mut config = AppConfig::default();
        config.retry.max_malformed_retries = 3;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn blank_credential_is_not_a_credential() {
        let config = AppConfig {
            api_key: Some("   ".into()),
            ..AppConfig::default()
        };
        assert!(!config.has_api_key());
        assert!(config.credential().is_none());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            api_key: Some("xai-secret".into()),
            ..AppConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("xai-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().provider, "xai");
    }

    #[test]
    fn unparseable_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "temperature = \"hot\"").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn write_default_creates_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        assert!(AppConfig::write_default(&path).unwrap());
        assert!(!AppConfig::write_default(&path).unwrap());

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.drone.name, "Mavvik");
    }

    #[test]
    fn diagnostics_path_override() {
        let diagnostics = DiagnosticsConfig {
            enabled: true,
            path: Some("/var/log/drone.jsonl".into()),
        };
        assert_eq!(diagnostics.resolved_path(), PathBuf::from("/var/log/drone.jsonl"));
        assert!(DiagnosticsConfig::default().resolved_path().ends_with("drone_api.jsonl"));
    }
}
