//! Provider factory: builds the configured provider and enforces the
//! credential precondition before any network use.

use std::sync::Arc;
use std::time::Duration;
use culturedrone_config::{AppConfig, ConfigError};
use culturedrone_core::provider::Provider;
use crate::openai_compat::OpenAiCompatProvider;

/// Providers that run locally and accept any credential.
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "vllm", "llamacpp"];

/// Build the provider described by `config`.
///
/// Fails with [`ConfigError::MissingCredential`] when the provider needs a
/// key and none is configured.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ConfigError> {
    let name = config.provider.as_str();

    let api_key = match config.credential() {
        Some(key) => key.to_string(),
        None if KEYLESS_PROVIDERS.contains(&name) => "local".to_string(),
        None => {
            return Err(ConfigError::MissingCredential {
                provider: name.to_string(),
            });
        }
    };

    let base_url = match (&config.api_url, default_base_url(name)) {
        (Some(url), _) => url.clone(),
        (None, Some(url)) => url.to_string(),
        (None, None) => {
            return Err(ConfigError::ValidationError(format!(
                "provider '{name}' has no known endpoint; set api_url"
            )));
        }
    };

    let provider = OpenAiCompatProvider::with_timeout(
        name,
        base_url,
        api_key,
        Duration::from_secs(config.request_timeout_secs),
    )
    .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    tracing::debug!(provider = %name, base_url = %provider.base_url(), "Provider configured");
    Ok(Arc::new(provider))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "xai" => Some("https://api.x.ai/v1"),
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        "groq" => Some("https://api.groq.com/openai/v1"),
        "vllm" => Some("http://localhost:8000/v1"),
        "llamacpp" => Some("http://localhost:8080/v1"),
        _ => None,
    }
}
