//! Error types for the culturedrone domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Unparseable oracle
//! output has its own type in [`crate::command::MalformedReply`]; this module
//! covers the transport side.

use thiserror::Error;

/// Transport-level failures talking to the oracle.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}
