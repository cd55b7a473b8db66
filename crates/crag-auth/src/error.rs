//! Auth error types.

use serde::Deserialize;
use thiserror::Error;

/// Result type for identity operations.
///
/// Every gateway operation resolves to exactly one of two outcomes: the
/// success payload, or an [`AuthError`] whose display form is always a
/// non-empty human-readable message.
pub type AuthResult<T> = Result<T, AuthError>;

/// Fallback message when the provider reports a failure without one.
pub const FALLBACK_MESSAGE: &str = "Authentication failed";

/// Errors that can occur during identity operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Failure reported by the identity provider, message verbatim.
    #[error("{0}")]
    Provider(String),

    #[error("Failed to configure identity gateway: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error: Option<ProviderErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

impl AuthError {
    /// Build a `Provider` error from an identity-provider error response
    /// body (`{"error": {"message": ...}}`), falling back to
    /// [`FALLBACK_MESSAGE`] when no message is present.
    pub(crate) fn from_provider_body(body: &str) -> Self {
        let message = serde_json::from_str::<ProviderErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .and_then(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        AuthError::Provider(message)
    }
}
