//! Identity Toolkit REST gateway.
//!
//! Wraps the identity provider's account endpoints behind a two-outcome
//! result surface: every operation resolves to the success payload or an
//! [`AuthError`] carrying a human-readable message. Provider failures never
//! cross this boundary in any other form.

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info_span, Instrument};

use crate::error::{AuthError, AuthResult};
use crate::metrics::record_request;
use crate::token_cache::TokenCache;
use crate::types::{
    AnonymousSignUp, AuthUser, EmailCredentials, IdpSignIn, OobCodeRequest, OobCodeResponse,
    TokenResponse,
};

/// Default lifetime applied when the provider omits `expires_in`.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

// =============================================================================
// Configuration
// =============================================================================

/// Credential gateway configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Web API key of the project
    pub api_key: String,
    /// Identity Toolkit base URL
    pub identity_url: String,
    /// Secure-token (refresh) base URL
    pub secure_token_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl AuthConfig {
    /// Create config from environment variables.
    pub fn from_env() -> AuthResult<Self> {
        let api_key = std::env::var("FIREBASE_API_KEY").map_err(|_| {
            AuthError::ConfigError(
                "FIREBASE_API_KEY must be set to reach the identity provider".to_string(),
            )
        })?;

        if api_key.is_empty() {
            return Err(AuthError::ConfigError(
                "FIREBASE_API_KEY cannot be empty".to_string(),
            ));
        }

        let connect_timeout_secs: u64 = std::env::var("AUTH_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            api_key,
            identity_url: std::env::var("IDENTITY_TOOLKIT_URL")
                .unwrap_or_else(|_| "https://identitytoolkit.googleapis.com".to_string()),
            secure_token_url: std::env::var("SECURE_TOKEN_URL")
                .unwrap_or_else(|_| "https://securetoken.googleapis.com".to_string()),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        })
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Credential gateway holding the current session.
///
/// Share between tasks via `Arc`; the session state is interior.
pub struct AuthGateway {
    http: Client,
    config: AuthConfig,
    session: RwLock<Option<AuthUser>>,
    tokens: TokenCache,
}

impl AuthGateway {
    /// Create a new gateway.
    pub fn new(config: AuthConfig) -> AuthResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("crag-auth/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AuthError::Network)?;

        let tokens = TokenCache::new(
            http.clone(),
            config.api_key.clone(),
            config.secure_token_url.clone(),
        );

        Ok(Self {
            http,
            config,
            session: RwLock::new(None),
            tokens,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> AuthResult<Self> {
        Self::new(AuthConfig::from_env()?)
    }

    /// Token cache of the current session.
    pub fn tokens(&self) -> &TokenCache {
        &self.tokens
    }

    // =========================================================================
    // Identity operations
    // =========================================================================

    /// Sign in without credentials.
    pub async fn sign_in_anonymously(&self) -> AuthResult<AuthUser> {
        let body = AnonymousSignUp {
            return_secure_token: true,
        };
        let resp: TokenResponse = self.post_account("signUp", &body).await?;
        Ok(self.install_session(resp, true))
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let body = EmailCredentials {
            email: email.to_string(),
            password: password.to_string(),
            return_secure_token: true,
        };
        let resp: TokenResponse = self.post_account("signInWithPassword", &body).await?;
        Ok(self.install_session(resp, false))
    }

    /// Register a new account with email and password.
    pub async fn sign_up_with_email(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let body = EmailCredentials {
            email: email.to_string(),
            password: password.to_string(),
            return_secure_token: true,
        };
        let resp: TokenResponse = self.post_account("signUp", &body).await?;
        Ok(self.install_session(resp, false))
    }

    /// Exchange a Google ID token for a session.
    pub async fn sign_in_with_google(&self, google_id_token: &str) -> AuthResult<AuthUser> {
        let body = IdpSignIn {
            post_body: format!(
                "id_token={}&providerId=google.com",
                urlencoding::encode(google_id_token)
            ),
            request_uri: "http://localhost".to_string(),
            return_secure_token: true,
            return_idp_credential: true,
        };
        let resp: TokenResponse = self.post_account("signInWithIdp", &body).await?;
        Ok(self.install_session(resp, false))
    }

    /// Send a password-reset email.
    pub async fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        let body = OobCodeRequest {
            request_type: "PASSWORD_RESET".to_string(),
            email: email.to_string(),
        };
        let _: OobCodeResponse = self.post_account("sendOobCode", &body).await?;
        Ok(())
    }

    /// Drop the current session. Synchronous, infallible, idempotent.
    pub fn sign_out(&self) {
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        if session.take().is_some() {
            debug!("Signed out");
        }
        drop(session);
        self.tokens.clear();
    }

    /// Current principal, `None` when unauthenticated.
    pub fn current_user(&self) -> Option<AuthUser> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn install_session(&self, resp: TokenResponse, is_anonymous: bool) -> AuthUser {
        let user = AuthUser {
            uid: resp.local_id,
            email: resp.email,
            display_name: resp.display_name,
            photo_url: resp.photo_url,
            is_anonymous,
        };

        {
            let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
            *session = Some(user.clone());
        }

        if let Some(refresh_token) = resp.refresh_token {
            let ttl = resp
                .expires_in
                .as_deref()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TOKEN_TTL);
            self.tokens.install(resp.id_token, refresh_token, ttl);
        }

        user
    }

    /// POST an account operation, mapping any provider failure into the
    /// failure variant. One attempt, no retry.
    async fn post_account<B, R>(&self, operation: &'static str, body: &B) -> AuthResult<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}/v1/accounts:{}", self.config.identity_url, operation);
        let span = info_span!("identity_request", operation = %operation);

        let start = Instant::now();
        let result = async {
            let response = self
                .http
                .post(&url)
                .query(&[("key", self.config.api_key.as_str())])
                .json(body)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                response
                    .json::<R>()
                    .await
                    .map_err(|e| AuthError::InvalidResponse(e.to_string()))
            } else {
                let body = response.text().await.unwrap_or_default();
                Err(AuthError::from_provider_body(&body))
            }
        }
        .instrument(span)
        .await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let outcome = if result.is_ok() { "success" } else { "failure" };
        record_request(operation, outcome, latency_ms);

        result
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn test_config() -> AuthConfig {
        AuthConfig {
            api_key: "test-key".to_string(),
            identity_url: "http://localhost:0".to_string(),
            secure_token_url: "http://localhost:0".to_string(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        }
    }

    #[test]
    #[serial]
    fn config_requires_api_key() {
        std::env::remove_var("FIREBASE_API_KEY");
        assert!(AuthConfig::from_env().is_err());

        std::env::set_var("FIREBASE_API_KEY", "");
        assert!(AuthConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn config_defaults_to_production_endpoints() {
        std::env::set_var("FIREBASE_API_KEY", "k");
        std::env::remove_var("IDENTITY_TOOLKIT_URL");
        std::env::remove_var("SECURE_TOKEN_URL");
        std::env::remove_var("AUTH_CONNECT_TIMEOUT_SECS");
        let config = AuthConfig::from_env().unwrap();
        assert!(config.identity_url.contains("identitytoolkit"));
        assert!(config.secure_token_url.contains("securetoken"));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn sign_out_is_idempotent() {
        let gateway = AuthGateway::new(test_config()).unwrap();
        assert!(gateway.current_user().is_none());
        gateway.sign_out();
        assert!(gateway.current_user().is_none());
        gateway.sign_out();
        assert!(gateway.current_user().is_none());
    }

    #[test]
    fn install_session_exposes_the_principal() {
        let gateway = AuthGateway::new(test_config()).unwrap();
        let resp = TokenResponse {
            local_id: "u1".to_string(),
            email: Some("a@b.com".to_string()),
            display_name: None,
            photo_url: None,
            id_token: "tok".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_in: Some("3600".to_string()),
        };
        let user = gateway.install_session(resp, false);
        assert_eq!(user.email.as_deref(), Some("a@b.com"));
        assert_eq!(gateway.current_user().unwrap().uid, "u1");

        gateway.sign_out();
        assert!(gateway.current_user().is_none());
    }
}
