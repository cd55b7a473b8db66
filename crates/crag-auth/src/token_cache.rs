//! ID-token caching for the current session.
//!
//! Provides a thread-safe token cache with:
//! - Refresh margin to avoid token expiry during requests
//! - Single-flight gate to prevent thundering herd on refresh
//! - Graceful fallback to the existing usable token on refresh failure
//!
//! The cache state lives behind a synchronous lock so sign-out can clear it
//! without suspending; only the refresh itself awaits, serialized by a
//! separate async gate.

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult};
use crate::types::SecureTokenResponse;

// =============================================================================
// Constants
// =============================================================================

/// Refresh margin: refresh the token 60 seconds before expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Token TTL when the provider omits `expires_in` (ID tokens live an hour).
const TOKEN_DEFAULT_TTL: Duration = Duration::from_secs(3600);

// =============================================================================
// Token Cache
// =============================================================================

/// Cached session tokens with expiration tracking.
struct CachedTokens {
    id_token: String,
    refresh_token: String,
    expires_at: Instant,
}

impl CachedTokens {
    /// Token is still valid with refresh margin.
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }

    /// Token is technically still usable (even if refresh is due).
    fn is_usable(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Session token cache with single-flight refresh.
pub struct TokenCache {
    http: Client,
    api_key: String,
    secure_token_url: String,
    state: RwLock<Option<CachedTokens>>,
    refresh_gate: Mutex<()>,
}

impl TokenCache {
    pub(crate) fn new(http: Client, api_key: String, secure_token_url: String) -> Self {
        Self {
            http,
            api_key,
            secure_token_url,
            state: RwLock::new(None),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Install the tokens of a freshly signed-in session.
    pub(crate) fn install(&self, id_token: String, refresh_token: String, ttl: Duration) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = Some(CachedTokens {
            id_token,
            refresh_token,
            expires_at: Instant::now() + ttl,
        });
    }

    /// Drop all tokens (sign-out).
    pub(crate) fn clear(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = None;
    }

    /// Mark the cached ID token stale so the next lookup refreshes it.
    /// The refresh token is kept.
    pub(crate) fn mark_stale(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(tokens) = state.as_mut() {
            tokens.expires_at = Instant::now();
        }
    }

    /// Get a valid ID token for the current session, refreshing if needed.
    ///
    /// Returns `Ok(None)` when no session is installed.
    pub async fn id_token(&self) -> AuthResult<Option<String>> {
        // Fast path: fresh cached token under the read lock
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            match state.as_ref() {
                None => return Ok(None),
                Some(tokens) if tokens.is_fresh() => return Ok(Some(tokens.id_token.clone())),
                Some(_) => {}
            }
        }

        // Slow path: serialize refresh attempts
        let _gate = self.refresh_gate.lock().await;

        // Double-check: another task may have refreshed while we waited
        let refresh_token = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            match state.as_ref() {
                None => return Ok(None),
                Some(tokens) if tokens.is_fresh() => return Ok(Some(tokens.id_token.clone())),
                Some(tokens) => tokens.refresh_token.clone(),
            }
        };

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(resp) => {
                let ttl = resp
                    .expires_in
                    .as_deref()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(TOKEN_DEFAULT_TTL);
                let id_token = resp.id_token.clone();
                self.install(resp.id_token, resp.refresh_token, ttl);
                debug!("Refreshed session ID token");
                Ok(Some(id_token))
            }
            Err(e) => {
                // On refresh failure, fall back to the existing token if it
                // is still usable
                let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
                if let Some(tokens) = state.as_ref() {
                    if tokens.is_usable() {
                        warn!("Token refresh failed, using existing token: {}", e);
                        return Ok(Some(tokens.id_token.clone()));
                    }
                }
                Err(e)
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> AuthResult<SecureTokenResponse> {
        let url = format!("{}/v1/token", self.secure_token_url);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| AuthError::InvalidResponse(e.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(AuthError::from_provider_body(&body))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
