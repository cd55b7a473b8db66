//! Token source seam consumed by the backend data clients.

use async_trait::async_trait;

use crate::error::AuthResult;
use crate::gateway::AuthGateway;

/// Supplies the current session's ID token to backend clients.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Current ID token, refreshed when stale. `None` when unauthenticated.
    async fn id_token(&self) -> AuthResult<Option<String>>;

    /// Mark the cached token stale so the next lookup refreshes it. Called
    /// by clients when the backend rejects a token as expired.
    async fn invalidate(&self);
}

#[async_trait]
impl TokenSource for AuthGateway {
    async fn id_token(&self) -> AuthResult<Option<String>> {
        self.tokens().id_token().await
    }

    async fn invalidate(&self) {
        self.tokens().mark_stale();
    }
}

/// Token source for unauthenticated access to world-readable data.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unauthenticated;

#[async_trait]
impl TokenSource for Unauthenticated {
    async fn id_token(&self) -> AuthResult<Option<String>> {
        Ok(None)
    }

    async fn invalidate(&self) {}
}
