//! Identity Toolkit REST client.
//!
//! This crate provides:
//! - The credential gateway (anonymous, email/password, and Google sign-in,
//!   registration, password-reset email, sign-out)
//! - Session state with synchronous current-principal lookup
//! - ID-token caching with margin-based refresh through the secure-token
//!   endpoint
//! - The [`TokenSource`] seam consumed by the data-plane clients

pub mod error;
pub mod gateway;
pub mod metrics;
pub mod source;
pub mod token_cache;
pub mod types;

pub use error::{AuthError, AuthResult, FALLBACK_MESSAGE};
pub use gateway::{AuthConfig, AuthGateway};
pub use source::{TokenSource, Unauthenticated};
pub use token_cache::TokenCache;
pub use types::AuthUser;
