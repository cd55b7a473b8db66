//! Identity Toolkit request/response types.

use serde::{Deserialize, Serialize};

/// Authenticated principal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Identity-provider subject
    pub uid: String,
    /// Email, absent for anonymous accounts
    pub email: Option<String>,
    /// Display name, if the provider has one
    pub display_name: Option<String>,
    /// Profile photo URL
    pub photo_url: Option<String>,
    /// Whether this session was created anonymously
    pub is_anonymous: bool,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EmailCredentials {
    pub email: String,
    pub password: String,
    pub return_secure_token: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AnonymousSignUp {
    pub return_secure_token: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IdpSignIn {
    pub post_body: String,
    pub request_uri: String,
    pub return_secure_token: bool,
    pub return_idp_credential: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OobCodeRequest {
    pub request_type: String,
    pub email: String,
}

/// Response shared by signUp / signInWithPassword / signInWithIdp.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenResponse {
    pub local_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub id_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds, sent as a decimal string
    #[serde(default)]
    pub expires_in: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OobCodeResponse {
    #[serde(default)]
    pub email: Option<String>,
}

/// Response from the secure-token refresh endpoint (snake_case wire form).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SecureTokenResponse {
    pub id_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<String>,
}
