//! Gateway tests against a simulated identity provider.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crag_auth::{AuthConfig, AuthGateway, TokenSource, FALLBACK_MESSAGE};

fn gateway_for(server: &MockServer) -> AuthGateway {
    AuthGateway::new(AuthConfig {
        api_key: "test-key".to_string(),
        identity_url: server.uri(),
        secure_token_url: server.uri(),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
    })
    .expect("gateway")
}

#[tokio::test]
async fn registering_yields_principal_with_that_email() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "user-1",
            "email": "a@b.com",
            "idToken": "id-token-1",
            "refreshToken": "refresh-1",
            "expiresIn": "3600"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let user = gateway
        .sign_up_with_email("a@b.com", "password1")
        .await
        .expect("sign up should succeed");

    assert_eq!(user.email.as_deref(), Some("a@b.com"));
    assert!(!user.is_anonymous);
    assert_eq!(gateway.current_user().unwrap().uid, "user-1");
}

#[tokio::test]
async fn anonymous_sign_in_marks_the_principal_anonymous() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "anon-1",
            "idToken": "id-token-1",
            "refreshToken": "refresh-1",
            "expiresIn": "3600"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let user = gateway.sign_in_anonymously().await.expect("anonymous sign in");
    assert!(user.is_anonymous);
    assert!(user.email.is_none());
}

#[tokio::test]
async fn provider_rejection_becomes_the_failure_variant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "INVALID_PASSWORD"}
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .sign_in_with_email("a@b.com", "wrong")
        .await
        .expect_err("sign in should fail");

    assert_eq!(err.to_string(), "INVALID_PASSWORD");
    assert!(gateway.current_user().is_none());
}

#[tokio::test]
async fn failure_without_provider_message_uses_the_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .sign_in_with_email("a@b.com", "pw")
        .await
        .expect_err("sign in should fail");

    assert_eq!(err.to_string(), FALLBACK_MESSAGE);
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn password_reset_for_unknown_address_fails_with_provider_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:sendOobCode"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "EMAIL_NOT_FOUND"}
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .send_password_reset("nobody@example.com")
        .await
        .expect_err("reset should fail");
    assert_eq!(err.to_string(), "EMAIL_NOT_FOUND");
}

#[tokio::test]
async fn password_reset_for_known_address_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:sendOobCode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "a@b.com"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    gateway
        .send_password_reset("a@b.com")
        .await
        .expect("reset should succeed");
}

#[tokio::test]
async fn google_credential_exchange_installs_a_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithIdp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "google-1",
            "email": "g@b.com",
            "displayName": "G Climber",
            "photoUrl": "https://example.com/p.jpg",
            "idToken": "id-token-1",
            "refreshToken": "refresh-1",
            "expiresIn": "3600"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let user = gateway
        .sign_in_with_google("a-google-id-token")
        .await
        .expect("idp sign in");
    assert_eq!(user.display_name.as_deref(), Some("G Climber"));
    assert_eq!(gateway.current_user().unwrap().uid, "google-1");
}

#[tokio::test]
async fn sign_out_twice_leaves_no_principal_and_no_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "user-1",
            "email": "a@b.com",
            "idToken": "id-token-1",
            "refreshToken": "refresh-1",
            "expiresIn": "3600"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    gateway
        .sign_up_with_email("a@b.com", "password1")
        .await
        .expect("sign up");
    assert!(gateway.current_user().is_some());

    gateway.sign_out();
    assert!(gateway.current_user().is_none());
    gateway.sign_out();
    assert!(gateway.current_user().is_none());

    assert_eq!(gateway.id_token().await.unwrap(), None);
}

#[tokio::test]
async fn stale_token_is_refreshed_through_the_secure_token_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "user-1",
            "idToken": "stale-token",
            "refreshToken": "refresh-1",
            "expiresIn": "0"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/token"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id_token": "fresh-token",
            "refresh_token": "refresh-2",
            "expires_in": "3600"
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    gateway.sign_in_anonymously().await.expect("sign in");

    let token = gateway.id_token().await.expect("token lookup");
    assert_eq!(token.as_deref(), Some("fresh-token"));
}
