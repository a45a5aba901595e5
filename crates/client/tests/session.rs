//! Session manager behavior against a mock token endpoint.

#![allow(clippy::unwrap_used)]

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use reqwest::StatusCode;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use palmetto_client::{ClientConfig, SessionError, SessionManager, SessionProvider, SessionTokens};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        api_base_url: server.uri().parse().unwrap(),
        token_url: format!("{}/oauth/token", server.uri()),
        client_id: "storefront-web".to_string(),
        client_secret: SecretString::from("s3cret"),
    }
}

fn jwt_with_exp(exp_secs: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"customer-1","exp":{exp_secs}}}"#));
    format!("{header}.{payload}.signature")
}

fn expired_tokens() -> SessionTokens {
    SessionTokens {
        access_token: "stale".to_string(),
        refresh_token: "rt-1".to_string(),
        expires_at_ms: Utc::now().timestamp_millis() - 1_000,
    }
}

#[tokio::test]
async fn unexpired_token_is_reused_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let manager = SessionManager::new(&config_for(&server));
    manager.sign_in(SessionTokens {
        access_token: "live".to_string(),
        refresh_token: "rt-1".to_string(),
        expires_at_ms: Utc::now().timestamp_millis() + 60_000,
    });

    let session = manager.current_session().await.unwrap().unwrap();
    assert_eq!(session.access_token, "live");
}

#[tokio::test]
async fn expired_token_triggers_refresh_exchange() {
    let server = MockServer::start().await;
    let exp_secs = Utc::now().timestamp() + 3_600;
    let fresh_jwt = jwt_with_exp(exp_secs);

    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-1"))
        .and(body_string_contains("client_id=storefront-web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": fresh_jwt,
            "refresh_token": "rt-2",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = SessionManager::new(&config_for(&server));
    manager.sign_in(expired_tokens());

    let session = manager.current_session().await.unwrap().unwrap();
    assert_eq!(session.access_token, fresh_jwt);
    assert_eq!(session.refresh_token, "rt-2");
    // Expiry comes from the new token's exp claim, in epoch-ms.
    assert_eq!(session.expires_at_ms, exp_secs * 1000);
    assert!(!manager.has_error());

    // The refreshed token is now current; a second lookup stays local
    // (the mock's expect(1) verifies no extra exchange happened).
    let again = manager.current_session().await.unwrap().unwrap();
    assert_eq!(again.access_token, fresh_jwt);
}

#[tokio::test]
async fn opaque_token_falls_back_to_expires_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "opaque-token",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = SessionManager::new(&config_for(&server));
    manager.sign_in(expired_tokens());

    let before_ms = Utc::now().timestamp_millis();
    let session = manager.current_session().await.unwrap().unwrap();

    assert_eq!(session.access_token, "opaque-token");
    // No refresh_token in the response: the previous one is kept.
    assert_eq!(session.refresh_token, "rt-1");
    assert!(session.expires_at_ms >= before_ms + 3_600_000);
}

#[tokio::test]
async fn refresh_failure_sets_error_flag() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let manager = SessionManager::new(&config_for(&server));
    manager.sign_in(expired_tokens());

    let err = manager.current_session().await.unwrap_err();
    match err {
        SessionError::Refresh { status, .. } => assert_eq!(status, StatusCode::BAD_REQUEST),
        other => panic!("unexpected error: {other}"),
    }
    // The error flag is what upstream UI observes to force sign-out.
    assert!(manager.has_error());

    manager.sign_out();
    assert!(!manager.has_error());
    assert!(manager.current_session().await.unwrap().is_none());
}

#[tokio::test]
async fn signed_out_manager_returns_no_session() {
    let server = MockServer::start().await;
    let manager = SessionManager::new(&config_for(&server));

    assert!(manager.current_session().await.unwrap().is_none());
    assert!(!manager.has_error());
}
