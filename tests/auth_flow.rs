//! Integration tests for token acquisition and reuse using wiremock.
//!
//! These tests drive `IncydrClient::new` against a mock tenant so the real
//! `/v1/oauth` exchange runs: Basic credentials, the form body and bearer
//! reuse across requests.

use std::time::Duration;

use incydr::auth::TokenProvider;
use incydr::client::IncydrClient;
use incydr::error::IncydrError;
use incydr::settings::IncydrSettings;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// base64("client-id:client-secret")
const BASIC_CREDENTIALS: &str = "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=";

fn settings_for(server: &MockServer) -> IncydrSettings {
    IncydrSettings {
        api_client_id: Some("client-id".to_string()),
        api_client_secret: Some("client-secret".to_string()),
        url: Some(server.uri()),
        ..Default::default()
    }
}

async fn mount_token(server: &MockServer, token: &str, expires_in: u64, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/oauth"))
        .and(header("authorization", BASIC_CREDENTIALS))
        .and(body_string_contains("grant_type=client_credentials"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": token,
            "token_type": "bearer",
            "expires_in": expires_in
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ── Token reuse ─────────────────────────────────────────────────────────

#[tokio::test]
async fn token_is_fetched_once_and_sent_as_bearer() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 900, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/cases/7"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "number": 7,
            "name": "Exfiltration review"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = IncydrClient::new(&settings_for(&server)).unwrap();
    let first = incydr::cases::get_case(&client, 7).await.unwrap();
    let second = incydr::cases::get_case(&client, 7).await.unwrap();
    assert_eq!(first.name, "Exfiltration review");
    assert_eq!(second.number, 7);
}

#[tokio::test]
async fn token_request_goes_to_tenant_url() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-2", 900, 1).await;

    Mock::given(method("GET"))
        .and(path("/v1/customer"))
        .and(header("authorization", "Bearer tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tenantId": "tenant-1",
            "name": "Example Corp"
        })))
        .mount(&server)
        .await;

    // A trailing slash on the configured URL must not double up.
    let mut settings = settings_for(&server);
    settings.url = Some(format!("{}/", server.uri()));
    let client = IncydrClient::new(&settings).unwrap();
    assert_eq!(client.tenant_id().await.unwrap(), "tenant-1");
}

// ── Failures ────────────────────────────────────────────────────────────

#[tokio::test]
async fn rejected_credentials_surface_as_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/oauth"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
        .mount(&server)
        .await;

    let client = IncydrClient::new(&settings_for(&server)).unwrap();
    let err = client.tenant_id().await.unwrap_err();
    match err {
        IncydrError::Auth { message, .. } => {
            assert!(message.contains("401"), "{message}");
            assert!(message.contains("invalid_client"), "{message}");
        }
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_credentials_fail_before_any_request() {
    let settings = IncydrSettings {
        url: Some("https://api.us.code42.com".to_string()),
        ..Default::default()
    };
    let err = IncydrClient::new(&settings).err().unwrap();
    assert!(matches!(err, IncydrError::Config(_)));
    assert!(err.to_string().contains("INCYDR_API_CLIENT_ID"));
}

#[tokio::test]
async fn slow_token_endpoint_hits_the_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/oauth"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "access_token": "late",
                    "token_type": "bearer",
                    "expires_in": 900
                }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut provider = TokenProvider::with_timeout(
        &server.uri(),
        "client-id",
        "client-secret",
        Duration::from_millis(100),
    )
    .unwrap();
    let err = provider.refresh_token().await.unwrap_err();
    match err {
        IncydrError::Auth { source, .. } => {
            let source = source.expect("transport error kept as source");
            let reqwest_err = source.downcast_ref::<reqwest::Error>().unwrap();
            assert!(reqwest_err.is_timeout(), "{reqwest_err}");
        }
        other => panic!("expected Auth error, got {other:?}"),
    }
    assert!(provider.token().is_none());
}

#[tokio::test]
async fn malformed_token_response_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/oauth"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = IncydrClient::new(&settings_for(&server)).unwrap();
    let err = incydr::cases::get_case(&client, 1).await.unwrap_err();
    assert!(matches!(err, IncydrError::Auth { .. }));
    assert!(err.to_string().contains("failed to parse token response"));
}

#[tokio::test]
async fn tenant_id_is_cached_per_client() {
    let server = MockServer::start().await;
    mount_token(&server, "tok", 900, 1).await;
    Mock::given(method("GET"))
        .and(path("/v1/customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "tenantId": "tenant-9"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = IncydrClient::new(&settings_for(&server)).unwrap();
    assert_eq!(client.tenant_id().await.unwrap(), "tenant-9");
    assert_eq!(client.tenant_id().await.unwrap(), "tenant-9");
}
