//! Integration tests for alert search and triage using wiremock.

use futures::TryStreamExt;
use incydr::alerts::{self, Alert, AlertState};
use incydr::auth::TokenProvider;
use incydr::client::IncydrClient;
use incydr::error::IncydrError;
use incydr::queries::{AlertQuery, FilterBuilder};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper: creates a mock IncydrClient pointed at the given wiremock server.
fn mock_client(server: &MockServer) -> IncydrClient {
    IncydrClient::with_base_url(TokenProvider::with_token("mock-token"), &server.uri())
}

async fn mount_tenant(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/customer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tenantId": "tenant-1",
            "name": "Example Corp"
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn alert(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "tenantId": "tenant-1",
        "type": "FED_ENDPOINT_EXFILTRATION",
        "name": "Exfiltration to USB",
        "actor": "a@example.com",
        "severity": "HIGH",
        "createdAt": "2023-04-01T08:00:00.000Z",
        "state": "OPEN"
    })
}

// ── Search ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_fills_tenant_and_pages_from_zero() {
    let server = MockServer::start().await;
    mount_tenant(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/alerts/query-alerts"))
        .and(body_partial_json(json!({"tenantId": "tenant-1", "pgNum": 0, "pgSize": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "alerts": [alert("a-1"), alert("a-2")],
            "totalCount": 3
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/alerts/query-alerts"))
        .and(body_partial_json(json!({"tenantId": "tenant-1", "pgNum": 1, "pgSize": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "alerts": [alert("a-3")],
            "totalCount": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let query = AlertQuery::new()
        .equals("State", "OPEN")
        .unwrap()
        .with_page_size(2)
        .unwrap();
    let found: Vec<Alert> = alerts::iter_all(&client, &query).try_collect().await.unwrap();
    let ids: Vec<&str> = found.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a-1", "a-2", "a-3"]);
    assert_eq!(found[0].state, Some(AlertState::Open));
}

#[tokio::test]
async fn explicit_tenant_skips_customer_lookup() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/customer"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/alerts/query-alerts"))
        .and(body_partial_json(json!({
            "tenantId": "other-tenant",
            "srtDirection": "DESC",
            "srtKey": "CreatedAt"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "alerts": [],
            "totalCount": 0
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let mut query = AlertQuery::new();
    query.tenant_id = Some("other-tenant".to_string());
    let page = alerts::search(&client, &query).await.unwrap();
    assert!(page.alerts.is_empty());
}

// ── Details ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_alert_returns_observations() {
    let server = MockServer::start().await;
    let mut detail = alert("a-1");
    detail["observations"] = json!([{
        "id": "obs-1",
        "type": "FedEndpointExfiltration",
        "observedAt": "2023-04-01T07:59:00.000Z",
        "data": "{\"fileCount\": 4}"
    }]);
    Mock::given(method("POST"))
        .and(path("/v1/alerts/query-details"))
        .and(body_json(json!({"alertIds": ["a-1"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"alerts": [detail]})))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let details = alerts::get_alert(&client, "a-1").await.unwrap();
    assert_eq!(details.alert.name.as_deref(), Some("Exfiltration to USB"));
    let data = details.observations[0].data_json().unwrap().unwrap();
    assert_eq!(data["fileCount"], 4);
}

#[tokio::test]
async fn unknown_alert_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/alerts/query-details"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"alerts": []})))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let err = alerts::get_alert(&client, "missing").await.unwrap_err();
    match err {
        IncydrError::NotFound { kind, name } => {
            assert_eq!(kind, "alert");
            assert_eq!(name, "missing");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

// ── Triage ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn change_state_sends_tenant_ids_and_note() {
    let server = MockServer::start().await;
    mount_tenant(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/alerts/update-state"))
        .and(body_json(json!({
            "tenantId": "tenant-1",
            "alertIds": ["a-1", "a-2"],
            "state": "RESOLVED",
            "note": "benign"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let ids = vec!["a-1".to_string(), "a-2".to_string()];
    alerts::change_state(&client, &ids, AlertState::Resolved, Some("benign"))
        .await
        .unwrap();
}

#[tokio::test]
async fn add_note_reuses_cached_tenant() {
    let server = MockServer::start().await;
    mount_tenant(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/alerts/add-note"))
        .and(body_partial_json(json!({"tenantId": "tenant-1", "alertId": "a-1"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    alerts::add_note(&client, "a-1", "first look").await.unwrap();
    alerts::add_note(&client, "a-1", "escalated").await.unwrap();
}

#[tokio::test]
async fn failed_state_change_surfaces_api_error() {
    let server = MockServer::start().await;
    mount_tenant(&server).await;
    Mock::given(method("POST"))
        .and(path("/v1/alerts/update-state"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let err = alerts::change_state(&client, &["a-1".to_string()], AlertState::Pending, None)
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(403));
}
