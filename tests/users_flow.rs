//! Integration tests for users, role management and bulk activation using
//! wiremock.

use incydr::auth::TokenProvider;
use incydr::client::IncydrClient;
use incydr::error::IncydrError;
use incydr::users;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper: creates a mock IncydrClient pointed at the given wiremock server.
fn mock_client(server: &MockServer) -> IncydrClient {
    IncydrClient::with_base_url(TokenProvider::with_token("mock-token"), &server.uri())
}

async fn mount_tenant_roles(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path("/v1/users/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"roleId": "desktop-user", "roleName": "Desktop User"},
            {"roleId": "security-center-user", "roleName": "Security Center User"},
            {"roleId": "customer-cloud-admin", "roleName": "Customer Cloud Admin"}
        ])))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_user_roles(server: &MockServer, user_id: &str, role_ids: &[&str]) {
    let roles: Vec<_> = role_ids
        .iter()
        .map(|id| json!({"roleId": id, "roleName": id}))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/v1/users/{user_id}/roles")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userId": user_id,
            "roles": roles
        })))
        .mount(server)
        .await;
}

// ── Lookup ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn username_resolves_to_user_id() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .and(query_param("username", "a@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{"userId": "u-1", "username": "a@example.com", "active": true}],
            "totalCount": 1
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    assert_eq!(users::resolve_user_id(&client, "a@example.com").await.unwrap(), "u-1");
    assert_eq!(users::resolve_user_id(&client, "u-9").await.unwrap(), "u-9");
}

#[tokio::test]
async fn unknown_username_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [],
            "totalCount": 0
        })))
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let err = users::get_user_by_username(&client, "ghost@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, IncydrError::NotFound { kind: "user", .. }));
}

// ── Roles ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_roles_accepts_names_and_ids() {
    let server = MockServer::start().await;
    mount_tenant_roles(&server, 1).await;
    Mock::given(method("PUT"))
        .and(path("/v1/users/u-1/roles"))
        .and(body_json(json!({"roleIds": ["desktop-user", "customer-cloud-admin"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    users::update_roles(
        &client,
        "u-1",
        &["desktop user".to_string(), "customer-cloud-admin".to_string()],
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn unknown_role_fails_before_any_change() {
    let server = MockServer::start().await;
    mount_tenant_roles(&server, 1).await;
    Mock::given(method("PUT"))
        .and(path("/v1/users/u-1/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let err = users::update_roles(&client, "u-1", &["Wizard".to_string()])
        .await
        .unwrap_err();
    match err {
        IncydrError::RoleNotFound(name) => assert_eq!(name, "Wizard"),
        other => panic!("expected RoleNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn add_roles_keeps_existing_and_skips_duplicates() {
    let server = MockServer::start().await;
    mount_tenant_roles(&server, 1).await;
    mount_user_roles(&server, "u-1", &["desktop-user"]).await;
    Mock::given(method("PUT"))
        .and(path("/v1/users/u-1/roles"))
        .and(body_json(json!({"roleIds": ["desktop-user", "security-center-user"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    users::add_roles(
        &client,
        "u-1",
        &["Desktop User".to_string(), "Security Center User".to_string()],
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn removing_unassigned_role_is_rejected() {
    let server = MockServer::start().await;
    mount_tenant_roles(&server, 1).await;
    mount_user_roles(&server, "u-1", &["desktop-user"]).await;
    Mock::given(method("PUT"))
        .and(path("/v1/users/u-1/roles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let err = users::remove_roles(&client, "u-1", &["Customer Cloud Admin".to_string()])
        .await
        .unwrap_err();
    match err {
        IncydrError::UserNotAssignedRole { user_id, role } => {
            assert_eq!(user_id, "u-1");
            assert_eq!(role, "Customer Cloud Admin");
        }
        other => panic!("expected UserNotAssignedRole, got {other:?}"),
    }
}

#[tokio::test]
async fn tenant_roles_are_fetched_once_per_client() {
    let server = MockServer::start().await;
    mount_tenant_roles(&server, 1).await;

    let client = mock_client(&server);
    let first = users::resolve_role_ids(&client, &["Desktop User".to_string()])
        .await
        .unwrap();
    let second = users::resolve_role_ids(&client, &["desktop-user".to_string()])
        .await
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(users::list_roles(&client).await.unwrap().len(), 3);
}

// ── Bulk activation ─────────────────────────────────────────────────────

#[tokio::test]
async fn rejected_batch_falls_back_to_single_requests() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/users/deactivate"))
        .and(body_json(json!({"userIds": ["u-1", "bad", "u-3"]})))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid user"))
        .expect(1)
        .mount(&server)
        .await;
    for id in ["u-1", "u-3"] {
        Mock::given(method("POST"))
            .and(path(format!("/v1/users/{id}/deactivate")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/v1/users/bad/deactivate"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such user"))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let ids: Vec<String> = ["u-1", "bad", "u-3"].iter().map(|s| s.to_string()).collect();
    let outcome = users::bulk_deactivate(&client, &ids).await;
    assert!(!outcome.is_success());
    assert_eq!(outcome.succeeded, vec!["u-1", "u-3"]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, "bad");
    assert_eq!(outcome.failures[0].1.status().map(|s| s.as_u16()), Some(404));
}

#[tokio::test]
async fn accepted_batch_needs_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/users/activate"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server);
    let ids = vec!["u-1".to_string(), "u-2".to_string()];
    let outcome = users::bulk_activate(&client, &ids).await;
    assert!(outcome.is_success());
    assert_eq!(outcome.succeeded.len(), 2);
}
