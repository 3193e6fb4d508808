//! User lookup, roles and lifecycle.
//!
//! Roles can be given by id or by display name. Names are resolved through
//! the tenant's role list, fetched once per client and cached in
//! `IncydrClient::role_cache`.

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bulk::{run_batched, BulkOutcome};
use crate::client::IncydrClient;
use crate::devices::{Device, DevicesPage};
use crate::error::{IncydrError, Result};
use crate::pagination::paginate_by_number;

/// Server-side maximum page size.
pub const MAX_USER_PAGE_SIZE: usize = 500;

/// Users sent per bulk activate/deactivate request.
pub const USER_BATCH_SIZE: usize = 100;

// ── Response types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub legacy_user_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub org_guid: Option<String>,
    #[serde(default)]
    pub org_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub blocked: Option<bool>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub modification_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersPage {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub total_count: u64,
}

/// A role defined in the tenant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_id: String,
    pub role_name: String,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub modification_date: Option<String>,
    #[serde(default)]
    pub permission_ids: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct UserRoles {
    #[serde(default)]
    roles: Vec<Role>,
}

// ── Request types ──────────────────────────────────────────────────────

/// Filters for [`list_users`] / [`iter_all`].
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub active: Option<bool>,
    pub blocked: Option<bool>,
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListUsersParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blocked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
    page: u32,
    page_size: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PageParams {
    page: u32,
    page_size: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRolesRequest<'a> {
    role_ids: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserIdsRequest {
    user_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MoveRequest<'a> {
    org_guid: &'a str,
}

// ── Endpoint functions ─────────────────────────────────────────────────

/// One page (1-based) of users.
pub async fn list_users(
    client: &IncydrClient,
    filter: &UserFilter,
    page: u32,
    page_size: usize,
) -> Result<UsersPage> {
    let params = ListUsersParams {
        active: filter.active,
        blocked: filter.blocked,
        username: filter.username.as_deref(),
        page,
        page_size,
    };
    client.get_with_query("/v1/users", &params).await
}

/// Streams every user matching `filter`.
pub fn iter_all<'a>(
    client: &'a IncydrClient,
    filter: UserFilter,
) -> impl Stream<Item = Result<User>> + 'a {
    let page_size = client.page_size().min(MAX_USER_PAGE_SIZE);
    paginate_by_number(1, page_size, move |page| {
        let filter = filter.clone();
        async move { Ok(list_users(client, &filter, page, page_size).await?.users) }
    })
}

pub async fn get_user(client: &IncydrClient, user_id: &str) -> Result<User> {
    client.get(&format!("/v1/users/{user_id}")).await
}

/// Resolves a username (email) to its user record.
pub async fn get_user_by_username(client: &IncydrClient, username: &str) -> Result<User> {
    let filter = UserFilter {
        username: Some(username.to_string()),
        ..Default::default()
    };
    let mut users = list_users(client, &filter, 1, 2).await?.users;
    match users.len() {
        0 => Err(IncydrError::NotFound {
            kind: "user",
            name: username.to_string(),
        }),
        1 => Ok(users.remove(0)),
        count => Err(IncydrError::Ambiguous {
            kind: "user",
            name: username.to_string(),
            count,
        }),
    }
}

/// Accepts a user id or a username; anything containing `@` is looked up
/// as a username.
pub async fn resolve_user_id(client: &IncydrClient, key: &str) -> Result<String> {
    if key.contains('@') {
        Ok(get_user_by_username(client, key).await?.user_id)
    } else {
        Ok(key.to_string())
    }
}

/// One page (1-based) of the devices owned by a user.
pub async fn get_devices(
    client: &IncydrClient,
    user_id: &str,
    page: u32,
    page_size: usize,
) -> Result<Vec<Device>> {
    let page: DevicesPage = client
        .get_with_query(
            &format!("/v1/users/{user_id}/devices"),
            &PageParams {
                page,
                page_size: page_size.min(crate::devices::MAX_DEVICE_PAGE_SIZE),
            },
        )
        .await?;
    Ok(page.devices)
}

/// All roles defined in the tenant, fetched once per client.
pub async fn list_roles(client: &IncydrClient) -> Result<&[Role]> {
    let roles = client
        .role_cache()
        .get_or_try_init(|| async {
            let roles: Vec<Role> = client.get("/v1/users/roles").await?;
            tracing::debug!(count = roles.len(), "cached tenant roles");
            Ok::<_, IncydrError>(roles)
        })
        .await?;
    Ok(roles.as_slice())
}

/// Maps role ids or names to role ids. Ids pass through unchanged.
pub async fn resolve_role_ids(client: &IncydrClient, roles: &[String]) -> Result<Vec<String>> {
    let known = list_roles(client).await?;
    roles
        .iter()
        .map(|wanted| {
            known
                .iter()
                .find(|r| r.role_id == *wanted || r.role_name.eq_ignore_ascii_case(wanted))
                .map(|r| r.role_id.clone())
                .ok_or_else(|| IncydrError::RoleNotFound(wanted.clone()))
        })
        .collect()
}

/// Roles currently assigned to a user.
pub async fn get_roles(client: &IncydrClient, user_id: &str) -> Result<Vec<Role>> {
    let roles: UserRoles = client.get(&format!("/v1/users/{user_id}/roles")).await?;
    Ok(roles.roles)
}

/// Replaces a user's roles with `roles` (ids or names).
pub async fn update_roles(client: &IncydrClient, user_id: &str, roles: &[String]) -> Result<()> {
    let role_ids = resolve_role_ids(client, roles).await?;
    put_roles(client, user_id, &role_ids).await
}

/// Adds `roles` (ids or names) to the user's current roles.
pub async fn add_roles(client: &IncydrClient, user_id: &str, roles: &[String]) -> Result<()> {
    let additions = resolve_role_ids(client, roles).await?;
    let mut role_ids: Vec<String> = get_roles(client, user_id)
        .await?
        .into_iter()
        .map(|r| r.role_id)
        .collect();
    for id in additions {
        if !role_ids.contains(&id) {
            role_ids.push(id);
        }
    }
    put_roles(client, user_id, &role_ids).await
}

/// Removes `roles` (ids or names) from the user.
///
/// # Errors
///
/// - `IncydrError::UserNotAssignedRole` when the user does not hold one of
///   the roles; nothing is changed.
pub async fn remove_roles(client: &IncydrClient, user_id: &str, roles: &[String]) -> Result<()> {
    let removals = resolve_role_ids(client, roles).await?;
    let current: Vec<String> = get_roles(client, user_id)
        .await?
        .into_iter()
        .map(|r| r.role_id)
        .collect();
    if let Some((name, _)) = roles
        .iter()
        .zip(&removals)
        .find(|(_, id)| !current.contains(id))
    {
        return Err(IncydrError::UserNotAssignedRole {
            user_id: user_id.to_string(),
            role: name.clone(),
        });
    }
    let remaining: Vec<String> = current
        .into_iter()
        .filter(|id| !removals.contains(id))
        .collect();
    put_roles(client, user_id, &remaining).await
}

async fn put_roles(client: &IncydrClient, user_id: &str, role_ids: &[String]) -> Result<()> {
    client
        .put_no_content(
            &format!("/v1/users/{user_id}/roles"),
            &UpdateRolesRequest { role_ids },
        )
        .await?;
    tracing::info!(%user_id, count = role_ids.len(), "user roles updated");
    Ok(())
}

pub async fn activate(client: &IncydrClient, user_id: &str) -> Result<()> {
    client
        .post_no_content(&format!("/v1/users/{user_id}/activate"), &serde_json::json!({}))
        .await
}

pub async fn deactivate(client: &IncydrClient, user_id: &str) -> Result<()> {
    client
        .post_no_content(&format!("/v1/users/{user_id}/deactivate"), &serde_json::json!({}))
        .await
}

/// Activates many users, falling back to per-user requests for a rejected
/// batch.
pub async fn bulk_activate(client: &IncydrClient, user_ids: &[String]) -> BulkOutcome {
    run_batched(
        user_ids,
        USER_BATCH_SIZE,
        |batch| async move {
            client
                .post_no_content("/v1/users/activate", &UserIdsRequest { user_ids: batch })
                .await
        },
        |id| async move { activate(client, &id).await },
    )
    .await
}

/// Deactivates many users, falling back to per-user requests for a rejected
/// batch.
pub async fn bulk_deactivate(client: &IncydrClient, user_ids: &[String]) -> BulkOutcome {
    run_batched(
        user_ids,
        USER_BATCH_SIZE,
        |batch| async move {
            client
                .post_no_content("/v1/users/deactivate", &UserIdsRequest { user_ids: batch })
                .await
        },
        |id| async move { deactivate(client, &id).await },
    )
    .await
}

/// Moves a user to another organization.
pub async fn move_user(client: &IncydrClient, user_id: &str, org_guid: &str) -> Result<()> {
    client
        .post_no_content(&format!("/v1/users/{user_id}/move"), &MoveRequest { org_guid })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_params_skip_unset_filters() {
        let params = ListUsersParams {
            active: Some(true),
            blocked: None,
            username: None,
            page: 2,
            page_size: 50,
        };
        let query = serde_json::to_value(&params).unwrap();
        assert_eq!(query, json!({"active": true, "page": 2, "pageSize": 50}));
    }

    #[test]
    fn role_deserializes_permission_ids() {
        let role: Role = serde_json::from_value(json!({
            "roleId": "desktop-user",
            "roleName": "Desktop User",
            "permissionIds": [{"permission": "endpoint.read", "type": "SIMPLE"}]
        }))
        .unwrap();
        assert_eq!(role.role_name, "Desktop User");
        assert_eq!(role.permission_ids.len(), 1);
    }

    #[test]
    fn user_tolerates_sparse_records() {
        let user: User =
            serde_json::from_value(json!({"userId": "u-1", "username": "a@example.com"})).unwrap();
        assert!(user.active.is_none());
    }
}
