//! Actors: the identities file activity and alerts are attributed to.

use serde::{Deserialize, Serialize};

use crate::client::IncydrClient;
use crate::error::{IncydrError, Result};

/// Server-side maximum page size.
pub const MAX_ACTOR_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub actor_id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub alternate_names: Vec<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub employee_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub manager_actor_id: Option<String>,
    #[serde(default)]
    pub parent_actor_id: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActorList {
    #[serde(default)]
    actors: Vec<Actor>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams<'a> {
    name_starts_with: &'a str,
    page_num: u32,
    page_size: usize,
}

fn not_found(key: &str, err: IncydrError) -> IncydrError {
    match err.status() {
        Some(status) if status == reqwest::StatusCode::NOT_FOUND => {
            IncydrError::ActorNotFound(key.to_string())
        }
        _ => err,
    }
}

/// Fetches an actor by id.
pub async fn get_actor_by_id(client: &IncydrClient, actor_id: &str) -> Result<Actor> {
    client
        .get(&format!("/v1/actors/actor/{actor_id}"))
        .await
        .map_err(|e| not_found(actor_id, e))
}

/// Fetches an actor by exact name (usually an email address).
///
/// # Errors
///
/// - `IncydrError::ActorNotFound` when the server answers `404`.
pub async fn get_actor_by_name(client: &IncydrClient, name: &str) -> Result<Actor> {
    client
        .get(&format!("/v1/actors/actor/name/{name}"))
        .await
        .map_err(|e| not_found(name, e))
}

/// Actors whose name starts with `prefix`; first page only.
pub async fn search_actors(
    client: &IncydrClient,
    prefix: &str,
    page_size: usize,
) -> Result<Vec<Actor>> {
    let params = SearchParams {
        name_starts_with: prefix,
        page_num: 1,
        page_size: page_size.min(MAX_ACTOR_PAGE_SIZE),
    };
    let list: ActorList = client.get_with_query("/v1/actors/search", &params).await?;
    Ok(list.actors)
}

/// Resolves an id or a name to an actor id. Anything containing `@` is
/// treated as a name.
pub async fn resolve_actor_id(client: &IncydrClient, key: &str) -> Result<String> {
    let actor = if key.contains('@') {
        get_actor_by_name(client, key).await?
    } else {
        get_actor_by_id(client, key).await?
    };
    Ok(actor.actor_id)
}
