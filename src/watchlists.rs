//! Watchlists and their included actors.
//!
//! Built-in watchlists are identified by type (`DEPARTING_EMPLOYEE`, ...);
//! there is at most one of each per tenant. Custom watchlists have type
//! `CUSTOM` and are identified by title. [`resolve_watchlist_id`] accepts
//! an id, a type or a title.

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::bulk::{run_batched, BulkOutcome};
use crate::client::IncydrClient;
use crate::error::{IncydrError, Result};
use crate::pagination::{collect_all, paginate_by_number};

/// Server-side maximum page size.
pub const MAX_WATCHLIST_PAGE_SIZE: usize = 500;

/// Actors sent per add/remove request.
pub const MEMBER_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WatchlistType {
    Custom,
    DepartingEmployee,
    HighImpactEmployee,
    ElevatedAccessPrivileges,
    PoorSecurityPractices,
    SuspiciousSystemActivity,
    FlightRiskEmployee,
    PerformanceConcerns,
    ContractEmployee,
    NewEmployee,
}

impl WatchlistType {
    pub const ALL: [WatchlistType; 10] = [
        WatchlistType::Custom,
        WatchlistType::DepartingEmployee,
        WatchlistType::HighImpactEmployee,
        WatchlistType::ElevatedAccessPrivileges,
        WatchlistType::PoorSecurityPractices,
        WatchlistType::SuspiciousSystemActivity,
        WatchlistType::FlightRiskEmployee,
        WatchlistType::PerformanceConcerns,
        WatchlistType::ContractEmployee,
        WatchlistType::NewEmployee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WatchlistType::Custom => "CUSTOM",
            WatchlistType::DepartingEmployee => "DEPARTING_EMPLOYEE",
            WatchlistType::HighImpactEmployee => "HIGH_IMPACT_EMPLOYEE",
            WatchlistType::ElevatedAccessPrivileges => "ELEVATED_ACCESS_PRIVILEGES",
            WatchlistType::PoorSecurityPractices => "POOR_SECURITY_PRACTICES",
            WatchlistType::SuspiciousSystemActivity => "SUSPICIOUS_SYSTEM_ACTIVITY",
            WatchlistType::FlightRiskEmployee => "FLIGHT_RISK_EMPLOYEE",
            WatchlistType::PerformanceConcerns => "PERFORMANCE_CONCERNS",
            WatchlistType::ContractEmployee => "CONTRACT_EMPLOYEE",
            WatchlistType::NewEmployee => "NEW_EMPLOYEE",
        }
    }

    pub fn from_name(name: &str) -> Option<WatchlistType> {
        WatchlistType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistStats {
    #[serde(default)]
    pub included_actors_count: Option<u64>,
    #[serde(default)]
    pub excluded_actors_count: Option<u64>,
    #[serde(default)]
    pub included_departments_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Watchlist {
    pub watchlist_id: String,
    pub list_type: WatchlistType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub stats: Option<WatchlistStats>,
}

impl Watchlist {
    /// Title for custom lists, type name otherwise.
    pub fn display_name(&self) -> &str {
        match (&self.list_type, self.title.as_deref()) {
            (WatchlistType::Custom, Some(title)) => title,
            (list_type, _) => list_type.as_str(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistsPage {
    #[serde(default)]
    pub watchlists: Vec<Watchlist>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistActor {
    pub actor_id: String,
    #[serde(default)]
    pub actor_name: Option<String>,
    #[serde(default)]
    pub added_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncludedActors {
    #[serde(default)]
    included_actors: Vec<WatchlistActor>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequest<'a> {
    watchlist_type: WatchlistType,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MembersRequest<'a> {
    actor_ids: Vec<String>,
    watchlist_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    page: u32,
    page_size: usize,
}

// ── Endpoint functions ─────────────────────────────────────────────────

pub async fn list_watchlists(
    client: &IncydrClient,
    page: u32,
    page_size: usize,
) -> Result<WatchlistsPage> {
    client
        .get_with_query("/v1/watchlists", &ListParams { page, page_size })
        .await
}

pub fn iter_all(client: &IncydrClient) -> impl Stream<Item = Result<Watchlist>> + '_ {
    let page_size = client.page_size().min(MAX_WATCHLIST_PAGE_SIZE);
    paginate_by_number(1, page_size, move |page| async move {
        Ok(list_watchlists(client, page, page_size).await?.watchlists)
    })
}

pub async fn get_watchlist(client: &IncydrClient, watchlist_id: &str) -> Result<Watchlist> {
    client.get(&format!("/v1/watchlists/{watchlist_id}")).await
}

/// Creates a watchlist. Custom watchlists need a title.
pub async fn create_watchlist(
    client: &IncydrClient,
    watchlist_type: WatchlistType,
    title: Option<&str>,
    description: Option<&str>,
) -> Result<Watchlist> {
    if watchlist_type == WatchlistType::Custom && title.is_none() {
        return Err(IncydrError::Validation(
            "a CUSTOM watchlist requires a title".to_string(),
        ));
    }
    let body = CreateRequest {
        watchlist_type,
        title,
        description,
    };
    client.post("/v1/watchlists", &body).await
}

pub async fn delete_watchlist(client: &IncydrClient, watchlist_id: &str) -> Result<()> {
    client.delete(&format!("/v1/watchlists/{watchlist_id}")).await
}

/// Finds a watchlist id from an id, a type name or a custom title.
///
/// # Errors
///
/// - `IncydrError::WatchlistNotFound` when nothing matches.
/// - `IncydrError::Ambiguous` when several custom lists share the title.
pub async fn resolve_watchlist_id(client: &IncydrClient, key: &str) -> Result<String> {
    let all = collect_all(iter_all(client)).await?;
    if let Some(w) = all.iter().find(|w| w.watchlist_id == key) {
        return Ok(w.watchlist_id.clone());
    }
    let matches: Vec<&Watchlist> = match WatchlistType::from_name(key) {
        Some(list_type) if list_type != WatchlistType::Custom => {
            all.iter().filter(|w| w.list_type == list_type).collect()
        }
        _ => all
            .iter()
            .filter(|w| w.list_type == WatchlistType::Custom && w.title.as_deref() == Some(key))
            .collect(),
    };
    match matches.as_slice() {
        [] => Err(IncydrError::WatchlistNotFound(key.to_string())),
        [one] => Ok(one.watchlist_id.clone()),
        many => Err(IncydrError::Ambiguous {
            kind: "watchlist",
            name: key.to_string(),
            count: many.len(),
        }),
    }
}

pub async fn list_included_actors(
    client: &IncydrClient,
    watchlist_id: &str,
) -> Result<Vec<WatchlistActor>> {
    let members: IncludedActors = client
        .get(&format!("/v1/watchlists/{watchlist_id}/included-actors"))
        .await?;
    Ok(members.included_actors)
}

/// Adds actors to a watchlist, batching requests.
pub async fn add_included_actors(
    client: &IncydrClient,
    watchlist_id: &str,
    actor_ids: &[String],
) -> BulkOutcome {
    change_members(client, watchlist_id, actor_ids, "add").await
}

/// Removes actors from a watchlist, batching requests.
pub async fn remove_included_actors(
    client: &IncydrClient,
    watchlist_id: &str,
    actor_ids: &[String],
) -> BulkOutcome {
    change_members(client, watchlist_id, actor_ids, "remove").await
}

async fn change_members(
    client: &IncydrClient,
    watchlist_id: &str,
    actor_ids: &[String],
    verb: &str,
) -> BulkOutcome {
    let path = format!("/v1/watchlists/{watchlist_id}/included-actors/{verb}");
    let path = path.as_str();
    run_batched(
        actor_ids,
        MEMBER_BATCH_SIZE,
        |batch| async move {
            let body = MembersRequest {
                actor_ids: batch,
                watchlist_id,
            };
            client.post_no_content(path, &body).await
        },
        |id| async move {
            let body = MembersRequest {
                actor_ids: vec![id],
                watchlist_id,
            };
            client.post_no_content(path, &body).await
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_lookup_is_closed() {
        assert_eq!(
            WatchlistType::from_name("departing_employee"),
            Some(WatchlistType::DepartingEmployee)
        );
        assert_eq!(WatchlistType::from_name("VIP"), None);
        for t in WatchlistType::ALL {
            assert_eq!(serde_json::to_value(t).unwrap(), json!(t.as_str()));
        }
    }

    #[test]
    fn display_name_prefers_custom_title() {
        let custom: Watchlist = serde_json::from_value(json!({
            "watchlistId": "w-1", "listType": "CUSTOM", "title": "Contractors Q3"
        }))
        .unwrap();
        let builtin: Watchlist = serde_json::from_value(json!({
            "watchlistId": "w-2", "listType": "NEW_EMPLOYEE"
        }))
        .unwrap();
        assert_eq!(custom.display_name(), "Contractors Q3");
        assert_eq!(builtin.display_name(), "NEW_EMPLOYEE");
    }
}
