//! File event search and saved searches.
//!
//! - [`search`] runs one page of an [`EventQuery`] against
//!   `POST /v2/file-events`. It is the only call that retries `429`
//!   responses: large exports hit the search rate limit routinely.
//! - [`iter_all`] follows `nextPgToken` until the server stops returning
//!   one, yielding events lazily.
//! - [`list_saved_searches`] / [`get_saved_search`] read searches stored in
//!   the web console. [`EventQuery::from_saved_search`] turns one back into
//!   a runnable query.
//!
//! File events carry several hundred optional fields. [`FileEvent`] types
//! the ones the CLI and checkpointing need and keeps the rest in `other`, so
//! a record re-serializes without loss.

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::checkpoint::Checkpointed;
use crate::client::IncydrClient;
use crate::dates::parse_api_timestamp;
use crate::error::{IncydrError, Result};
use crate::pagination::paginate_by_token;
use crate::queries::{Clause, EventQuery, Filter, QueryGroup, SortDirection};

// ── Response types ─────────────────────────────────────────────────────

/// One file event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEvent {
    /// When the activity happened, ISO 8601.
    #[serde(rename = "@timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub event: Option<EventMetadata>,
    #[serde(default)]
    pub user: Option<EventUser>,
    #[serde(default)]
    pub file: Option<EventFile>,
    #[serde(default)]
    pub source: Option<EventSource>,
    #[serde(default)]
    pub destination: Option<EventDestination>,
    #[serde(default)]
    pub process: Option<EventProcess>,
    #[serde(default)]
    pub risk: Option<EventRisk>,
    /// Fields without a typed counterpart.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub id: String,
    /// e.g. `file-created`, `application-read`, `removable-media-created`.
    #[serde(default)]
    pub action: Option<String>,
    /// Which sensor saw the event: `Endpoint`, `GoogleDrive`, ...
    #[serde(default)]
    pub observer: Option<String>,
    #[serde(default)]
    pub inserted: Option<String>,
    #[serde(default)]
    pub detector_display_name: Option<String>,
    #[serde(default)]
    pub share_type: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub device_uid: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub mime_type_by_bytes: Option<String>,
    #[serde(default)]
    pub size_in_bytes: Option<u64>,
    #[serde(default)]
    pub hash: Option<FileHash>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHash {
    #[serde(default)]
    pub md5: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSource {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDestination {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventProcess {
    #[serde(default)]
    pub executable: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRisk {
    #[serde(default)]
    pub score: Option<f64>,
    /// `NO_RISK_INDICATED`, `LOW`, `MODERATE`, `HIGH` or `CRITICAL`.
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub trusted: Option<bool>,
    #[serde(default)]
    pub trust_reason: Option<String>,
    #[serde(default)]
    pub indicators: Vec<RiskIndicator>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskIndicator {
    pub name: String,
    #[serde(default)]
    pub weight: Option<f64>,
}

impl Checkpointed for FileEvent {
    fn checkpoint_id(&self) -> Option<String> {
        self.event.as_ref().map(|e| e.id.clone())
    }

    fn checkpoint_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_api_timestamp)
    }
}

/// A filter the server refused, reported alongside a (possibly empty) page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryProblem {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bad_filter: Option<Filter>,
}

/// One page of `POST /v2/file-events`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEventsPage {
    pub total_count: u64,
    #[serde(default)]
    pub file_events: Vec<FileEvent>,
    #[serde(default)]
    pub next_pg_token: Option<String>,
    #[serde(default)]
    pub problems: Option<Vec<QueryProblem>>,
}

/// A search stored in the web console.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSearch {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub group_clause: Clause,
    #[serde(default)]
    pub groups: Vec<QueryGroup>,
    #[serde(rename = "srtDir", default)]
    pub sort_dir: Option<SortDirection>,
    #[serde(rename = "srtKey", default)]
    pub sort_key: Option<String>,
    #[serde(rename = "createdByUID", default)]
    pub created_by_uid: Option<String>,
    #[serde(default)]
    pub created_by_username: Option<String>,
    #[serde(default)]
    pub creation_timestamp: Option<String>,
    #[serde(rename = "modifiedByUID", default)]
    pub modified_by_uid: Option<String>,
    #[serde(default)]
    pub modified_by_username: Option<String>,
    #[serde(default)]
    pub modified_timestamp: Option<String>,
    #[serde(default)]
    pub api_version: Option<u32>,
    #[serde(default)]
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SavedSearchList {
    #[serde(default)]
    searches: Vec<SavedSearch>,
}

// ── Endpoint functions ─────────────────────────────────────────────────

/// Runs one page of `query`.
///
/// Problems the server reports with an otherwise successful response are
/// logged and returned on the page, not raised.
///
/// # Errors
///
/// - `IncydrError::Api` for a non-2xx status, including `429` once the
///   client's retry policy is exhausted.
pub async fn search(client: &IncydrClient, query: &EventQuery) -> Result<FileEventsPage> {
    let page: FileEventsPage = client.post_with_retry("/v2/file-events", query).await?;
    if let Some(problems) = page.problems.as_deref().filter(|p| !p.is_empty()) {
        tracing::warn!(count = problems.len(), "file event search reported problems");
    }
    tracing::debug!(
        total = page.total_count,
        returned = page.file_events.len(),
        "file event page"
    );
    Ok(page)
}

/// Streams every event matching `query`, following page tokens.
///
/// The query's own `page_token` is ignored; paging always starts from the
/// first page.
pub fn iter_all<'a>(
    client: &'a IncydrClient,
    query: &EventQuery,
) -> impl Stream<Item = Result<FileEvent>> + 'a {
    let base = query.clone();
    paginate_by_token(move |token| {
        let mut page_query = base.clone();
        page_query.page_token = Some(token);
        async move {
            let page = search(client, &page_query).await?;
            Ok((page.file_events, page.next_pg_token))
        }
    })
}

/// Lists saved searches visible to the API client.
pub async fn list_saved_searches(client: &IncydrClient) -> Result<Vec<SavedSearch>> {
    let list: SavedSearchList = client.get("/v2/file-events/saved-searches").await?;
    Ok(list.searches)
}

/// Fetches one saved search by id.
pub async fn get_saved_search(client: &IncydrClient, id: &str) -> Result<SavedSearch> {
    let list: SavedSearchList = client
        .get(&format!("/v2/file-events/saved-searches/{id}"))
        .await?;
    list.searches
        .into_iter()
        .next()
        .ok_or_else(|| IncydrError::NotFound {
            kind: "saved search",
            name: id.to_string(),
        })
}
