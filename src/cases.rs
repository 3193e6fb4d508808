//! Cases and the file events attached to them.

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::IncydrClient;
use crate::error::Result;
use crate::pagination::paginate_by_number;
use crate::queries::SortDirection;

/// Server-side maximum for `pgSize`.
pub const MAX_CASE_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
#[value(rename_all = "UPPERCASE")]
pub enum CaseStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub number: u64,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub findings: Option<String>,
    /// User id of the case subject.
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub subject_username: Option<String>,
    #[serde(default)]
    pub status: Option<CaseStatus>,
    /// User id of the assignee.
    #[serde(default)]
    pub assignee: Option<String>,
    #[serde(default)]
    pub assignee_username: Option<String>,
    #[serde(default)]
    pub created_by_user_id: Option<String>,
    #[serde(default)]
    pub created_by_username: Option<String>,
    #[serde(default)]
    pub last_modified_by_user_id: Option<String>,
    #[serde(default)]
    pub last_modified_by_username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasesPage {
    #[serde(default)]
    pub cases: Vec<Case>,
    #[serde(default)]
    pub total_count: u64,
}

/// Body for [`create_case`]. Only `name` is required.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCase {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub findings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

/// Fields changed by [`update_case`]. Unset fields keep their current
/// value.
#[derive(Debug, Clone, Default)]
pub struct CaseUpdate {
    pub name: Option<String>,
    pub assignee: Option<String>,
    pub description: Option<String>,
    pub findings: Option<String>,
    pub subject: Option<String>,
    pub status: Option<CaseStatus>,
}

/// `PUT /v1/cases/{number}` replaces every mutable field at once.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateCaseRequest {
    name: String,
    assignee: Option<String>,
    description: Option<String>,
    findings: Option<String>,
    subject: Option<String>,
    status: Option<CaseStatus>,
}

/// A file event attached to a case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseFileEvent {
    pub event_id: String,
    #[serde(flatten)]
    pub other: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CaseFileEvents {
    #[serde(default)]
    events: Vec<CaseFileEvent>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    pg_num: u32,
    pg_size: usize,
    srt_dir: &'static str,
    srt_key: &'static str,
}

// ── Endpoint functions ─────────────────────────────────────────────────

/// One page (1-based) of cases, newest number first.
pub async fn list_cases(client: &IncydrClient, page: u32, page_size: usize) -> Result<CasesPage> {
    let params = ListParams {
        pg_num: page,
        pg_size: page_size,
        srt_dir: SortDirection::Desc.as_upper(),
        srt_key: "number",
    };
    client.get_with_query("/v1/cases", &params).await
}

pub fn iter_all(client: &IncydrClient) -> impl Stream<Item = Result<Case>> + '_ {
    let page_size = client.page_size().min(MAX_CASE_PAGE_SIZE);
    paginate_by_number(1, page_size, move |page| async move {
        Ok(list_cases(client, page, page_size).await?.cases)
    })
}

pub async fn get_case(client: &IncydrClient, number: u64) -> Result<Case> {
    client.get(&format!("/v1/cases/{number}")).await
}

pub async fn create_case(client: &IncydrClient, case: &NewCase) -> Result<Case> {
    let created: Case = client.post("/v1/cases", case).await?;
    tracing::info!(number = created.number, "case created");
    Ok(created)
}

/// Applies `update` on top of the case's current fields.
pub async fn update_case(client: &IncydrClient, number: u64, update: CaseUpdate) -> Result<Case> {
    let current = get_case(client, number).await?;
    let body = UpdateCaseRequest {
        name: update.name.unwrap_or(current.name),
        assignee: update.assignee.or(current.assignee),
        description: update.description.or(current.description),
        findings: update.findings.or(current.findings),
        subject: update.subject.or(current.subject),
        status: update.status.or(current.status),
    };
    client.put(&format!("/v1/cases/{number}"), &body).await
}

pub async fn delete_case(client: &IncydrClient, number: u64) -> Result<()> {
    client.delete(&format!("/v1/cases/{number}")).await
}

pub async fn list_file_events(client: &IncydrClient, number: u64) -> Result<Vec<CaseFileEvent>> {
    let events: CaseFileEvents = client.get(&format!("/v1/cases/{number}/fileevent")).await?;
    Ok(events.events)
}

pub async fn add_file_event(client: &IncydrClient, number: u64, event_id: &str) -> Result<()> {
    client
        .post_no_content(
            &format!("/v1/cases/{number}/fileevent/{event_id}"),
            &serde_json::json!({}),
        )
        .await
}

pub async fn delete_file_event(client: &IncydrClient, number: u64, event_id: &str) -> Result<()> {
    client
        .delete(&format!("/v1/cases/{number}/fileevent/{event_id}"))
        .await
}
