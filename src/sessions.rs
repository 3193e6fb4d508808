//! Sessions: groups of related file activity by one actor, scored for risk.
//!
//! Session timestamps (`beginTime`, `endTime`, ...) are epoch
//! milliseconds.

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::IncydrClient;
use crate::error::{IncydrError, Result};
use crate::pagination::paginate_by_number;

/// Server-side maximum page size.
pub const MAX_SESSION_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    Open,
    OpenAsIncident,
    Closed,
    ClosedTp,
    ClosedTpBenign,
    ClosedFp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStateChange {
    pub state: SessionState,
    #[serde(default)]
    pub source_timestamp: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionNote {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source_timestamp: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub begin_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
    #[serde(default)]
    pub last_updated: Option<i64>,
    #[serde(default)]
    pub no_risk_score: Option<i64>,
    #[serde(default)]
    pub low_risk_score: Option<i64>,
    #[serde(default)]
    pub moderate_risk_score: Option<i64>,
    #[serde(default)]
    pub high_risk_score: Option<i64>,
    #[serde(default)]
    pub critical_risk_score: Option<i64>,
    #[serde(default)]
    pub states: Vec<SessionStateChange>,
    #[serde(default)]
    pub alert_ids: Vec<String>,
    #[serde(default)]
    pub notes: Vec<SessionNote>,
    #[serde(default)]
    pub exfiltration_summary: Option<String>,
    #[serde(default)]
    pub context_summary: Option<String>,
    #[serde(default)]
    pub scores: Vec<Value>,
}

impl Session {
    /// The most recent state change, if any.
    pub fn current_state(&self) -> Option<SessionState> {
        self.states
            .iter()
            .max_by_key(|s| s.source_timestamp.unwrap_or_default())
            .map(|s| s.state)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsPage {
    #[serde(default)]
    pub items: Vec<Session>,
    #[serde(default)]
    pub total_count: u64,
}

/// Filters for [`list_sessions`]. Times are epoch milliseconds.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_or_after: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_alerts: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<SessionState>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListParams<'a> {
    #[serde(flatten)]
    filter: &'a SessionFilter,
    page_number: u32,
    page_size: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeStatesRequest<'a> {
    ids: &'a [String],
    new_state: SessionState,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddNoteRequest<'a> {
    note_content: &'a str,
}

pub async fn list_sessions(
    client: &IncydrClient,
    filter: &SessionFilter,
    page: u32,
    page_size: usize,
) -> Result<SessionsPage> {
    let params = ListParams {
        filter,
        page_number: page,
        page_size,
    };
    client.get_with_query("/v1/sessions", &params).await
}

pub fn iter_all<'a>(
    client: &'a IncydrClient,
    filter: SessionFilter,
) -> impl Stream<Item = Result<Session>> + 'a {
    let page_size = client.page_size().min(MAX_SESSION_PAGE_SIZE);
    paginate_by_number(1, page_size, move |page| {
        let filter = filter.clone();
        async move { Ok(list_sessions(client, &filter, page, page_size).await?.items) }
    })
}

pub async fn get_session(client: &IncydrClient, session_id: &str) -> Result<Session> {
    client.get(&format!("/v1/sessions/{session_id}")).await
}

/// Changes the state of one session and/or adds a note to it.
pub async fn update_session(
    client: &IncydrClient,
    session_id: &str,
    state: Option<SessionState>,
    note: Option<&str>,
) -> Result<()> {
    if state.is_none() && note.is_none() {
        return Err(IncydrError::Validation(
            "nothing to update: give a state, a note or both".to_string(),
        ));
    }
    if let Some(new_state) = state {
        let ids = [session_id.to_string()];
        client
            .post_no_content(
                "/v1/sessions/change-states",
                &ChangeStatesRequest {
                    ids: &ids,
                    new_state,
                },
            )
            .await?;
    }
    if let Some(note_content) = note {
        client
            .post_no_content(
                &format!("/v1/sessions/{session_id}/add-note"),
                &AddNoteRequest { note_content },
            )
            .await?;
    }
    Ok(())
}
