//! Alert search, details and triage.
//!
//! Alert search pages are 0-based. The search body must carry the tenant
//! id; [`search`] fills it from the client's cached `/v1/customer` lookup
//! when the query leaves it unset.

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checkpoint::Checkpointed;
use crate::client::IncydrClient;
use crate::dates::parse_api_timestamp;
use crate::error::{IncydrError, Result};
use crate::pagination::paginate_by_number;
use crate::queries::AlertQuery;

// ── Response types ─────────────────────────────────────────────────────

/// Triage state of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertState {
    Open,
    Resolved,
    Pending,
    InProgress,
}

impl AlertState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertState::Open => "OPEN",
            AlertState::Resolved => "RESOLVED",
            AlertState::Pending => "PENDING",
            AlertState::InProgress => "IN_PROGRESS",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertNote {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub last_modified_at: Option<String>,
    #[serde(default)]
    pub last_modified_by: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertWatchlist {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub is_significant: Option<bool>,
}

/// An alert summary as returned by search.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub risk_severity: Option<String>,
    #[serde(default)]
    pub rule_id: Option<String>,
    #[serde(default)]
    pub rule_source: Option<String>,
    #[serde(default)]
    pub watchlists: Vec<AlertWatchlist>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub state: Option<AlertState>,
    #[serde(default)]
    pub state_last_modified_by: Option<String>,
    #[serde(default)]
    pub state_last_modified_at: Option<String>,
    #[serde(default)]
    pub note: Option<AlertNote>,
}

impl Checkpointed for Alert {
    fn checkpoint_id(&self) -> Option<String> {
        Some(self.id.clone())
    }

    fn checkpoint_timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_api_timestamp)
    }
}

/// One observation attached to an alert. `data` is a JSON document encoded
/// as a string whose shape depends on `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub observed_at: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

impl Observation {
    /// Decodes `data`, which the server sends as an embedded JSON string.
    pub fn data_json(&self) -> Result<Option<Value>> {
        self.data
            .as_deref()
            .map(serde_json::from_str::<Value>)
            .transpose()
            .map_err(IncydrError::from)
    }
}

/// An alert with its observations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDetails {
    #[serde(flatten)]
    pub alert: Alert,
    #[serde(default)]
    pub observations: Vec<Observation>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsPage {
    #[serde(default)]
    pub alerts: Vec<Alert>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub problems: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct AlertDetailsList {
    #[serde(default)]
    alerts: Vec<AlertDetails>,
}

// ── Request types ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetailsRequest<'a> {
    alert_ids: &'a [String],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateStateRequest<'a> {
    tenant_id: &'a str,
    alert_ids: &'a [String],
    state: AlertState,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddNoteRequest<'a> {
    tenant_id: &'a str,
    alert_id: &'a str,
    note: &'a str,
}

// ── Endpoint functions ─────────────────────────────────────────────────

/// Runs one page of `query`, filling in the tenant id when unset.
pub async fn search(client: &IncydrClient, query: &AlertQuery) -> Result<AlertsPage> {
    let page: AlertsPage = if query.tenant_id.is_some() {
        client.post("/v1/alerts/query-alerts", query).await?
    } else {
        let mut query = query.clone();
        query.tenant_id = Some(client.tenant_id().await?);
        client.post("/v1/alerts/query-alerts", &query).await?
    };
    tracing::debug!(
        total = page.total_count,
        returned = page.alerts.len(),
        "alert page"
    );
    Ok(page)
}

/// Streams every alert matching `query`, starting at its `page_num`.
pub fn iter_all<'a>(
    client: &'a IncydrClient,
    query: &AlertQuery,
) -> impl Stream<Item = Result<Alert>> + 'a {
    let base = query.clone();
    paginate_by_number(base.page_num, base.page_size, move |page| {
        let mut page_query = base.clone();
        page_query.page_num = page;
        async move { Ok(search(client, &page_query).await?.alerts) }
    })
}

/// Fetches full details, observations included, for `alert_ids`.
pub async fn get_details(client: &IncydrClient, alert_ids: &[String]) -> Result<Vec<AlertDetails>> {
    if alert_ids.is_empty() {
        return Ok(Vec::new());
    }
    let list: AlertDetailsList = client
        .post("/v1/alerts/query-details", &DetailsRequest { alert_ids })
        .await?;
    Ok(list.alerts)
}

/// Fetches one alert with details.
pub async fn get_alert(client: &IncydrClient, alert_id: &str) -> Result<AlertDetails> {
    get_details(client, &[alert_id.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| IncydrError::NotFound {
            kind: "alert",
            name: alert_id.to_string(),
        })
}

/// Moves `alert_ids` to `state`, optionally attaching a note.
pub async fn change_state(
    client: &IncydrClient,
    alert_ids: &[String],
    state: AlertState,
    note: Option<&str>,
) -> Result<()> {
    let tenant_id = client.tenant_id().await?;
    let body = UpdateStateRequest {
        tenant_id: &tenant_id,
        alert_ids,
        state,
        note,
    };
    client.post_no_content("/v1/alerts/update-state", &body).await?;
    tracing::info!(count = alert_ids.len(), state = state.as_str(), "alert state changed");
    Ok(())
}

/// Adds (or replaces) the note on an alert.
pub async fn add_note(client: &IncydrClient, alert_id: &str, note: &str) -> Result<()> {
    let tenant_id = client.tenant_id().await?;
    let body = AddNoteRequest {
        tenant_id: &tenant_id,
        alert_id,
        note,
    };
    client.post_no_content("/v1/alerts/add-note", &body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn alert_state_uses_wire_names() {
        assert_eq!(serde_json::to_value(AlertState::InProgress).unwrap(), json!("IN_PROGRESS"));
        let state: AlertState = serde_json::from_value(json!("RESOLVED")).unwrap();
        assert_eq!(state, AlertState::Resolved);
    }

    #[test]
    fn details_flatten_alert_fields() {
        let details: AlertDetails = serde_json::from_value(json!({
            "id": "alert-1",
            "type": "FED_ENDPOINT_EXFILTRATION",
            "createdAt": "2023-04-01T08:00:00.123Z",
            "state": "OPEN",
            "observations": [{
                "id": "obs-1",
                "type": "FedEndpointExfiltration",
                "data": "{\"fileCount\": 3}"
            }]
        }))
        .unwrap();
        assert_eq!(details.alert.id, "alert-1");
        assert_eq!(details.alert.state, Some(AlertState::Open));
        let data = details.observations[0].data_json().unwrap().unwrap();
        assert_eq!(data["fileCount"], 3);
        assert!(details.alert.checkpoint_timestamp().is_some());
    }

    #[test]
    fn update_state_body_omits_missing_note() {
        let ids = vec!["a".to_string()];
        let body = UpdateStateRequest {
            tenant_id: "t",
            alert_ids: &ids,
            state: AlertState::Pending,
            note: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"tenantId": "t", "alertIds": ["a"], "state": "PENDING"})
        );
    }
}
