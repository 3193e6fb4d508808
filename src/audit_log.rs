//! Audit log search.
//!
//! Audit events are heterogeneous: each event type adds its own fields.
//! [`AuditEvent`] types the common envelope and keeps the rest in `other`.
//! Search pages are 0-based.

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::checkpoint::Checkpointed;
use crate::client::IncydrClient;
use crate::dates::{format_ms_timestamp, parse_api_timestamp};
use crate::error::Result;
use crate::pagination::paginate_by_number;

/// Server-side maximum for `pageSize`.
pub const MAX_AUDIT_PAGE_SIZE: usize = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    #[serde(rename = "$type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub actor_name: Option<String>,
    #[serde(default)]
    pub actor_ip_address: Option<String>,
    #[serde(default)]
    pub actor_agent: Option<String>,
    #[serde(default)]
    pub actor_type: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Checkpointed for AuditEvent {
    /// Events without an id are keyed by type, actor and time, which is
    /// unique for all practical purposes.
    fn checkpoint_id(&self) -> Option<String> {
        self.id.clone().or_else(|| {
            Some(format!(
                "{}|{}|{}",
                self.event_type.as_deref().unwrap_or_default(),
                self.actor_id.as_deref().unwrap_or_default(),
                self.timestamp.as_deref().unwrap_or_default()
            ))
        })
    }

    fn checkpoint_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_api_timestamp)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// Search criteria for [`search`]. Empty lists match everything.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub date_range: DateRange,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub event_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actor_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actor_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actor_ip_addresses: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub affected_user_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub affected_user_names: Vec<String>,
}

impl AuditLogQuery {
    pub fn between(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        AuditLogQuery {
            date_range: DateRange {
                start_time: start.as_ref().map(format_ms_timestamp),
                end_time: end.as_ref().map(format_ms_timestamp),
            },
            ..Default::default()
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    #[serde(flatten)]
    query: &'a AuditLogQuery,
    page: u32,
    page_size: usize,
}

#[derive(Debug, Deserialize)]
struct AuditEvents {
    #[serde(default)]
    events: Vec<AuditEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultCount {
    total_result_count: u64,
}

/// One page (0-based) of audit events.
pub async fn search(
    client: &IncydrClient,
    query: &AuditLogQuery,
    page: u32,
    page_size: usize,
) -> Result<Vec<AuditEvent>> {
    let body = SearchRequest {
        query,
        page,
        page_size: page_size.min(MAX_AUDIT_PAGE_SIZE),
    };
    let events: AuditEvents = client.post("/v1/audit/search-audit-log", &body).await?;
    Ok(events.events)
}

pub fn iter_all<'a>(
    client: &'a IncydrClient,
    query: AuditLogQuery,
) -> impl Stream<Item = Result<AuditEvent>> + 'a {
    let page_size = client.page_size().min(MAX_AUDIT_PAGE_SIZE);
    paginate_by_number(0, page_size, move |page| {
        let query = query.clone();
        async move { search(client, &query, page, page_size).await }
    })
}

/// Number of events matching `query`.
pub async fn result_count(client: &IncydrClient, query: &AuditLogQuery) -> Result<u64> {
    let count: ResultCount = client.post("/v1/audit/search-results-count", query).await?;
    Ok(count.total_result_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn request_flattens_query_and_skips_empty_lists() {
        let mut query = AuditLogQuery::between(Utc.timestamp_opt(1_672_531_200, 0).single(), None);
        query.actor_names.push("admin@example.com".into());
        let body = SearchRequest {
            query: &query,
            page: 0,
            page_size: 50,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "dateRange": {"startTime": "2023-01-01T00:00:00.000Z"},
                "actorNames": ["admin@example.com"],
                "page": 0,
                "pageSize": 50
            })
        );
    }

    #[test]
    fn events_without_id_get_composite_key() {
        let event: AuditEvent = serde_json::from_value(json!({
            "$type": "audit_log::LoginSuccess/1",
            "actorId": "u-1",
            "timestamp": "2023-01-01T00:00:00.000Z",
            "loginType": "SSO"
        }))
        .unwrap();
        assert_eq!(
            event.checkpoint_id().as_deref(),
            Some("audit_log::LoginSuccess/1|u-1|2023-01-01T00:00:00.000Z")
        );
        assert_eq!(event.other["loginType"], "SSO");
    }
}
