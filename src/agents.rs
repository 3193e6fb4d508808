//! Endpoint agents.

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::bulk::{run_batched, BulkOutcome};
use crate::client::IncydrClient;
use crate::error::Result;
use crate::pagination::paginate_by_number;

/// Server-side maximum page size.
pub const MAX_AGENT_PAGE_SIZE: usize = 1_000;

/// Agents sent per bulk activate/deactivate request.
pub const AGENT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub agent_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub os_hostname: Option<String>,
    #[serde(default)]
    pub os_name: Option<String>,
    #[serde(default)]
    pub machine_id: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub agent_type: Option<String>,
    #[serde(default)]
    pub agent_healthy: Option<bool>,
    #[serde(default)]
    pub agent_health_issue_types: Vec<String>,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub product_version: Option<String>,
    #[serde(default)]
    pub last_connected: Option<String>,
    #[serde(default)]
    pub external_reference: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub modification_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentsPage {
    #[serde(default)]
    pub agents: Vec<Agent>,
    #[serde(default)]
    pub total_count: u64,
}

/// Filters for [`list_agents`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_healthy: Option<bool>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListParams<'a> {
    #[serde(flatten)]
    filter: &'a AgentFilter,
    page_num: u32,
    page_size: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest<'a> {
    external_reference: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentIdsRequest {
    agent_ids: Vec<String>,
}

/// One page (1-based) of agents.
pub async fn list_agents(
    client: &IncydrClient,
    filter: &AgentFilter,
    page: u32,
    page_size: usize,
) -> Result<AgentsPage> {
    let params = ListParams {
        filter,
        page_num: page,
        page_size,
    };
    client.get_with_query("/v1/agents", &params).await
}

pub fn iter_all<'a>(
    client: &'a IncydrClient,
    filter: AgentFilter,
) -> impl Stream<Item = Result<Agent>> + 'a {
    let page_size = client.page_size().min(MAX_AGENT_PAGE_SIZE);
    paginate_by_number(1, page_size, move |page| {
        let filter = filter.clone();
        async move { Ok(list_agents(client, &filter, page, page_size).await?.agents) }
    })
}

pub async fn get_agent(client: &IncydrClient, agent_id: &str) -> Result<Agent> {
    client.get(&format!("/v1/agents/{agent_id}")).await
}

/// Sets (or clears, with `None`) the agent's external reference.
pub async fn update_agent(
    client: &IncydrClient,
    agent_id: &str,
    external_reference: Option<&str>,
) -> Result<()> {
    client
        .put_no_content(
            &format!("/v1/agents/{agent_id}"),
            &UpdateRequest { external_reference },
        )
        .await
}

pub async fn bulk_activate(client: &IncydrClient, agent_ids: &[String]) -> BulkOutcome {
    bulk_change(client, agent_ids, "/v1/agents/activate").await
}

pub async fn bulk_deactivate(client: &IncydrClient, agent_ids: &[String]) -> BulkOutcome {
    bulk_change(client, agent_ids, "/v1/agents/deactivate").await
}

async fn bulk_change(client: &IncydrClient, agent_ids: &[String], path: &str) -> BulkOutcome {
    run_batched(
        agent_ids,
        AGENT_BATCH_SIZE,
        |batch| async move {
            client
                .post_no_content(path, &AgentIdsRequest { agent_ids: batch })
                .await
        },
        |id| async move {
            client
                .post_no_content(path, &AgentIdsRequest { agent_ids: vec![id] })
                .await
        },
    )
    .await
}
