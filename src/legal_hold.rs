//! Legal hold matters and their custodians.

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::client::IncydrClient;
use crate::error::Result;
use crate::pagination::paginate_by_number;

/// Server-side maximum page size.
pub const MAX_LEGAL_HOLD_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatterCreator {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matter {
    pub matter_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub policy_id: Option<String>,
    #[serde(default)]
    pub creator: Option<MatterCreator>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MattersPage {
    #[serde(default)]
    pub matters: Vec<Matter>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Custodian {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub membership_active: Option<bool>,
    #[serde(default)]
    pub membership_creation_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustodiansPage {
    #[serde(default)]
    pub custodians: Vec<Custodian>,
    #[serde(default)]
    pub total_count: u64,
}

/// Filters for [`list_matters`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatterFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body for [`create_matter`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMatter {
    pub name: String,
    pub policy_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListParams<'a> {
    #[serde(flatten)]
    filter: &'a MatterFilter,
    page: u32,
    page_size: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageParams {
    page: u32,
    page_size: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CustodianRequest<'a> {
    user_id: &'a str,
}

// ── Matters ────────────────────────────────────────────────────────────

pub async fn list_matters(
    client: &IncydrClient,
    filter: &MatterFilter,
    page: u32,
    page_size: usize,
) -> Result<MattersPage> {
    let params = ListParams {
        filter,
        page,
        page_size,
    };
    client
        .get_with_query("/v1/legal-hold/matters", &params)
        .await
}

pub fn iter_all<'a>(
    client: &'a IncydrClient,
    filter: MatterFilter,
) -> impl Stream<Item = Result<Matter>> + 'a {
    let page_size = client.page_size().min(MAX_LEGAL_HOLD_PAGE_SIZE);
    paginate_by_number(1, page_size, move |page| {
        let filter = filter.clone();
        async move { Ok(list_matters(client, &filter, page, page_size).await?.matters) }
    })
}

pub async fn get_matter(client: &IncydrClient, matter_id: &str) -> Result<Matter> {
    client
        .get(&format!("/v1/legal-hold/matters/{matter_id}"))
        .await
}

pub async fn create_matter(client: &IncydrClient, matter: &NewMatter) -> Result<Matter> {
    let created: Matter = client.post("/v1/legal-hold/matters", matter).await?;
    tracing::info!(matter_id = %created.matter_id, "legal hold matter created");
    Ok(created)
}

pub async fn deactivate_matter(client: &IncydrClient, matter_id: &str) -> Result<()> {
    client
        .post_no_content(
            &format!("/v1/legal-hold/matters/{matter_id}/deactivate"),
            &serde_json::json!({}),
        )
        .await
}

pub async fn reactivate_matter(client: &IncydrClient, matter_id: &str) -> Result<()> {
    client
        .post_no_content(
            &format!("/v1/legal-hold/matters/{matter_id}/reactivate"),
            &serde_json::json!({}),
        )
        .await
}

// ── Custodians ─────────────────────────────────────────────────────────

pub async fn list_custodians(
    client: &IncydrClient,
    matter_id: &str,
    page: u32,
    page_size: usize,
) -> Result<CustodiansPage> {
    client
        .get_with_query(
            &format!("/v1/legal-hold/matters/{matter_id}/custodians"),
            &PageParams { page, page_size },
        )
        .await
}

pub fn iter_custodians<'a>(
    client: &'a IncydrClient,
    matter_id: &'a str,
) -> impl Stream<Item = Result<Custodian>> + 'a {
    let page_size = client.page_size().min(MAX_LEGAL_HOLD_PAGE_SIZE);
    paginate_by_number(1, page_size, move |page| async move {
        Ok(list_custodians(client, matter_id, page, page_size)
            .await?
            .custodians)
    })
}

pub async fn add_custodian(client: &IncydrClient, matter_id: &str, user_id: &str) -> Result<Custodian> {
    client
        .post(
            &format!("/v1/legal-hold/matters/{matter_id}/custodians"),
            &CustodianRequest { user_id },
        )
        .await
}

pub async fn remove_custodian(client: &IncydrClient, matter_id: &str, user_id: &str) -> Result<()> {
    client
        .post_no_content(
            &format!("/v1/legal-hold/matters/{matter_id}/custodians/remove"),
            &CustodianRequest { user_id },
        )
        .await
}
