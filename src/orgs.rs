//! Organizations.

use serde::{Deserialize, Serialize};

use crate::client::IncydrClient;
use crate::error::{IncydrError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Org {
    pub org_guid: String,
    pub org_name: String,
    #[serde(default)]
    pub org_ext_ref: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub parent_org_guid: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub modification_date: Option<String>,
    #[serde(default)]
    pub deactivation_date: Option<String>,
    #[serde(default)]
    pub registration_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrgList {
    #[serde(default)]
    orgs: Vec<Org>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    active: bool,
}

/// Body for [`create_org`] and [`update_org`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgRequest {
    pub org_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_ext_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_org_guid: Option<String>,
}

/// Lists organizations; inactive ones only when `active` is false.
pub async fn list_orgs(client: &IncydrClient, active: bool) -> Result<Vec<Org>> {
    let list: OrgList = client
        .get_with_query("/v1/orgs", &ListParams { active })
        .await?;
    Ok(list.orgs)
}

pub async fn get_org(client: &IncydrClient, org_guid: &str) -> Result<Org> {
    client.get(&format!("/v1/orgs/{org_guid}")).await
}

/// Finds the active org named `name`.
///
/// # Errors
///
/// - `IncydrError::NotFound` / `IncydrError::Ambiguous` for zero or several
///   matches.
pub async fn get_org_by_name(client: &IncydrClient, name: &str) -> Result<Org> {
    let mut matches: Vec<Org> = list_orgs(client, true)
        .await?
        .into_iter()
        .filter(|o| o.org_name == name)
        .collect();
    match matches.len() {
        0 => Err(IncydrError::NotFound {
            kind: "org",
            name: name.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        count => Err(IncydrError::Ambiguous {
            kind: "org",
            name: name.to_string(),
            count,
        }),
    }
}

pub async fn create_org(client: &IncydrClient, org: &OrgRequest) -> Result<Org> {
    let created: Org = client.post("/v1/orgs", org).await?;
    tracing::info!(org_guid = %created.org_guid, "org created");
    Ok(created)
}

pub async fn update_org(client: &IncydrClient, org_guid: &str, org: &OrgRequest) -> Result<Org> {
    client.put(&format!("/v1/orgs/{org_guid}"), org).await
}

pub async fn activate(client: &IncydrClient, org_guid: &str) -> Result<()> {
    client
        .post_no_content(&format!("/v1/orgs/{org_guid}/activate"), &serde_json::json!({}))
        .await
}

pub async fn deactivate(client: &IncydrClient, org_guid: &str) -> Result<()> {
    client
        .post_no_content(&format!("/v1/orgs/{org_guid}/deactivate"), &serde_json::json!({}))
        .await
}
