//! Trusted activities: domains, Slack workspaces, account names and git
//! repositories whose activity is not scored as risk.

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::IncydrClient;
use crate::error::Result;
use crate::pagination::paginate_by_number;

/// Server-side maximum page size.
pub const MAX_TRUSTED_ACTIVITY_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Domain,
    Slack,
    AccountName,
    GitRepositoryUri,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedActivity {
    pub activity_id: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub value: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub principal_type: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub updated_by_username: Option<String>,
    #[serde(default)]
    pub updated_by_user_uid: Option<String>,
    #[serde(default)]
    pub activity_action_groups: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedActivitiesPage {
    #[serde(default)]
    pub trusted_activities: Vec<TrustedActivity>,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListParams {
    pg_num: u32,
    pg_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    activity_type: Option<ActivityType>,
}

pub async fn list_activities(
    client: &IncydrClient,
    activity_type: Option<ActivityType>,
    page: u32,
    page_size: usize,
) -> Result<TrustedActivitiesPage> {
    let params = ListParams {
        pg_num: page,
        pg_size: page_size,
        activity_type,
    };
    client
        .get_with_query("/v2/trusted-activities", &params)
        .await
}

pub fn iter_all(
    client: &IncydrClient,
    activity_type: Option<ActivityType>,
) -> impl Stream<Item = Result<TrustedActivity>> + '_ {
    let page_size = client.page_size().min(MAX_TRUSTED_ACTIVITY_PAGE_SIZE);
    paginate_by_number(1, page_size, move |page| async move {
        Ok(list_activities(client, activity_type, page, page_size)
            .await?
            .trusted_activities)
    })
}

pub async fn get_activity(client: &IncydrClient, activity_id: &str) -> Result<TrustedActivity> {
    client
        .get(&format!("/v2/trusted-activities/{activity_id}"))
        .await
}

pub async fn delete_activity(client: &IncydrClient, activity_id: &str) -> Result<()> {
    client
        .delete(&format!("/v2/trusted-activities/{activity_id}"))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_type_filter_is_upper_snake() {
        let params = ListParams {
            pg_num: 1,
            pg_size: 10,
            activity_type: Some(ActivityType::GitRepositoryUri),
        };
        assert_eq!(
            serde_urlencoded::to_string(&params).unwrap(),
            "pgNum=1&pgSize=10&activityType=GIT_REPOSITORY_URI"
        );
    }
}
