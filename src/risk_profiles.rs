//! User risk profiles: HR attributes, notes, employment dates and cloud
//! aliases for each user.

use chrono::{Datelike, NaiveDate};
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::client::IncydrClient;
use crate::error::{IncydrError, Result};
use crate::pagination::paginate_by_number;

/// Server-side maximum page size.
pub const MAX_RISK_PROFILE_PAGE_SIZE: usize = 500;

/// Calendar date as the risk profile API encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for ProfileDate {
    fn from(date: NaiveDate) -> Self {
        ProfileDate {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

impl ProfileDate {
    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfile {
    pub user_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default)]
    pub manager_username: Option<String>,
    #[serde(default)]
    pub manager_display_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub division: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub deleted: Option<bool>,
    #[serde(default)]
    pub support_user: Option<bool>,
    #[serde(default)]
    pub start_date: Option<ProfileDate>,
    #[serde(default)]
    pub end_date: Option<ProfileDate>,
    #[serde(default)]
    pub cloud_aliases: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskProfilesPage {
    #[serde(default)]
    pub user_risk_profiles: Vec<RiskProfile>,
    #[serde(default)]
    pub total_count: u64,
}

/// Filters for [`list_profiles`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Change to a date field: leave it, set it, or clear it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateChange {
    #[default]
    Keep,
    Set(NaiveDate),
    Clear,
}

/// Fields changed by [`update_profile`].
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// `Some("")` clears the notes.
    pub notes: Option<String>,
    pub start_date: DateChange,
    pub end_date: DateChange,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PatchBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<Option<ProfileDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_date: Option<Option<ProfileDate>>,
}

/// This endpoint takes snake_case query parameters.
#[derive(Serialize)]
struct ListParams<'a> {
    #[serde(flatten)]
    filter: &'a ProfileFilter,
    page: u32,
    page_size: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CloudAliasRequest<'a> {
    user_id: &'a str,
    cloud_aliases: &'a [String],
}

fn date_field(change: DateChange) -> Option<Option<ProfileDate>> {
    match change {
        DateChange::Keep => None,
        DateChange::Set(date) => Some(Some(date.into())),
        DateChange::Clear => Some(None),
    }
}

pub async fn list_profiles(
    client: &IncydrClient,
    filter: &ProfileFilter,
    page: u32,
    page_size: usize,
) -> Result<RiskProfilesPage> {
    let params = ListParams {
        filter,
        page,
        page_size,
    };
    client
        .get_with_query("/v1/user-risk-profiles", &params)
        .await
}

pub fn iter_all<'a>(
    client: &'a IncydrClient,
    filter: ProfileFilter,
) -> impl Stream<Item = Result<RiskProfile>> + 'a {
    let page_size = client.page_size().min(MAX_RISK_PROFILE_PAGE_SIZE);
    paginate_by_number(1, page_size, move |page| {
        let filter = filter.clone();
        async move {
            Ok(list_profiles(client, &filter, page, page_size)
                .await?
                .user_risk_profiles)
        }
    })
}

pub async fn get_profile(client: &IncydrClient, user_id: &str) -> Result<RiskProfile> {
    client
        .get(&format!("/v1/user-risk-profiles/{user_id}"))
        .await
}

/// Updates notes and employment dates. Only fields named in `paths` are
/// touched server-side, so unchanged fields keep their value.
pub async fn update_profile(
    client: &IncydrClient,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<RiskProfile> {
    let body = PatchBody {
        notes: update.notes.as_deref(),
        start_date: date_field(update.start_date),
        end_date: date_field(update.end_date),
    };
    let mut paths: Vec<(&str, &str)> = Vec::new();
    if body.notes.is_some() {
        paths.push(("paths", "notes"));
    }
    if body.start_date.is_some() {
        paths.push(("paths", "startDate"));
    }
    if body.end_date.is_some() {
        paths.push(("paths", "endDate"));
    }
    if paths.is_empty() {
        return Err(IncydrError::Validation(
            "nothing to update: give notes, a start date or an end date".to_string(),
        ));
    }
    client
        .patch_with_query(&format!("/v1/user-risk-profiles/{user_id}"), &paths, &body)
        .await
}

pub async fn add_cloud_aliases(client: &IncydrClient, user_id: &str, aliases: &[String]) -> Result<()> {
    client
        .post_no_content(
            &format!("/v1/user-risk-profiles/{user_id}/add-cloud-aliases"),
            &CloudAliasRequest {
                user_id,
                cloud_aliases: aliases,
            },
        )
        .await
}

pub async fn remove_cloud_aliases(
    client: &IncydrClient,
    user_id: &str,
    aliases: &[String],
) -> Result<()> {
    client
        .post_no_content(
            &format!("/v1/user-risk-profiles/{user_id}/delete-cloud-aliases"),
            &CloudAliasRequest {
                user_id,
                cloud_aliases: aliases,
            },
        )
        .await
}
