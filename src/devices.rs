//! Devices registered with the tenant.

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::client::IncydrClient;
use crate::error::Result;
use crate::pagination::paginate_by_number;

/// Server-side maximum page size.
pub const MAX_DEVICE_PAGE_SIZE: usize = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: String,
    #[serde(default)]
    pub legacy_device_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub os_hostname: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub blocked: Option<bool>,
    #[serde(default)]
    pub alert_state: Option<i64>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub legacy_user_id: Option<String>,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub org_guid: Option<String>,
    #[serde(default)]
    pub os_name: Option<String>,
    #[serde(default)]
    pub os_version: Option<String>,
    #[serde(default)]
    pub product_version: Option<String>,
    #[serde(default)]
    pub creation_date: Option<String>,
    #[serde(default)]
    pub last_connected: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesPage {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub total_count: u64,
}

/// Filters for [`list_devices`].
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_dir: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListParams<'a> {
    #[serde(flatten)]
    filter: &'a DeviceFilter,
    page: u32,
    page_size: usize,
}

/// One page (1-based) of devices.
pub async fn list_devices(
    client: &IncydrClient,
    filter: &DeviceFilter,
    page: u32,
    page_size: usize,
) -> Result<DevicesPage> {
    let params = ListParams {
        filter,
        page,
        page_size,
    };
    client.get_with_query("/v1/devices", &params).await
}

pub fn iter_all<'a>(
    client: &'a IncydrClient,
    filter: DeviceFilter,
) -> impl Stream<Item = Result<Device>> + 'a {
    let page_size = client.page_size().min(MAX_DEVICE_PAGE_SIZE);
    paginate_by_number(1, page_size, move |page| {
        let filter = filter.clone();
        async move { Ok(list_devices(client, &filter, page, page_size).await?.devices) }
    })
}

pub async fn get_device(client: &IncydrClient, device_id: &str) -> Result<Device> {
    client.get(&format!("/v1/devices/{device_id}")).await
}
