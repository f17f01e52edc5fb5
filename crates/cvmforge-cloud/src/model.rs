//! Request and response shapes shared by every API implementation
//!
//! Field names follow the provider's PascalCase JSON so the HTTP transport can
//! (de)serialize them as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `DescribeImages` filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TagSpecification {
    pub resource_type: String,
    pub tags: Vec<Tag>,
}

impl TagSpecification {
    /// Build a tag specification, or `None` when there are no tags
    pub fn from_map(resource_type: &str, tags: &BTreeMap<String, String>) -> Option<Self> {
        if tags.is_empty() {
            return None;
        }
        Some(Self {
            resource_type: resource_type.to_string(),
            tags: tags
                .iter()
                .map(|(key, value)| Tag {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Placement {
    pub zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SystemDisk {
    pub disk_type: String,
    pub disk_size: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataDisk {
    pub disk_type: String,
    pub disk_size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VirtualPrivateCloud {
    pub vpc_id: String,
    pub subnet_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InternetAccessible {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet_charge_type: Option<String>,
    pub internet_max_bandwidth_out: i64,
    pub public_ip_assigned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bandwidth_package_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_ids: Vec<String>,
}

/// `RunInstances` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RunInstancesRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    pub instance_charge_type: String,
    pub image_id: String,
    pub instance_type: String,
    pub system_disk: SystemDisk,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_disks: Vec<DataDisk>,
    pub virtual_private_cloud: VirtualPrivateCloud,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet_accessible: Option<InternetAccessible>,
    pub instance_name: String,
    pub login_settings: LoginSettings,
    pub security_group_ids: Vec<String>,
    pub client_token: String,
    pub host_name: String,
    pub user_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cam_role_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_specification: Vec<TagSpecification>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Instance {
    pub instance_id: String,
    pub instance_name: String,
    pub instance_state: String,
    pub latest_operation_state: Option<String>,
    pub private_ip_addresses: Vec<String>,
    pub public_ip_addresses: Option<Vec<String>>,
}

impl Instance {
    /// Whether the instance is in `state` and no operation is in flight
    pub fn is_settled_in(&self, state: &str) -> bool {
        self.instance_state == state
            && self.latest_operation_state.as_deref() != Some("OPERATING")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Snapshot {
    pub snapshot_id: String,
    pub disk_usage: String,
    pub disk_size: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Image {
    pub image_id: String,
    pub image_name: String,
    pub image_state: String,
    pub image_type: String,
    pub created_time: Option<String>,
    pub snapshot_set: Vec<Snapshot>,
}

impl Image {
    /// Creation time, when the provider reports one (public images have none)
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc))
    }

    /// Data disk snapshots carried by the image (the system disk snapshot is
    /// always present and excluded)
    pub fn data_disk_snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.snapshot_set
            .iter()
            .filter(|s| s.disk_usage == "DATA_DISK")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ZoneInfo {
    pub zone: String,
    pub zone_name: String,
    pub zone_state: String,
}

/// `CreateImage` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateImageRequest {
    pub instance_id: String,
    pub image_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_description: String,
    /// `"TRUE"` or `"FALSE"`
    pub force_poweroff: String,
    /// `"TRUE"` or `"FALSE"`
    pub sysprep: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tag_specification: Vec<TagSpecification>,
}

/// Flag encoding used by `CreateImage`
pub fn bool_flag(value: bool) -> String {
    if value { "TRUE" } else { "FALSE" }.to_string()
}

/// `ModifyImageSharePermission` permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SharePermission {
    Share,
    Cancel,
}

impl SharePermission {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePermission::Share => "SHARE",
            SharePermission::Cancel => "CANCEL",
        }
    }
}

impl std::fmt::Display for SharePermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temporary credential returned by role assumption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryCredential {
    pub secret_id: String,
    pub secret_key: String,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OrgMember {
    pub member_uin: Option<i64>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Vpc {
    pub vpc_id: String,
    pub vpc_name: String,
    pub cidr_block: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Subnet {
    pub subnet_id: String,
    pub subnet_name: String,
    pub vpc_id: String,
    pub cidr_block: String,
    pub zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SecurityGroup {
    pub security_group_id: String,
    pub security_group_name: String,
}
