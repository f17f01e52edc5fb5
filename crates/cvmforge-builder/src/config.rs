//! Build file
//!
//! ```yaml
//! access:
//!   region: ap-guangzhou
//!   zone: ap-guangzhou-4
//! run:
//!   source_image_name: TencentOS Server 3.1 (TK4)
//!   instance_type: S5.MEDIUM4
//!   login:
//!     key_id: skey-12345678
//! image:
//!   image_name: golden-base
//!   image_copy_regions: [ap-shanghai]
//! ```

use crate::error::{BuildError, Result};
use crate::lookup::ImageQuery;
use cvmforge_auth::AccessConfig;
use cvmforge_cloud::{VALID_REGIONS, check_resource_id};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub const DEFAULT_DISK_TYPE: &str = "CLOUD_PREMIUM";
pub const DEFAULT_DISK_SIZE: i64 = 50;
pub const DEFAULT_VPC_CIDR: &str = "10.0.0.0/16";
pub const DEFAULT_SUBNET_CIDR: &str = "10.0.8.0/24";
pub const DEFAULT_INSTANCE_CHARGE_TYPE: &str = "POSTPAID_BY_HOUR";

/// Disk types accepted for system and data disks
pub const VALID_DISK_TYPES: &[&str] = &[
    "LOCAL_BASIC",
    "LOCAL_SSD",
    "CLOUD_BASIC",
    "CLOUD_SSD",
    "CLOUD_PREMIUM",
];

pub const VALID_INTERNET_CHARGE_TYPES: &[&str] = &[
    "TRAFFIC_POSTPAID_BY_HOUR",
    "BANDWIDTH_POSTPAID_BY_HOUR",
    "BANDWIDTH_PACKAGE",
];

const MAX_HOST_NAME_LEN: usize = 15;
const MAX_IMAGE_TEXT_LEN: usize = 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub access: AccessConfig,
    pub run: RunConfig,
    pub image: ImageConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataDiskConfig {
    pub disk_type: String,
    pub disk_size: i64,
    pub disk_snapshot_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    pub password: Option<String>,
    pub key_id: Option<String>,
}

/// Temporary instance and its network
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub source_image_id: Option<String>,
    pub source_image_name: Option<String>,
    pub source_image_filter: Option<ImageQuery>,
    pub instance_type: String,
    pub instance_charge_type: String,
    pub instance_name: String,
    pub host_name: String,
    pub disk_type: String,
    pub disk_size: i64,
    pub data_disks: Vec<DataDiskConfig>,
    pub vpc_id: Option<String>,
    pub vpc_name: String,
    pub cidr_block: String,
    pub subnet_id: Option<String>,
    pub subnet_name: String,
    pub subnet_cidr_block: String,
    pub security_group_id: Option<String>,
    pub security_group_name: String,
    pub associate_public_ip_address: bool,
    pub internet_charge_type: Option<String>,
    pub internet_max_bandwidth_out: i64,
    pub bandwidth_package_id: Option<String>,
    pub user_data: Option<String>,
    pub user_data_file: Option<String>,
    pub cam_role_name: Option<String>,
    pub run_tags: BTreeMap<String, String>,
    pub login: LoginConfig,
}

/// Captured image and its distribution
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    pub image_name: String,
    pub image_description: String,
    pub force_poweroff: bool,
    pub sysprep: bool,
    pub image_copy_regions: Vec<String>,
    pub image_share_accounts: Vec<String>,
    pub share_org_members: bool,
    pub image_tags: BTreeMap<String, String>,
    pub skip_create_image: bool,
}

impl BuildConfig {
    /// Read a YAML or JSON build file, chosen by extension
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(BuildError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Err(BuildError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Apply defaults and collect every validation problem
    pub fn prepare(&mut self) -> Result<()> {
        let generated = generated_name();
        let mut problems = Vec::new();

        if let Err(e) = self.access.validate() {
            problems.push(e.to_string());
        }
        self.run.prepare(&generated, &mut problems);
        self.image
            .prepare(self.access.skip_region_validation, &mut problems);

        if problems.is_empty() {
            Ok(())
        } else {
            Err(BuildError::Config(problems))
        }
    }
}

/// `cvmforge_<8 hex>`, shared by every name left unset
fn generated_name() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("cvmforge_{}", &id[..8])
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl RunConfig {
    fn prepare(&mut self, generated: &str, problems: &mut Vec<String>) {
        match &self.source_image_id {
            Some(id) if !id.is_empty() => {
                if !check_resource_id("img", id) {
                    problems.push("source_image_id wrong format".into());
                }
            }
            _ if is_set(&self.source_image_name) => {}
            _ => match &self.source_image_filter {
                Some(query) => problems.extend(query.problems()),
                None => problems.push(
                    "source_image_id, source_image_name or source_image_filter must be specified"
                        .into(),
                ),
            },
        }

        if self.instance_type.is_empty() {
            problems.push("instance_type must be specified".into());
        }

        if is_set(&self.user_data) && is_set(&self.user_data_file) {
            problems.push("only one of user_data or user_data_file can be specified".into());
        } else if let Some(file) = self.user_data_file.as_deref().filter(|f| !f.is_empty()) {
            if !Path::new(file).exists() {
                problems.push(format!("user_data_file {} does not exist", file));
            }
        }

        for (field, value, prefix) in [
            ("vpc_id", &self.vpc_id, "vpc"),
            ("subnet_id", &self.subnet_id, "subnet"),
            ("security_group_id", &self.security_group_id, "sg"),
        ] {
            if let Some(id) = value.as_deref().filter(|v| !v.is_empty()) {
                if !check_resource_id(prefix, id) {
                    problems.push(format!("{} wrong format", field));
                }
            }
        }

        let custom_vpc = is_set(&self.vpc_id) || !self.cidr_block.is_empty();
        if custom_vpc && !is_set(&self.subnet_id) && self.subnet_cidr_block.is_empty() {
            problems.push(
                "if vpc cidr_block is specified, then subnet_cidr_block must also be specified"
                    .into(),
            );
        }

        if !is_set(&self.vpc_id) {
            if self.vpc_name.is_empty() {
                self.vpc_name = generated.to_string();
            }
            if self.cidr_block.is_empty() {
                self.cidr_block = DEFAULT_VPC_CIDR.to_string();
            }
            if is_set(&self.subnet_id) {
                problems.push("can't set subnet_id without set vpc_id".into());
            }
        }

        if !is_set(&self.subnet_id) {
            if self.subnet_name.is_empty() {
                self.subnet_name = generated.to_string();
            }
            if self.subnet_cidr_block.is_empty() {
                self.subnet_cidr_block = DEFAULT_SUBNET_CIDR.to_string();
            }
        }

        if !is_set(&self.security_group_id) && self.security_group_name.is_empty() {
            self.security_group_name = generated.to_string();
        }

        if self.disk_type.is_empty() {
            self.disk_type = DEFAULT_DISK_TYPE.to_string();
        } else if !VALID_DISK_TYPES.contains(&self.disk_type.as_str()) {
            problems.push(format!("specified disk_type({}) is invalid", self.disk_type));
        }
        if self.disk_size <= 0 {
            self.disk_size = DEFAULT_DISK_SIZE;
        }

        for disk in &self.data_disks {
            if !VALID_DISK_TYPES.contains(&disk.disk_type.as_str()) {
                problems.push(format!("specified data disk_type({}) is invalid", disk.disk_type));
            }
        }

        if let Some(charge) = self.internet_charge_type.as_deref().filter(|c| !c.is_empty()) {
            if !VALID_INTERNET_CHARGE_TYPES.contains(&charge) {
                problems.push(format!("specified internet_charge_type({}) is invalid", charge));
            } else if charge == "BANDWIDTH_PACKAGE" && !is_set(&self.bandwidth_package_id) {
                problems.push(
                    "bandwidth_package_id is required when internet_charge_type is BANDWIDTH_PACKAGE"
                        .into(),
                );
            }
        }

        if self.associate_public_ip_address && self.internet_max_bandwidth_out <= 0 {
            self.internet_max_bandwidth_out = 1;
        }

        if self.instance_charge_type.is_empty() {
            self.instance_charge_type = DEFAULT_INSTANCE_CHARGE_TYPE.to_string();
        }

        if self.instance_name.is_empty() {
            self.instance_name = generated.to_string();
        }
        if self.host_name.is_empty() {
            self.host_name = self.instance_name.clone();
        }
        self.host_name = self
            .host_name
            .chars()
            .take(MAX_HOST_NAME_LEN)
            .collect::<String>()
            .replace('_', "-");
    }
}

impl ImageConfig {
    fn prepare(&mut self, skip_region_validation: bool, problems: &mut Vec<String>) {
        if self.skip_create_image {
            return;
        }

        if self.image_name.is_empty() {
            problems.push("image_name must be specified".into());
        } else if self.image_name.chars().count() > MAX_IMAGE_TEXT_LEN {
            problems.push("image_name length should not exceed 60 characters".into());
        }

        if self.image_description.chars().count() > MAX_IMAGE_TEXT_LEN {
            problems.push("image_description length should not exceed 60 characters".into());
        }

        let mut seen = BTreeSet::new();
        let mut regions = Vec::with_capacity(self.image_copy_regions.len());
        for region in self.image_copy_regions.drain(..) {
            if !seen.insert(region.clone()) {
                continue;
            }
            if !skip_region_validation && !VALID_REGIONS.contains(&region.as_str()) {
                problems.push(format!("unknown region: {}", region));
                continue;
            }
            regions.push(region);
        }
        self.image_copy_regions = regions;
    }
}
