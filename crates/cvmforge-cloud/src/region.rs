//! Region allow-list and resource id checks

use crate::error::{CloudError, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Regions accepted without a custom endpoint
pub const VALID_REGIONS: &[&str] = &[
    "ap-bangkok",
    "ap-beijing",
    "ap-chengdu",
    "ap-chongqing",
    "ap-guangzhou",
    "ap-guangzhou-open",
    "ap-hongkong",
    "ap-jakarta",
    "ap-shanghai",
    "ap-nanjing",
    "ap-shanghai-fsi",
    "ap-shenzhen-fsi",
    "ap-mumbai",
    "ap-seoul",
    "ap-singapore",
    "ap-tokyo",
    "eu-moscow",
    "eu-frankfurt",
    "na-ashburn",
    "na-siliconvalley",
    "na-toronto",
    "sa-saopaulo",
];

static RESOURCE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z]+)-[0-9a-z]{8}$").expect("valid resource id pattern"));

/// Check a region against the static allow-list
pub fn validate_region(region: &str) -> Result<()> {
    if VALID_REGIONS.contains(&region) {
        Ok(())
    } else {
        Err(CloudError::InvalidConfig(format!("unknown region: {}", region)))
    }
}

/// Whether `id` looks like `<prefix>-xxxxxxxx` (e.g. `img-0a1b2c3d`)
pub fn check_resource_id(prefix: &str, id: &str) -> bool {
    RESOURCE_ID
        .captures(id)
        .and_then(|c| c.get(1))
        .is_some_and(|m| m.as_str() == prefix)
}
