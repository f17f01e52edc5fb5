//! `access` section of a build file

use crate::error::{AuthError, Result};
use serde::{Deserialize, Serialize};

/// Role to assume, as written in the build file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumeRoleConfig {
    pub role_arn: Option<String>,
    pub session_name: Option<String>,
    /// Seconds, `0..=43200`; 0 or unset means 7200
    pub session_duration: Option<u64>,
}

/// Credentials, region and endpoints as configured by the user.
///
/// Every field is optional here; [`crate::CredentialResolver`] fills the
/// gaps from the environment and the shared profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub secret_id: Option<String>,
    pub secret_key: Option<String>,
    pub security_token: Option<String>,
    pub region: Option<String>,
    pub zone: Option<String>,
    pub cvm_endpoint: Option<String>,
    pub vpc_endpoint: Option<String>,
    pub org_endpoint: Option<String>,
    pub cam_endpoint: Option<String>,
    pub sts_endpoint: Option<String>,
    pub skip_region_validation: bool,
    pub assume_role: AssumeRoleConfig,
    pub profile: Option<String>,
    pub shared_credentials_dir: Option<String>,
}

impl AccessConfig {
    /// Static checks that need no credential lookup
    pub fn validate(&self) -> Result<()> {
        if non_empty(&self.cvm_endpoint).is_some() != non_empty(&self.vpc_endpoint).is_some() {
            return Err(AuthError::EndpointMismatch);
        }
        Ok(())
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            cvm: non_empty(&self.cvm_endpoint).map(str::to_string),
            vpc: non_empty(&self.vpc_endpoint).map(str::to_string),
            org: non_empty(&self.org_endpoint).map(str::to_string),
            cam: non_empty(&self.cam_endpoint).map(str::to_string),
            sts: non_empty(&self.sts_endpoint).map(str::to_string),
        }
    }
}

/// Custom per-service endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    pub cvm: Option<String>,
    pub vpc: Option<String>,
    pub org: Option<String>,
    pub cam: Option<String>,
    pub sts: Option<String>,
}

/// Trimmed value, `None` when unset or blank
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
