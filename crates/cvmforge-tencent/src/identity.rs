//! Security-token, CAM and organization services

use crate::client::{CAM, ORGANIZATION, STS, TencentClient};
use async_trait::async_trait;
use chrono::DateTime;
use cvmforge_auth::ServiceTarget;
use cvmforge_cloud::{CamApi, OrgApi, OrgMember, Result, StsApi, TemporaryCredential};
use serde::{Deserialize, Serialize};

pub struct StsClient {
    client: TencentClient,
}

impl StsClient {
    pub fn new(target: ServiceTarget<'_>) -> Result<Self> {
        Ok(Self {
            client: TencentClient::new(STS, target)?,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleRequest<'a> {
    role_arn: &'a str,
    role_session_name: &'a str,
    duration_seconds: u64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct AssumeRoleResponse {
    credentials: StsCredentials,
    /// Unix seconds
    expired_time: i64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct StsCredentials {
    tmp_secret_id: String,
    tmp_secret_key: String,
    token: String,
}

impl From<AssumeRoleResponse> for TemporaryCredential {
    fn from(resp: AssumeRoleResponse) -> Self {
        TemporaryCredential {
            secret_id: resp.credentials.tmp_secret_id,
            secret_key: resp.credentials.tmp_secret_key,
            token: resp.credentials.token,
            expires_at: (resp.expired_time > 0)
                .then(|| DateTime::from_timestamp(resp.expired_time, 0))
                .flatten(),
        }
    }
}

#[async_trait]
impl StsApi for StsClient {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
        duration_seconds: u64,
    ) -> Result<TemporaryCredential> {
        let request = AssumeRoleRequest {
            role_arn,
            role_session_name: session_name,
            duration_seconds,
        };
        let resp: AssumeRoleResponse = self.client.call("AssumeRole", &request).await?;
        Ok(resp.into())
    }
}

pub struct CamClient {
    client: TencentClient,
}

impl CamClient {
    pub fn new(target: ServiceTarget<'_>) -> Result<Self> {
        Ok(Self {
            client: TencentClient::new(CAM, target)?,
        })
    }
}

#[derive(Serialize)]
struct Empty {}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct UserAppId {
    uin: Option<String>,
}

#[async_trait]
impl CamApi for CamClient {
    async fn caller_uin(&self) -> Result<Option<String>> {
        let resp: UserAppId = self.client.call("GetUserAppId", &Empty {}).await?;
        Ok(resp.uin.filter(|uin| !uin.is_empty()))
    }
}

pub struct OrgClient {
    client: TencentClient,
}

impl OrgClient {
    pub fn new(target: ServiceTarget<'_>) -> Result<Self> {
        Ok(Self {
            client: TencentClient::new(ORGANIZATION, target)?,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Page {
    limit: u64,
    offset: u64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct Members {
    items: Vec<OrgMember>,
}

#[async_trait]
impl OrgApi for OrgClient {
    async fn describe_organization_members(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<OrgMember>> {
        let resp: Members = self
            .client
            .call("DescribeOrganizationMembers", &Page { limit, offset })
            .await?;
        Ok(resp.items)
    }
}
