#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cvmforge_auth::{
    Credential, FederationClient, RefreshedToken, ServiceConnector, ServiceTarget,
};
use cvmforge_cloud::{
    CamApi, CloudError, CreateImageRequest, CvmApi, Filter, Image, Instance, OrgApi, OrgMember,
    RunInstancesRequest, SecurityGroup, SharePermission, StsApi, Subnet, TemporaryCredential,
    Vpc, VpcApi, ZoneInfo,
};
use std::fs;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Temporary shared-credentials directory
pub struct ProfileDir {
    pub root: TempDir,
}

impl ProfileDir {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    pub fn write_credential(&self, profile: &str, json: &str) {
        fs::write(self.root.path().join(format!("{}.credential", profile)), json).unwrap();
    }

    pub fn write_configure(&self, profile: &str, region: &str) {
        fs::write(
            self.root.path().join(format!("{}.configure", profile)),
            format!(r#"{{"_sys_param": {{"region": "{}"}}}}"#, region),
        )
        .unwrap();
    }

    pub fn path(&self) -> String {
        self.root.path().to_string_lossy().into_owned()
    }
}

/// Federation client that must never be reached
pub struct NoFederation;

#[async_trait]
impl FederationClient for NoFederation {
    async fn refresh_user_token(
        &self,
        _refresh_token: &str,
        _open_id: &str,
        _site: &str,
    ) -> cvmforge_auth::Result<RefreshedToken> {
        panic!("unexpected federation call")
    }

    async fn get_temp_cred(
        &self,
        _access_token: &str,
        _site: &str,
    ) -> cvmforge_auth::Result<Credential> {
        panic!("unexpected federation call")
    }
}

/// Federation client handing out a fixed temporary credential
pub struct StaticFederation {
    pub exchanged: AtomicU32,
}

#[async_trait]
impl FederationClient for StaticFederation {
    async fn refresh_user_token(
        &self,
        _refresh_token: &str,
        _open_id: &str,
        _site: &str,
    ) -> cvmforge_auth::Result<RefreshedToken> {
        Ok(RefreshedToken::default())
    }

    async fn get_temp_cred(
        &self,
        access_token: &str,
        _site: &str,
    ) -> cvmforge_auth::Result<Credential> {
        assert_eq!(access_token, "oauth-access");
        self.exchanged.fetch_add(1, Ordering::SeqCst);
        Ok(Credential::new("AKIDfederated", "federated-key").with_token("federated-token"))
    }
}

/// Records every client the session asks for
#[derive(Default)]
pub struct FakeConnector {
    pub zones: Vec<String>,
    pub sts_expiry: Option<DateTime<Utc>>,
    pub built: Mutex<Vec<String>>,
    pub assume_calls: Arc<AtomicU32>,
    pub zone_calls: Arc<AtomicU32>,
}

impl FakeConnector {
    pub fn with_zones(zones: &[&str]) -> Self {
        Self {
            zones: zones.iter().map(|z| z.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn built(&self) -> Vec<String> {
        self.built.lock().unwrap().clone()
    }

    fn record(&self, service: &str, target: &ServiceTarget<'_>) {
        self.built.lock().unwrap().push(format!(
            "{}@{}:{}",
            service, target.region, target.credential.secret_id
        ));
    }
}

impl ServiceConnector for FakeConnector {
    fn cvm(&self, target: ServiceTarget<'_>) -> cvmforge_cloud::Result<Arc<dyn CvmApi>> {
        self.record("cvm", &target);
        Ok(Arc::new(ZoneOnlyCvm {
            zones: self.zones.clone(),
            calls: self.zone_calls.clone(),
        }))
    }

    fn vpc(&self, target: ServiceTarget<'_>) -> cvmforge_cloud::Result<Arc<dyn VpcApi>> {
        self.record("vpc", &target);
        Ok(Arc::new(Unused))
    }

    fn sts(&self, target: ServiceTarget<'_>) -> cvmforge_cloud::Result<Arc<dyn StsApi>> {
        self.record("sts", &target);
        Ok(Arc::new(FakeSts {
            expires_at: self.sts_expiry,
            calls: self.assume_calls.clone(),
        }))
    }

    fn cam(&self, target: ServiceTarget<'_>) -> cvmforge_cloud::Result<Arc<dyn CamApi>> {
        self.record("cam", &target);
        Ok(Arc::new(Unused))
    }

    fn org(&self, target: ServiceTarget<'_>) -> cvmforge_cloud::Result<Arc<dyn OrgApi>> {
        self.record("org", &target);
        Ok(Arc::new(Unused))
    }
}

pub struct FakeSts {
    expires_at: Option<DateTime<Utc>>,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl StsApi for FakeSts {
    async fn assume_role(
        &self,
        _role_arn: &str,
        session_name: &str,
        duration_seconds: u64,
    ) -> cvmforge_cloud::Result<TemporaryCredential> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TemporaryCredential {
            secret_id: format!("AKIDrole{}", n),
            secret_key: "role-key".into(),
            token: format!("{}:{}", session_name, duration_seconds),
            expires_at: self.expires_at,
        })
    }
}

fn unused<T>() -> cvmforge_cloud::Result<T> {
    Err(CloudError::UnexpectedResponse("not used in this test".into()))
}

pub struct ZoneOnlyCvm {
    zones: Vec<String>,
    calls: Arc<AtomicU32>,
}

#[async_trait]
impl CvmApi for ZoneOnlyCvm {
    async fn describe_zones(&self) -> cvmforge_cloud::Result<Vec<ZoneInfo>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .zones
            .iter()
            .map(|z| ZoneInfo {
                zone: z.clone(),
                zone_state: "AVAILABLE".into(),
                ..Default::default()
            })
            .collect())
    }

    async fn describe_instances(&self, _: &[String]) -> cvmforge_cloud::Result<Vec<Instance>> {
        unused()
    }

    async fn run_instances(&self, _: &RunInstancesRequest) -> cvmforge_cloud::Result<Vec<String>> {
        unused()
    }

    async fn terminate_instances(&self, _: &[String]) -> cvmforge_cloud::Result<()> {
        unused()
    }

    async fn describe_images(&self, _: &[Filter]) -> cvmforge_cloud::Result<Vec<Image>> {
        unused()
    }

    async fn describe_image_from_family(&self, _: &str) -> cvmforge_cloud::Result<Option<Image>> {
        unused()
    }

    async fn create_image(
        &self,
        _: &CreateImageRequest,
    ) -> cvmforge_cloud::Result<Option<String>> {
        unused()
    }

    async fn delete_images(&self, _: &[String]) -> cvmforge_cloud::Result<()> {
        unused()
    }

    async fn sync_images(&self, _: &[String], _: &[String]) -> cvmforge_cloud::Result<()> {
        unused()
    }

    async fn modify_image_share_permission(
        &self,
        _: &str,
        _: &[String],
        _: SharePermission,
    ) -> cvmforge_cloud::Result<()> {
        unused()
    }
}

pub struct Unused;

#[async_trait]
impl VpcApi for Unused {
    async fn describe_vpcs(&self, _: &[String]) -> cvmforge_cloud::Result<Vec<Vpc>> {
        unused()
    }

    async fn create_vpc(&self, _: &str, _: &str) -> cvmforge_cloud::Result<Vpc> {
        unused()
    }

    async fn delete_vpc(&self, _: &str) -> cvmforge_cloud::Result<()> {
        unused()
    }

    async fn describe_subnets(&self, _: &[String]) -> cvmforge_cloud::Result<Vec<Subnet>> {
        unused()
    }

    async fn create_subnet(
        &self,
        _: &str,
        _: &str,
        _: &str,
        _: &str,
    ) -> cvmforge_cloud::Result<Subnet> {
        unused()
    }

    async fn delete_subnet(&self, _: &str) -> cvmforge_cloud::Result<()> {
        unused()
    }

    async fn describe_security_groups(
        &self,
        _: &[String],
    ) -> cvmforge_cloud::Result<Vec<SecurityGroup>> {
        unused()
    }

    async fn create_security_group(
        &self,
        _: &str,
        _: &str,
    ) -> cvmforge_cloud::Result<SecurityGroup> {
        unused()
    }

    async fn allow_all_traffic(&self, _: &str) -> cvmforge_cloud::Result<()> {
        unused()
    }

    async fn delete_security_group(&self, _: &str) -> cvmforge_cloud::Result<()> {
        unused()
    }
}

#[async_trait]
impl CamApi for Unused {
    async fn caller_uin(&self) -> cvmforge_cloud::Result<Option<String>> {
        unused()
    }
}

#[async_trait]
impl OrgApi for Unused {
    async fn describe_organization_members(
        &self,
        _: u64,
        _: u64,
    ) -> cvmforge_cloud::Result<Vec<OrgMember>> {
        unused()
    }
}
