#![allow(dead_code)]

use async_trait::async_trait;
use cvmforge_builder::{BuildConfig, BuildContext};
use cvmforge_cloud::{
    CamApi, ClientProvider, CloudError, CreateImageRequest, CvmApi, Filter, Image, Instance,
    OrgApi, OrgMember, Result, RunInstancesRequest, SecurityGroup, SharePermission, Snapshot,
    Subnet, VpcApi, Vpc, WaitOptions, ZoneInfo,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SOURCE_REGION: &str = "ap-guangzhou";
pub const ZONE: &str = "ap-guangzhou-4";
pub const SOURCE_IMAGE: &str = "img-source01";
pub const CALLER_UIN: i64 = 100000000000;

#[derive(Default)]
pub struct CloudState {
    /// (region, image)
    pub images: Vec<(String, Image)>,
    pub instances: Vec<Instance>,
    pub vpcs: Vec<Vpc>,
    pub subnets: Vec<Subnet>,
    pub security_groups: Vec<SecurityGroup>,
    pub org_members: Vec<OrgMember>,
    pub caller_uin: Option<String>,
    pub launched: Vec<RunInstancesRequest>,
    pub shares: Vec<(String, Vec<String>, SharePermission)>,
    /// Every API call, as `Action@region`
    pub calls: Vec<String>,
    /// `Action` or `Action@region` that fails with a terminal error
    pub fail_on: Option<String>,
    next_id: u32,
}

impl CloudState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{:08}", prefix, self.next_id)
    }
}

/// In-memory cloud shared by every client handed out in one test
#[derive(Clone)]
pub struct FakeCloud {
    pub region: String,
    pub state: Arc<Mutex<CloudState>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        let cloud = Self {
            region: SOURCE_REGION.into(),
            state: Arc::default(),
        };
        cloud.state.lock().unwrap().images.push((
            SOURCE_REGION.into(),
            Image {
                image_id: SOURCE_IMAGE.into(),
                image_name: "TencentOS Server 3.1".into(),
                image_state: "NORMAL".into(),
                image_type: "PUBLIC_IMAGE".into(),
                snapshot_set: vec![Snapshot {
                    snapshot_id: "snap-system1".into(),
                    disk_usage: "SYSTEM_DISK".into(),
                    disk_size: 50,
                }],
                ..Default::default()
            },
        ));
        cloud
    }

    pub fn in_region(&self, region: &str) -> Self {
        Self {
            region: region.into(),
            state: self.state.clone(),
        }
    }

    pub fn with_org_members(self, uins: impl IntoIterator<Item = i64>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.caller_uin = Some(CALLER_UIN.to_string());
            state.org_members = uins
                .into_iter()
                .map(|uin| OrgMember {
                    member_uin: Some(uin),
                    name: format!("member-{}", uin),
                })
                .collect();
        }
        self
    }

    pub fn fail_on(&self, action: &str) {
        self.state.lock().unwrap().fail_on = Some(action.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, action: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with(&format!("{}@", action)))
            .collect()
    }

    pub fn images_in(&self, region: &str) -> Vec<Image> {
        self.state
            .lock()
            .unwrap()
            .images
            .iter()
            .filter(|(r, _)| r == region)
            .map(|(_, i)| i.clone())
            .collect()
    }

    fn record(&self, action: &str) -> Result<std::sync::MutexGuard<'_, CloudState>> {
        let mut state = self.state.lock().unwrap();
        let call = format!("{}@{}", action, self.region);
        let failing = state.fail_on.as_deref();
        let fails = failing == Some(action) || failing == Some(call.as_str());
        state.calls.push(call);
        if fails {
            return Err(CloudError::api("InvalidParameter", format!("{} rejected", action)));
        }
        Ok(state)
    }
}

#[async_trait]
impl CvmApi for FakeCloud {
    async fn describe_zones(&self) -> Result<Vec<ZoneInfo>> {
        self.record("DescribeZones")?;
        Ok(vec![ZoneInfo {
            zone: ZONE.into(),
            zone_name: "Guangzhou Zone 4".into(),
            zone_state: "AVAILABLE".into(),
        }])
    }

    async fn describe_instances(&self, instance_ids: &[String]) -> Result<Vec<Instance>> {
        let state = self.record("DescribeInstances")?;
        Ok(state
            .instances
            .iter()
            .filter(|i| instance_ids.contains(&i.instance_id))
            .cloned()
            .collect())
    }

    async fn run_instances(&self, request: &RunInstancesRequest) -> Result<Vec<String>> {
        let mut state = self.record("RunInstances")?;
        let id = state.next_id("ins");
        state.instances.push(Instance {
            instance_id: id.clone(),
            instance_name: request.instance_name.clone(),
            instance_state: "RUNNING".into(),
            latest_operation_state: Some("SUCCESS".into()),
            private_ip_addresses: vec!["10.0.8.2".into()],
            public_ip_addresses: None,
        });
        state.launched.push(request.clone());
        Ok(vec![id])
    }

    async fn terminate_instances(&self, instance_ids: &[String]) -> Result<()> {
        let mut state = self.record("TerminateInstances")?;
        state
            .instances
            .retain(|i| !instance_ids.contains(&i.instance_id));
        Ok(())
    }

    async fn describe_images(&self, filters: &[Filter]) -> Result<Vec<Image>> {
        let state = self.record("DescribeImages")?;
        Ok(state
            .images
            .iter()
            .filter(|(region, _)| *region == self.region)
            .map(|(_, image)| image)
            .filter(|image| {
                filters.iter().all(|f| match f.name.as_str() {
                    "image-id" => f.values.contains(&image.image_id),
                    "image-name" => f.values.contains(&image.image_name),
                    "image-type" => f.values.contains(&image.image_type),
                    _ => true,
                })
            })
            .cloned()
            .collect())
    }

    async fn describe_image_from_family(&self, _family: &str) -> Result<Option<Image>> {
        self.record("DescribeImageFromFamily")?;
        Ok(None)
    }

    async fn create_image(&self, request: &CreateImageRequest) -> Result<Option<String>> {
        let mut state = self.record("CreateImage")?;
        let id = state.next_id("img");
        state.images.push((
            self.region.clone(),
            Image {
                image_id: id.clone(),
                image_name: request.image_name.clone(),
                image_state: "NORMAL".into(),
                image_type: "PRIVATE_IMAGE".into(),
                ..Default::default()
            },
        ));
        Ok(Some(id))
    }

    async fn delete_images(&self, image_ids: &[String]) -> Result<()> {
        let mut state = self.record("DeleteImages")?;
        state
            .images
            .retain(|(_, image)| !image_ids.contains(&image.image_id));
        Ok(())
    }

    async fn sync_images(
        &self,
        image_ids: &[String],
        destination_regions: &[String],
    ) -> Result<()> {
        let mut state = self.record("SyncImages")?;
        let sources: Vec<Image> = state
            .images
            .iter()
            .filter(|(_, image)| image_ids.contains(&image.image_id))
            .map(|(_, image)| image.clone())
            .collect();
        for region in destination_regions {
            for source in &sources {
                let id = state.next_id("img");
                state.images.push((
                    region.clone(),
                    Image {
                        image_id: id,
                        ..source.clone()
                    },
                ));
            }
        }
        Ok(())
    }

    async fn modify_image_share_permission(
        &self,
        image_id: &str,
        account_ids: &[String],
        permission: SharePermission,
    ) -> Result<()> {
        let mut state = self.record("ModifyImageSharePermission")?;
        state
            .shares
            .push((image_id.to_string(), account_ids.to_vec(), permission));
        Ok(())
    }
}

#[async_trait]
impl VpcApi for FakeCloud {
    async fn describe_vpcs(&self, vpc_ids: &[String]) -> Result<Vec<Vpc>> {
        let state = self.record("DescribeVpcs")?;
        Ok(state
            .vpcs
            .iter()
            .filter(|v| vpc_ids.contains(&v.vpc_id))
            .cloned()
            .collect())
    }

    async fn create_vpc(&self, name: &str, cidr_block: &str) -> Result<Vpc> {
        let mut state = self.record("CreateVpc")?;
        let vpc = Vpc {
            vpc_id: state.next_id("vpc"),
            vpc_name: name.into(),
            cidr_block: cidr_block.into(),
        };
        state.vpcs.push(vpc.clone());
        Ok(vpc)
    }

    async fn delete_vpc(&self, vpc_id: &str) -> Result<()> {
        let mut state = self.record("DeleteVpc")?;
        state.vpcs.retain(|v| v.vpc_id != vpc_id);
        Ok(())
    }

    async fn describe_subnets(&self, subnet_ids: &[String]) -> Result<Vec<Subnet>> {
        let state = self.record("DescribeSubnets")?;
        Ok(state
            .subnets
            .iter()
            .filter(|s| subnet_ids.contains(&s.subnet_id))
            .cloned()
            .collect())
    }

    async fn create_subnet(
        &self,
        vpc_id: &str,
        name: &str,
        cidr_block: &str,
        zone: &str,
    ) -> Result<Subnet> {
        let mut state = self.record("CreateSubnet")?;
        let subnet = Subnet {
            subnet_id: state.next_id("subnet"),
            subnet_name: name.into(),
            vpc_id: vpc_id.into(),
            cidr_block: cidr_block.into(),
            zone: zone.into(),
        };
        state.subnets.push(subnet.clone());
        Ok(subnet)
    }

    async fn delete_subnet(&self, subnet_id: &str) -> Result<()> {
        let mut state = self.record("DeleteSubnet")?;
        state.subnets.retain(|s| s.subnet_id != subnet_id);
        Ok(())
    }

    async fn describe_security_groups(&self, group_ids: &[String]) -> Result<Vec<SecurityGroup>> {
        let state = self.record("DescribeSecurityGroups")?;
        Ok(state
            .security_groups
            .iter()
            .filter(|g| group_ids.contains(&g.security_group_id))
            .cloned()
            .collect())
    }

    async fn create_security_group(
        &self,
        name: &str,
        _description: &str,
    ) -> Result<SecurityGroup> {
        let mut state = self.record("CreateSecurityGroup")?;
        let group = SecurityGroup {
            security_group_id: state.next_id("sg"),
            security_group_name: name.into(),
        };
        state.security_groups.push(group.clone());
        Ok(group)
    }

    async fn allow_all_traffic(&self, _group_id: &str) -> Result<()> {
        self.record("CreateSecurityGroupPolicies")?;
        Ok(())
    }

    async fn delete_security_group(&self, group_id: &str) -> Result<()> {
        let mut state = self.record("DeleteSecurityGroup")?;
        state
            .security_groups
            .retain(|g| g.security_group_id != group_id);
        Ok(())
    }
}

#[async_trait]
impl CamApi for FakeCloud {
    async fn caller_uin(&self) -> Result<Option<String>> {
        let state = self.record("GetUserAppId")?;
        Ok(state.caller_uin.clone())
    }
}

#[async_trait]
impl OrgApi for FakeCloud {
    async fn describe_organization_members(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<OrgMember>> {
        let state = self.record("DescribeOrganizationMembers")?;
        Ok(state
            .org_members
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// Hands out views of one [`FakeCloud`]
pub struct FakeProvider {
    pub cloud: FakeCloud,
}

#[async_trait]
impl ClientProvider for FakeProvider {
    fn region(&self) -> &str {
        &self.cloud.region
    }

    async fn cvm(&self) -> Result<Arc<dyn CvmApi>> {
        Ok(Arc::new(self.cloud.clone()))
    }

    async fn cvm_in_region(&self, region: &str) -> Result<Arc<dyn CvmApi>> {
        Ok(Arc::new(self.cloud.in_region(region)))
    }

    async fn vpc(&self) -> Result<Arc<dyn VpcApi>> {
        Ok(Arc::new(self.cloud.clone()))
    }

    async fn cam(&self) -> Result<Arc<dyn CamApi>> {
        Ok(Arc::new(self.cloud.clone()))
    }

    async fn org(&self) -> Result<Arc<dyn OrgApi>> {
        Ok(Arc::new(self.cloud.clone()))
    }
}

/// A prepared config that passes every check
pub fn build_config() -> BuildConfig {
    let mut config = BuildConfig::default();
    config.access.region = Some(SOURCE_REGION.into());
    config.access.zone = Some(ZONE.into());
    config.run.source_image_id = Some(SOURCE_IMAGE.into());
    config.run.instance_type = "S5.MEDIUM4".into();
    config.run.login.key_id = Some("skey-12345678".into());
    config.image.image_name = "golden-base".into();
    config
}

pub fn context(cloud: &FakeCloud, mut config: BuildConfig) -> BuildContext {
    config.prepare().unwrap();
    BuildContext::new(
        config,
        Arc::new(FakeProvider {
            cloud: cloud.clone(),
        }),
        ZONE,
    )
    .with_wait(WaitOptions::new(Duration::from_secs(5), Duration::from_secs(60)))
}

pub fn image(region: &str, id: &str, name: &str) -> (String, Image) {
    (
        region.to_string(),
        Image {
            image_id: id.into(),
            image_name: name.into(),
            image_state: "NORMAL".into(),
            ..Default::default()
        },
    )
}

pub fn member_uins(count: i64) -> Vec<i64> {
    (0..count).map(|n| CALLER_UIN + n).collect()
}
