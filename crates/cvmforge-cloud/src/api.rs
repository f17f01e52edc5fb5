//! Service traits for the cloud API
//!
//! Each trait corresponds to one provider service. Implementations are free to
//! talk HTTP, replay fixtures, or keep everything in memory; the build engine
//! only ever sees these traits.

use crate::error::Result;
use crate::model::{
    CreateImageRequest, Filter, Image, Instance, OrgMember, RunInstancesRequest, SecurityGroup,
    SharePermission, Subnet, TemporaryCredential, Vpc, ZoneInfo,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Compute service: instance and image lifecycle
#[async_trait]
pub trait CvmApi: Send + Sync {
    async fn describe_zones(&self) -> Result<Vec<ZoneInfo>>;

    async fn describe_instances(&self, instance_ids: &[String]) -> Result<Vec<Instance>>;

    /// Returns the ids of the launched instances
    async fn run_instances(&self, request: &RunInstancesRequest) -> Result<Vec<String>>;

    async fn terminate_instances(&self, instance_ids: &[String]) -> Result<()>;

    async fn describe_images(&self, filters: &[Filter]) -> Result<Vec<Image>>;

    async fn describe_image_from_family(&self, family: &str) -> Result<Option<Image>>;

    /// Returns the new image id when the provider reports it synchronously
    async fn create_image(&self, request: &CreateImageRequest) -> Result<Option<String>>;

    async fn delete_images(&self, image_ids: &[String]) -> Result<()>;

    async fn sync_images(&self, image_ids: &[String], destination_regions: &[String])
    -> Result<()>;

    async fn modify_image_share_permission(
        &self,
        image_id: &str,
        account_ids: &[String],
        permission: SharePermission,
    ) -> Result<()>;
}

/// Network service: VPC, subnet, security group
#[async_trait]
pub trait VpcApi: Send + Sync {
    async fn describe_vpcs(&self, vpc_ids: &[String]) -> Result<Vec<Vpc>>;

    async fn create_vpc(&self, name: &str, cidr_block: &str) -> Result<Vpc>;

    async fn delete_vpc(&self, vpc_id: &str) -> Result<()>;

    async fn describe_subnets(&self, subnet_ids: &[String]) -> Result<Vec<Subnet>>;

    async fn create_subnet(
        &self,
        vpc_id: &str,
        name: &str,
        cidr_block: &str,
        zone: &str,
    ) -> Result<Subnet>;

    async fn delete_subnet(&self, subnet_id: &str) -> Result<()>;

    async fn describe_security_groups(&self, group_ids: &[String]) -> Result<Vec<SecurityGroup>>;

    async fn create_security_group(&self, name: &str, description: &str)
    -> Result<SecurityGroup>;

    /// Install accept-all ingress and egress policies
    async fn allow_all_traffic(&self, group_id: &str) -> Result<()>;

    async fn delete_security_group(&self, group_id: &str) -> Result<()>;
}

/// Security-token service
#[async_trait]
pub trait StsApi: Send + Sync {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
        duration_seconds: u64,
    ) -> Result<TemporaryCredential>;
}

/// Identity service
#[async_trait]
pub trait CamApi: Send + Sync {
    /// The caller's own account uin, when the provider reports it
    async fn caller_uin(&self) -> Result<Option<String>>;
}

/// Organization service
#[async_trait]
pub trait OrgApi: Send + Sync {
    async fn describe_organization_members(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<OrgMember>>;
}

/// Source of authorized service clients for one build
#[async_trait]
pub trait ClientProvider: Send + Sync {
    /// Region the memoized clients talk to
    fn region(&self) -> &str;

    async fn cvm(&self) -> Result<Arc<dyn CvmApi>>;

    /// A fresh compute client bound to another region (never memoized)
    async fn cvm_in_region(&self, region: &str) -> Result<Arc<dyn CvmApi>>;

    async fn vpc(&self) -> Result<Arc<dyn VpcApi>>;

    async fn cam(&self) -> Result<Arc<dyn CamApi>>;

    async fn org(&self) -> Result<Arc<dyn OrgApi>>;
}
