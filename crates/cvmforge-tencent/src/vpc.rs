//! Network service

use crate::client::{TencentClient, VPC};
use async_trait::async_trait;
use cvmforge_auth::ServiceTarget;
use cvmforge_cloud::{Result, SecurityGroup, Subnet, Vpc, VpcApi};
use serde::{Deserialize, Serialize};

pub struct VpcClient {
    client: TencentClient,
}

impl VpcClient {
    pub fn new(target: ServiceTarget<'_>) -> Result<Self> {
        Ok(Self {
            client: TencentClient::new(VPC, target)?,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct VpcIds<'a> {
    vpc_ids: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateVpcRequest<'a> {
    vpc_name: &'a str,
    cidr_block: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct VpcId<'a> {
    vpc_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SubnetIds<'a> {
    subnet_ids: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateSubnetRequest<'a> {
    vpc_id: &'a str,
    subnet_name: &'a str,
    cidr_block: &'a str,
    zone: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SubnetId<'a> {
    subnet_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SecurityGroupIds<'a> {
    security_group_ids: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateSecurityGroupRequest<'a> {
    group_name: &'a str,
    group_description: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SecurityGroupId<'a> {
    security_group_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PolicyRequest<'a> {
    security_group_id: &'a str,
    security_group_policy_set: PolicySet,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PolicySet {
    ingress: Vec<Policy>,
    egress: Vec<Policy>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Policy {
    protocol: &'static str,
    cidr_block: &'static str,
    action: &'static str,
}

impl Policy {
    fn accept_all() -> Self {
        Self {
            protocol: "ALL",
            cidr_block: "0.0.0.0/0",
            action: "ACCEPT",
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct VpcSet {
    vpc_set: Vec<Vpc>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct CreatedVpc {
    vpc: Vpc,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct SubnetSet {
    subnet_set: Vec<Subnet>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct CreatedSubnet {
    subnet: Subnet,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct SecurityGroupSet {
    security_group_set: Vec<SecurityGroup>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct CreatedSecurityGroup {
    security_group: SecurityGroup,
}

#[derive(Deserialize, Default)]
struct Ack {}

#[async_trait]
impl VpcApi for VpcClient {
    async fn describe_vpcs(&self, vpc_ids: &[String]) -> Result<Vec<Vpc>> {
        let resp: VpcSet = self.client.call("DescribeVpcs", &VpcIds { vpc_ids }).await?;
        Ok(resp.vpc_set)
    }

    async fn create_vpc(&self, name: &str, cidr_block: &str) -> Result<Vpc> {
        let request = CreateVpcRequest {
            vpc_name: name,
            cidr_block,
        };
        let resp: CreatedVpc = self.client.call("CreateVpc", &request).await?;
        Ok(resp.vpc)
    }

    async fn delete_vpc(&self, vpc_id: &str) -> Result<()> {
        let _: Ack = self.client.call("DeleteVpc", &VpcId { vpc_id }).await?;
        Ok(())
    }

    async fn describe_subnets(&self, subnet_ids: &[String]) -> Result<Vec<Subnet>> {
        let resp: SubnetSet = self
            .client
            .call("DescribeSubnets", &SubnetIds { subnet_ids })
            .await?;
        Ok(resp.subnet_set)
    }

    async fn create_subnet(
        &self,
        vpc_id: &str,
        name: &str,
        cidr_block: &str,
        zone: &str,
    ) -> Result<Subnet> {
        let request = CreateSubnetRequest {
            vpc_id,
            subnet_name: name,
            cidr_block,
            zone,
        };
        let resp: CreatedSubnet = self.client.call("CreateSubnet", &request).await?;
        Ok(resp.subnet)
    }

    async fn delete_subnet(&self, subnet_id: &str) -> Result<()> {
        let _: Ack = self
            .client
            .call("DeleteSubnet", &SubnetId { subnet_id })
            .await?;
        Ok(())
    }

    async fn describe_security_groups(&self, group_ids: &[String]) -> Result<Vec<SecurityGroup>> {
        let request = SecurityGroupIds {
            security_group_ids: group_ids,
        };
        let resp: SecurityGroupSet = self
            .client
            .call("DescribeSecurityGroups", &request)
            .await?;
        Ok(resp.security_group_set)
    }

    async fn create_security_group(&self, name: &str, description: &str) -> Result<SecurityGroup> {
        let request = CreateSecurityGroupRequest {
            group_name: name,
            group_description: description,
        };
        let resp: CreatedSecurityGroup = self.client.call("CreateSecurityGroup", &request).await?;
        Ok(resp.security_group)
    }

    async fn allow_all_traffic(&self, group_id: &str) -> Result<()> {
        let request = PolicyRequest {
            security_group_id: group_id,
            security_group_policy_set: PolicySet {
                ingress: vec![Policy::accept_all()],
                egress: vec![Policy::accept_all()],
            },
        };
        let _: Ack = self
            .client
            .call("CreateSecurityGroupPolicies", &request)
            .await?;
        Ok(())
    }

    async fn delete_security_group(&self, group_id: &str) -> Result<()> {
        let request = SecurityGroupId {
            security_group_id: group_id,
        };
        let _: Ack = self.client.call("DeleteSecurityGroup", &request).await?;
        Ok(())
    }
}
