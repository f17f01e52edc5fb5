//! VPC, subnet and security group: reuse a configured one or create a
//! temporary one. Only what was created here is deleted again.

use super::{StageExt, conclude, not_found, report_cleanup};
use crate::context::BuildContext;
use crate::error::StepError;
use crate::runner::{Step, StepAction};
use async_trait::async_trait;

const SECURITY_GROUP_DESCRIPTION: &str = "temporary security group for cvmforge builds";

#[derive(Debug, Default)]
pub struct ConfigVpc {
    created: bool,
}

#[async_trait]
impl Step for ConfigVpc {
    fn name(&self) -> &'static str {
        "config-vpc"
    }

    async fn run(&mut self, ctx: &mut BuildContext) -> StepAction {
        conclude(self.configure(ctx).await)
    }

    async fn cleanup(&mut self, ctx: &BuildContext) {
        if !self.created {
            return;
        }
        let Some(vpc_id) = ctx.vpc_id.get() else {
            return;
        };

        tracing::info!("deleting vpc {}", vpc_id);
        let result = async {
            let vpc = ctx.clients.vpc().await?;
            let vpc = vpc.as_ref();
            ctx.retry.run(move || vpc.delete_vpc(vpc_id)).await
        }
        .await;
        report_cleanup(&format!("vpc({})", vpc_id), result);
    }
}

impl ConfigVpc {
    async fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), StepError> {
        let stage = "config vpc";
        let vpc = ctx.clients.vpc().await.stage(stage)?;
        let vpc = vpc.as_ref();
        let run = &ctx.config.run;

        if let Some(vpc_id) = run.vpc_id.as_deref().filter(|id| !id.is_empty()) {
            let ids = [vpc_id.to_string()];
            let ids = &ids[..];
            let found = ctx
                .retry
                .run(move || vpc.describe_vpcs(ids))
                .await
                .stage(stage)?;
            if found.is_empty() {
                return Err(StepError::new(stage, not_found(format!("vpc({})", vpc_id))));
            }
            tracing::info!("using existing vpc {}", vpc_id);
            let vpc_id = vpc_id.to_string();
            ctx.vpc_id.set(vpc_id);
            return Ok(());
        }

        let (name, cidr) = (run.vpc_name.as_str(), run.cidr_block.as_str());
        tracing::info!("creating vpc {} ({})", name, cidr);
        let created = ctx
            .retry
            .run(move || vpc.create_vpc(name, cidr))
            .await
            .stage(stage)?;
        tracing::info!("vpc {} created", created.vpc_id);
        self.created = true;
        ctx.vpc_id.set(created.vpc_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConfigSubnet {
    created: bool,
}

#[async_trait]
impl Step for ConfigSubnet {
    fn name(&self) -> &'static str {
        "config-subnet"
    }

    async fn run(&mut self, ctx: &mut BuildContext) -> StepAction {
        conclude(self.configure(ctx).await)
    }

    async fn cleanup(&mut self, ctx: &BuildContext) {
        if !self.created {
            return;
        }
        let Some(subnet_id) = ctx.subnet_id.get() else {
            return;
        };

        tracing::info!("deleting subnet {}", subnet_id);
        let result = async {
            let vpc = ctx.clients.vpc().await?;
            let vpc = vpc.as_ref();
            ctx.retry.run(move || vpc.delete_subnet(subnet_id)).await
        }
        .await;
        report_cleanup(&format!("subnet({})", subnet_id), result);
    }
}

impl ConfigSubnet {
    async fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), StepError> {
        let stage = "config subnet";
        let vpc = ctx.clients.vpc().await.stage(stage)?;
        let vpc = vpc.as_ref();
        let run = &ctx.config.run;

        if let Some(subnet_id) = run.subnet_id.as_deref().filter(|id| !id.is_empty()) {
            let ids = [subnet_id.to_string()];
            let ids = &ids[..];
            let found = ctx
                .retry
                .run(move || vpc.describe_subnets(ids))
                .await
                .stage(stage)?;
            if found.is_empty() {
                return Err(StepError::new(
                    stage,
                    not_found(format!("subnet({})", subnet_id)),
                ));
            }
            tracing::info!("using existing subnet {}", subnet_id);
            let subnet_id = subnet_id.to_string();
            ctx.subnet_id.set(subnet_id);
            return Ok(());
        }

        let vpc_id = ctx.vpc_id.require("vpc id").stage(stage)?.as_str();
        let (name, cidr, zone) = (
            run.subnet_name.as_str(),
            run.subnet_cidr_block.as_str(),
            ctx.zone.as_str(),
        );
        tracing::info!("creating subnet {} ({}) in {}", name, cidr, zone);
        let created = ctx
            .retry
            .run(move || vpc.create_subnet(vpc_id, name, cidr, zone))
            .await
            .stage(stage)?;
        tracing::info!("subnet {} created", created.subnet_id);
        self.created = true;
        ctx.subnet_id.set(created.subnet_id);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct ConfigSecurityGroup {
    created: bool,
}

#[async_trait]
impl Step for ConfigSecurityGroup {
    fn name(&self) -> &'static str {
        "config-security-group"
    }

    async fn run(&mut self, ctx: &mut BuildContext) -> StepAction {
        conclude(self.configure(ctx).await)
    }

    async fn cleanup(&mut self, ctx: &BuildContext) {
        if !self.created {
            return;
        }
        let Some(group_id) = ctx.security_group_id.get() else {
            return;
        };

        tracing::info!("deleting security group {}", group_id);
        let result = async {
            let vpc = ctx.clients.vpc().await?;
            let vpc = vpc.as_ref();
            ctx.retry.run(move || vpc.delete_security_group(group_id)).await
        }
        .await;
        report_cleanup(&format!("security group({})", group_id), result);
    }
}

impl ConfigSecurityGroup {
    async fn configure(&mut self, ctx: &mut BuildContext) -> Result<(), StepError> {
        let stage = "config security group";
        let vpc = ctx.clients.vpc().await.stage(stage)?;
        let vpc = vpc.as_ref();
        let run = &ctx.config.run;

        if let Some(group_id) = run.security_group_id.as_deref().filter(|id| !id.is_empty()) {
            let ids = [group_id.to_string()];
            let ids = &ids[..];
            let found = ctx
                .retry
                .run(move || vpc.describe_security_groups(ids))
                .await
                .stage(stage)?;
            if found.is_empty() {
                return Err(StepError::new(
                    stage,
                    not_found(format!("security group({})", group_id)),
                ));
            }
            tracing::info!("using existing security group {}", group_id);
            let group_id = group_id.to_string();
            ctx.security_group_id.set(group_id);
            return Ok(());
        }

        let name = run.security_group_name.as_str();
        tracing::info!("creating security group {}", name);
        let created = ctx
            .retry
            .run(move || vpc.create_security_group(name, SECURITY_GROUP_DESCRIPTION))
            .await
            .stage(stage)?;
        self.created = true;
        ctx.security_group_id.set(created.security_group_id.clone());

        let group_id = created.security_group_id.as_str();
        ctx.retry
            .run(move || vpc.allow_all_traffic(group_id))
            .await
            .stage("allow security group traffic")?;
        tracing::info!("security group {} created", group_id);
        Ok(())
    }
}
