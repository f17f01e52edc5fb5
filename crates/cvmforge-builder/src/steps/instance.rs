use super::{StageExt, conclude};
use crate::config::RunConfig;
use crate::context::BuildContext;
use crate::error::StepError;
use crate::runner::{Step, StepAction};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cvmforge_cloud::{
    CloudError, DataDisk, Image, INSTANCE_RUNNING, InternetAccessible, LoginSettings, Placement,
    RunInstancesRequest, SystemDisk, TagSpecification, VirtualPrivateCloud, wait_for_instance,
};

/// Launch the temporary build instance and wait for it to run
pub struct RunInstance;

#[async_trait]
impl Step for RunInstance {
    fn name(&self) -> &'static str {
        "run-instance"
    }

    async fn run(&mut self, ctx: &mut BuildContext) -> StepAction {
        conclude(run_instance(ctx).await)
    }

    async fn cleanup(&mut self, ctx: &BuildContext) {
        let Some(instance_id) = ctx.instance_id.get() else {
            return;
        };

        tracing::info!("terminating instance {}", instance_id);
        let result = async {
            let cvm = ctx.clients.cvm().await?;
            let cvm = cvm.as_ref();
            let ids = [instance_id.clone()];
            let ids = &ids[..];
            ctx.retry.run(move || cvm.terminate_instances(ids)).await
        }
        .await;
        if let Err(err) = result {
            tracing::error!(
                "failed to terminate instance({}), please delete it manually: {}",
                instance_id,
                err
            );
        }
    }
}

async fn run_instance(ctx: &mut BuildContext) -> Result<(), StepError> {
    let request = launch_request(ctx).stage("run instance")?;
    let cvm = ctx.clients.cvm().await.stage("run instance")?;
    let cvm = cvm.as_ref();

    tracing::info!(
        "launching {} from {}",
        request.instance_type,
        request.image_id
    );
    let request = &request;
    let ids = ctx
        .retry
        .run(move || cvm.run_instances(request))
        .await
        .stage("run instance")?;
    let [instance_id] = <[String; 1]>::try_from(ids).map_err(|ids| {
        StepError::new(
            "run instance",
            CloudError::UnexpectedResponse(format!("expected one instance, got {}", ids.len())),
        )
    })?;

    // recorded before waiting so cleanup can terminate it
    ctx.instance_id.set(instance_id.clone());

    tracing::info!("waiting for instance {} to run", instance_id);
    let instance = wait_for_instance(cvm, &ctx.retry, &instance_id, INSTANCE_RUNNING, &ctx.wait)
        .await
        .stage("wait for instance ready")?;

    tracing::info!("instance {} created", instance.instance_id);
    ctx.instance.set(instance);
    Ok(())
}

/// The `RunInstances` request for the recorded source image and network
pub fn launch_request(ctx: &BuildContext) -> cvmforge_cloud::Result<RunInstancesRequest> {
    let run = &ctx.config.run;
    let image = ctx.source_image.require("source image")?;

    Ok(RunInstancesRequest {
        placement: (!ctx.zone.is_empty()).then(|| Placement {
            zone: ctx.zone.clone(),
        }),
        instance_charge_type: run.instance_charge_type.clone(),
        image_id: image.image_id.clone(),
        instance_type: run.instance_type.clone(),
        system_disk: SystemDisk {
            disk_type: run.disk_type.clone(),
            disk_size: run.disk_size,
        },
        data_disks: data_disks(run, image),
        virtual_private_cloud: VirtualPrivateCloud {
            vpc_id: ctx.vpc_id.require("vpc id")?.clone(),
            subnet_id: ctx.subnet_id.require("subnet id")?.clone(),
        },
        internet_accessible: run
            .associate_public_ip_address
            .then(|| InternetAccessible {
                internet_charge_type: run.internet_charge_type.clone().filter(|c| !c.is_empty()),
                internet_max_bandwidth_out: run.internet_max_bandwidth_out,
                public_ip_assigned: true,
                bandwidth_package_id: run.bandwidth_package_id.clone().filter(|b| !b.is_empty()),
            }),
        instance_name: run.instance_name.clone(),
        login_settings: LoginSettings {
            password: run.login.password.clone().filter(|p| !p.is_empty()),
            key_ids: run
                .login
                .key_id
                .iter()
                .filter(|k| !k.is_empty())
                .cloned()
                .collect(),
        },
        security_group_ids: vec![ctx.security_group_id.require("security group id")?.clone()],
        client_token: run.instance_name.clone(),
        host_name: run.host_name.clone(),
        user_data: user_data(run)?,
        cam_role_name: run.cam_role_name.clone().filter(|r| !r.is_empty()),
        tag_specification: TagSpecification::from_map("instance", &run.run_tags)
            .into_iter()
            .collect(),
    })
}

/// Data disk snapshots of the source image win over configured data disks.
/// Snapshots carry no disk type, so they take the system disk's.
fn data_disks(run: &RunConfig, image: &Image) -> Vec<DataDisk> {
    let snapshots: Vec<DataDisk> = image
        .data_disk_snapshots()
        .map(|snapshot| DataDisk {
            disk_type: run.disk_type.clone(),
            disk_size: snapshot.disk_size,
            snapshot_id: Some(snapshot.snapshot_id.clone()),
        })
        .collect();
    if !snapshots.is_empty() {
        tracing::info!("using the source image's data disk snapshots, ignoring data_disks");
        return snapshots;
    }

    run.data_disks
        .iter()
        .map(|disk| DataDisk {
            disk_type: disk.disk_type.clone(),
            disk_size: disk.disk_size,
            snapshot_id: disk.disk_snapshot_id.clone().filter(|s| !s.is_empty()),
        })
        .collect()
}

/// Base64 of the literal user data, else of the user data file
fn user_data(run: &RunConfig) -> cvmforge_cloud::Result<String> {
    let raw = match (run.user_data.as_deref(), run.user_data_file.as_deref()) {
        (Some(data), _) if !data.is_empty() => data.as_bytes().to_vec(),
        (_, Some(file)) if !file.is_empty() => std::fs::read(file)?,
        _ => Vec::new(),
    };
    Ok(STANDARD.encode(raw))
}
