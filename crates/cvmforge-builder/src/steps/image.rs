use super::{StageExt, conclude, report_cleanup};
use crate::context::BuildContext;
use crate::error::StepError;
use crate::runner::{Step, StepAction};
use async_trait::async_trait;
use cvmforge_cloud::{
    CloudError, CreateImageRequest, IMAGE_READY, TagSpecification, bool_flag, get_image_by_name,
    wait_for_image_ready,
};

/// Refuse to start when the target image name is taken
pub struct PreValidate;

#[async_trait]
impl Step for PreValidate {
    fn name(&self) -> &'static str {
        "pre-validate"
    }

    async fn run(&mut self, ctx: &mut BuildContext) -> StepAction {
        if ctx.config.image.skip_create_image {
            return StepAction::Continue;
        }
        conclude(pre_validate(ctx).await)
    }

    async fn cleanup(&mut self, _ctx: &BuildContext) {}
}

async fn pre_validate(ctx: &BuildContext) -> Result<(), StepError> {
    let stage = "check image name";
    let name = &ctx.config.image.image_name;
    let cvm = ctx.clients.cvm().await.stage(stage)?;

    match get_image_by_name(cvm.as_ref(), &ctx.retry, name).await.stage(stage)? {
        Some(image) => Err(StepError::new(
            stage,
            CloudError::InvalidConfig(format!(
                "image name {} already exists ({})",
                name, image.image_id
            )),
        )),
        None => Ok(()),
    }
}

/// Capture the instance into an image and wait until it is usable
pub struct CreateImage;

#[async_trait]
impl Step for CreateImage {
    fn name(&self) -> &'static str {
        "create-image"
    }

    async fn run(&mut self, ctx: &mut BuildContext) -> StepAction {
        if ctx.config.image.skip_create_image {
            tracing::info!("skipping image creation");
            return StepAction::Continue;
        }
        conclude(create_image(ctx).await)
    }

    async fn cleanup(&mut self, ctx: &BuildContext) {
        if !ctx.is_failed() {
            return;
        }
        let Some(image_id) = ctx.image_id.get() else {
            return;
        };

        tracing::info!("deleting image {}", image_id);
        let result = async {
            let cvm = ctx.clients.cvm().await?;
            let cvm = cvm.as_ref();
            let ids = [image_id.clone()];
            let ids = &ids[..];
            ctx.retry.run(move || cvm.delete_images(ids)).await
        }
        .await;
        report_cleanup(&format!("image({})", image_id), result);
    }
}

async fn create_image(ctx: &mut BuildContext) -> Result<(), StepError> {
    let instance_id = ctx
        .instance_id
        .require("instance id")
        .stage("create image")?
        .clone();
    let image = &ctx.config.image;

    let request = CreateImageRequest {
        instance_id: instance_id.clone(),
        image_name: image.image_name.clone(),
        image_description: image.image_description.clone(),
        force_poweroff: bool_flag(image.force_poweroff),
        sysprep: bool_flag(image.sysprep),
        tag_specification: TagSpecification::from_map("image", &image.image_tags)
            .into_iter()
            .collect(),
    };

    tracing::info!("creating image {} from {}", request.image_name, instance_id);
    let cvm = ctx.clients.cvm().await.stage("create image")?;
    let cvm = cvm.as_ref();
    let request = &request;
    let created = ctx
        .retry
        .run(move || cvm.create_image(request))
        .await
        .stage("create image")?;
    if let Some(id) = created {
        ctx.image_id.set(id);
    }

    tracing::info!("waiting for image {} to become ready", request.image_name);
    let ready = wait_for_image_ready(
        cvm,
        &ctx.retry,
        &request.image_name,
        IMAGE_READY,
        &ctx.wait,
    )
    .await
    .stage("wait for image ready")?;

    tracing::info!("image {} ready", ready.image_id);
    let region = ctx.region().to_string();
    ctx.images.insert(region, ready.image_id.clone());
    ctx.image_id.set(ready.image_id.clone());
    ctx.image.set(ready);
    Ok(())
}
