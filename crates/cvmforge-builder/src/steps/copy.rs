use super::{StageExt, conclude};
use crate::context::BuildContext;
use crate::error::StepError;
use crate::runner::{Step, StepAction};
use async_trait::async_trait;
use cvmforge_cloud::{IMAGE_READY, wait_for_image_ready};

/// Copy the image to every other configured region, one region at a time
pub struct CopyImage;

#[async_trait]
impl Step for CopyImage {
    fn name(&self) -> &'static str {
        "copy-image"
    }

    async fn run(&mut self, ctx: &mut BuildContext) -> StepAction {
        if ctx.config.image.skip_create_image {
            return StepAction::Continue;
        }
        let destinations = destinations(ctx);
        if destinations.is_empty() {
            return StepAction::Continue;
        }
        conclude(copy_image(ctx, &destinations).await)
    }

    async fn cleanup(&mut self, _ctx: &BuildContext) {}
}

/// Configured copy regions other than the source region
fn destinations(ctx: &BuildContext) -> Vec<String> {
    let source = ctx.region();
    ctx.config
        .image
        .image_copy_regions
        .iter()
        .filter(|region| region.as_str() != source)
        .cloned()
        .collect()
}

async fn copy_image(ctx: &mut BuildContext, destinations: &[String]) -> Result<(), StepError> {
    let image_id = ctx
        .image_id
        .require("image id")
        .stage("copy image")?
        .clone();
    let image_name = ctx.config.image.image_name.clone();

    tracing::info!("copying image {} to {}", image_id, destinations.join(","));
    let cvm = ctx.clients.cvm().await.stage("copy image")?;
    let cvm = cvm.as_ref();
    let ids = [image_id.clone()];
    let ids = &ids[..];
    ctx.retry
        .run(move || cvm.sync_images(ids, destinations))
        .await
        .stage("copy image")?;

    for region in destinations {
        let remote = ctx
            .clients
            .cvm_in_region(region)
            .await
            .stage("init client")?;
        let image = wait_for_image_ready(
            remote.as_ref(),
            &ctx.retry,
            &image_name,
            IMAGE_READY,
            &ctx.wait,
        )
        .await
        .stage("wait for image ready")?;

        tracing::info!(
            "copied image from {}({}) to {}({})",
            ctx.region(),
            image_id,
            region,
            image.image_id
        );
        ctx.images.insert(region.clone(), image.image_id);
    }

    tracing::info!("image copied");
    Ok(())
}
