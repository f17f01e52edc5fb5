use super::{StageExt, conclude, not_found};
use crate::context::BuildContext;
use crate::error::{BuildError, StepError};
use crate::lookup::find_image;
use crate::runner::{Step, StepAction};
use async_trait::async_trait;
use cvmforge_cloud::{CloudError, Filter, get_image_by_name};

/// Resolve the source image by id, by exact name or by query
pub struct CheckSourceImage;

#[async_trait]
impl Step for CheckSourceImage {
    fn name(&self) -> &'static str {
        "check-source-image"
    }

    async fn run(&mut self, ctx: &mut BuildContext) -> StepAction {
        conclude(check_source_image(ctx).await)
    }

    async fn cleanup(&mut self, _ctx: &BuildContext) {}
}

async fn check_source_image(ctx: &mut BuildContext) -> Result<(), StepError> {
    let stage = "check source image";
    let cvm = ctx.clients.cvm().await.stage(stage)?;
    let cvm = cvm.as_ref();
    let run = &ctx.config.run;

    let image = if let Some(id) = run.source_image_id.as_deref().filter(|id| !id.is_empty()) {
        let filters = [Filter::new("image-id", id)];
        let filters = &filters[..];
        ctx.retry
            .run(move || cvm.describe_images(filters))
            .await
            .stage(stage)?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(format!("no image found under the specified id {}", id)))
            .stage(stage)?
    } else if let Some(name) = run.source_image_name.as_deref().filter(|n| !n.is_empty()) {
        get_image_by_name(cvm, &ctx.retry, name)
            .await
            .stage(stage)?
            .ok_or_else(|| not_found(format!("no image found under the specified name {}", name)))
            .stage(stage)?
    } else if let Some(query) = &run.source_image_filter {
        find_image(cvm, &ctx.retry, query).await.map_err(|err| {
            let source = match err {
                BuildError::Cloud(cloud) => cloud,
                other => CloudError::InvalidConfig(other.to_string()),
            };
            StepError::new(stage, source)
        })?
    } else {
        return Err(StepError::new(
            stage,
            CloudError::InvalidConfig("no source image configured".into()),
        ));
    };

    tracing::info!("source image {} ({})", image.image_id, image.image_name);
    ctx.source_image.set(image);
    Ok(())
}
