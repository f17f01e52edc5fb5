use super::{StageExt, conclude};
use crate::context::BuildContext;
use crate::error::StepError;
use crate::runner::{Step, StepAction};
use async_trait::async_trait;
use cvmforge_cloud::{ClientProvider, RetryPolicy, SharePermission};

/// Page size for organization member listing
pub const ORG_MEMBER_PAGE_SIZE: u64 = 50;

/// Share the image with explicit accounts and, optionally, every other
/// member of the caller's organization.
///
/// Cleanup on failed builds revokes the explicit accounts only; members found
/// through the organization keep their share.
pub struct ShareImage;

#[async_trait]
impl Step for ShareImage {
    fn name(&self) -> &'static str {
        "share-image"
    }

    async fn run(&mut self, ctx: &mut BuildContext) -> StepAction {
        let image = &ctx.config.image;
        if image.skip_create_image
            || (image.image_share_accounts.is_empty() && !image.share_org_members)
        {
            return StepAction::Continue;
        }
        conclude(share_image(ctx).await)
    }

    async fn cleanup(&mut self, ctx: &BuildContext) {
        let accounts = &ctx.config.image.image_share_accounts;
        if !ctx.is_failed() || accounts.is_empty() {
            return;
        }
        let Some(image_id) = ctx.image_id.get() else {
            return;
        };

        tracing::info!("cancelling share of image {}", image_id);
        let result = async {
            let cvm = ctx.clients.cvm().await?;
            let cvm = cvm.as_ref();
            let accounts = &accounts[..];
            ctx.retry
                .run(move || {
                    cvm.modify_image_share_permission(image_id, accounts, SharePermission::Cancel)
                })
                .await
        }
        .await;
        if let Err(err) = result {
            tracing::error!(
                "failed to cancel share of image({}), please delete it manually: {}",
                image_id,
                err
            );
        }
    }
}

async fn share_image(ctx: &BuildContext) -> Result<(), StepError> {
    let image = &ctx.config.image;
    let image_id = ctx.image_id.require("image id").stage("share image")?;

    let mut accounts = image.image_share_accounts.clone();
    if image.share_org_members {
        for account in org_accounts(ctx.clients.as_ref(), &ctx.retry)
            .await
            .stage("list organization members")?
        {
            if !accounts.contains(&account) {
                accounts.push(account);
            }
        }
    }
    if accounts.is_empty() {
        return Ok(());
    }

    tracing::info!("sharing image {} with {} account(s)", image_id, accounts.len());
    let cvm = ctx.clients.cvm().await.stage("share image")?;
    let cvm = cvm.as_ref();
    let accounts = &accounts[..];
    ctx.retry
        .run(move || cvm.modify_image_share_permission(image_id, accounts, SharePermission::Share))
        .await
        .stage("share image")?;
    tracing::info!("image {} shared", image_id);
    Ok(())
}

/// Uins of every organization member except the caller
pub async fn org_accounts(
    clients: &dyn ClientProvider,
    retry: &RetryPolicy,
) -> cvmforge_cloud::Result<Vec<String>> {
    let cam = clients.cam().await?;
    let cam = cam.as_ref();
    let own_uin = retry.run(move || cam.caller_uin()).await?;
    if own_uin.is_none() {
        tracing::warn!("caller uin unknown, it will not be excluded from the share");
    }

    let org = clients.org().await?;
    let org = org.as_ref();
    let mut accounts = Vec::new();
    let mut offset = 0;
    loop {
        let page = retry
            .run(move || org.describe_organization_members(ORG_MEMBER_PAGE_SIZE, offset))
            .await?;
        let page_len = page.len() as u64;

        accounts.extend(
            page.into_iter()
                .filter_map(|member| member.member_uin)
                .map(|uin| uin.to_string())
                .filter(|uin| own_uin.as_deref() != Some(uin.as_str())),
        );

        if page_len < ORG_MEMBER_PAGE_SIZE {
            break;
        }
        offset += ORG_MEMBER_PAGE_SIZE;
    }

    tracing::debug!("{} organization member(s) to share with", accounts.len());
    Ok(accounts)
}
