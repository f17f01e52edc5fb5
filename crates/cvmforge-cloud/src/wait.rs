//! Polling until a resource converges
//!
//! [`wait_for`] is the generic primitive; [`wait_for_instance`] and
//! [`wait_for_image_ready`] are the two uses the build steps need.

use crate::api::CvmApi;
use crate::error::{CloudError, Result};
use crate::model::{Filter, Image, Instance};
use crate::retry::RetryPolicy;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Default sleep between two status checks
pub const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_secs(5);

/// Default budget for instance and image convergence
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(1800);

/// Instance state the launch step waits for
pub const INSTANCE_RUNNING: &str = "RUNNING";

/// Image state that marks a usable image
pub const IMAGE_READY: &str = "NORMAL";

/// Poll interval and total budget
#[derive(Debug, Clone)]
pub struct WaitOptions {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_WAIT_INTERVAL,
            timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }
}

impl WaitOptions {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Check, test, sleep, repeat.
///
/// Returns the first status for which `predicate` holds. Each miss sleeps
/// `interval` and charges it against the budget; once the budget is spent the
/// call fails with [`CloudError::Timeout`]. Errors from `check` are returned
/// as-is (callers wrap `check` in the retry policy).
pub async fn wait_for<T, F, Fut, P>(
    what: &str,
    options: &WaitOptions,
    mut check: F,
    mut predicate: P,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: FnMut(&T) -> bool,
{
    let mut remaining = options.timeout;
    // a zero interval must still drain the budget
    let charge = options.interval.max(Duration::from_millis(1));

    loop {
        let status = check().await?;
        if predicate(&status) {
            return Ok(status);
        }

        sleep(options.interval).await;
        remaining = remaining.saturating_sub(charge);
        if remaining.is_zero() {
            return Err(CloudError::Timeout(format!("wait {} timeout", what)));
        }
        tracing::debug!("still waiting for {} ({:?} left)", what, remaining);
    }
}

/// Wait until the instance is in `status` with no operation in flight
pub async fn wait_for_instance(
    cvm: &dyn CvmApi,
    retry: &RetryPolicy,
    instance_id: &str,
    status: &str,
    options: &WaitOptions,
) -> Result<Instance> {
    let ids = [instance_id.to_string()];
    let ids = &ids[..];
    let what = format!("instance({}) status({})", instance_id, status);

    wait_for(
        &what,
        options,
        move || async move {
            let instances = retry.run(move || cvm.describe_instances(ids)).await?;
            instances.into_iter().next().ok_or_else(|| {
                CloudError::ResourceNotFound(format!("instance({}) not exist", instance_id))
            })
        },
        |instance: &Instance| instance.is_settled_in(status),
    )
    .await
}

/// Look an image up by its exact name
pub async fn get_image_by_name(
    cvm: &dyn CvmApi,
    retry: &RetryPolicy,
    image_name: &str,
) -> Result<Option<Image>> {
    let filters = [Filter::new("image-name", image_name)];
    let filters = &filters[..];
    let images = retry.run(move || cvm.describe_images(filters)).await?;

    // the filter is a prefix match on some endpoints
    Ok(images.into_iter().find(|image| image.image_name == image_name))
}

/// Wait until an image named `image_name` exists and is in `status`
pub async fn wait_for_image_ready(
    cvm: &dyn CvmApi,
    retry: &RetryPolicy,
    image_name: &str,
    status: &str,
    options: &WaitOptions,
) -> Result<Image> {
    let what = format!("image({}) status({})", image_name, status);

    let found = wait_for(
        &what,
        options,
        move || get_image_by_name(cvm, retry, image_name),
        |image: &Option<Image>| image.as_ref().is_some_and(|i| i.image_state == status),
    )
    .await?;

    found.ok_or_else(|| CloudError::ResourceNotFound(format!("image({})", image_name)))
}
