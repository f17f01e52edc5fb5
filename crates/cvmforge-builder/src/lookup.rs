//! Image lookup by filters or by image family

use crate::error::{BuildError, Result};
use cvmforge_cloud::{CvmApi, Filter, Image, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How to find an image
///
/// ```yaml
/// source_image_filter:
///   filters:
///     image-type: PUBLIC_IMAGE
///     platform: TencentOS
///   most_recent: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageQuery {
    pub filters: BTreeMap<String, String>,
    pub image_family: Option<String>,
    pub most_recent: bool,
}

impl ImageQuery {
    fn family(&self) -> Option<&str> {
        self.image_family.as_deref().filter(|f| !f.is_empty())
    }

    /// Problems with the query itself, before any remote call
    pub fn problems(&self) -> Vec<String> {
        match (self.filters.is_empty(), self.family()) {
            (true, None) => vec!["filters or image_family must be specified".into()],
            (false, Some(_)) => vec!["filters and image_family are mutually exclusive".into()],
            _ => Vec::new(),
        }
    }

    fn as_filters(&self) -> Vec<Filter> {
        self.filters
            .iter()
            .map(|(name, value)| Filter::new(name, value))
            .collect()
    }
}

/// Resolve `query` to exactly one image
pub async fn find_image(
    cvm: &dyn CvmApi,
    retry: &RetryPolicy,
    query: &ImageQuery,
) -> Result<Image> {
    if let Some(problem) = query.problems().into_iter().next() {
        return Err(BuildError::ImageLookup(problem));
    }

    if let Some(family) = query.family() {
        tracing::debug!("looking up image family {}", family);
        return retry
            .run(move || cvm.describe_image_from_family(family))
            .await?
            .ok_or_else(|| {
                BuildError::ImageLookup("No image found using the specified image family".into())
            });
    }

    let filters = query.as_filters();
    let filters = &filters[..];
    let mut images = retry.run(move || cvm.describe_images(filters)).await?;
    tracing::debug!("{} image(s) matched {:?}", images.len(), query.filters);

    match images.len() {
        0 => Err(BuildError::ImageLookup(
            "No image found using the specified filters".into(),
        )),
        1 => Ok(images.remove(0)),
        _ if query.most_recent => most_recent(images).ok_or_else(|| {
            BuildError::ImageLookup("No image found using the specified filters".into())
        }),
        n => Err(BuildError::ImageLookup(format!(
            "Your image query returned {} results. Please try a more specific search, or set most_recent to true.",
            n
        ))),
    }
}

/// Latest image by creation time; images without one never win over dated ones
pub fn most_recent(images: Vec<Image>) -> Option<Image> {
    images.into_iter().reduce(|best, candidate| {
        match (best.created_at(), candidate.created_at()) {
            (Some(b), Some(c)) if c > b => candidate,
            (None, Some(_)) => candidate,
            _ => best,
        }
    })
}
