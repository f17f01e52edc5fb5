mod common;

use common::*;
use cvmforge_builder::{BuildError, ImageQuery, find_image};
use cvmforge_cloud::RetryPolicy;
use std::collections::BTreeMap;

fn private_images(cloud: &FakeCloud) {
    let mut state = cloud.state.lock().unwrap();
    for (id, created) in [
        ("img-older001", Some("2024-01-10T08:00:00Z")),
        ("img-newer001", Some("2024-05-10T08:00:00Z")),
        ("img-undated1", None),
    ] {
        let (region, mut image) = image(SOURCE_REGION, id, id);
        image.image_type = "PRIVATE_IMAGE".into();
        image.created_time = created.map(str::to_string);
        state.images.push((region, image));
    }
}

fn by_type(image_type: &str, most_recent: bool) -> ImageQuery {
    ImageQuery {
        filters: BTreeMap::from([("image-type".to_string(), image_type.to_string())]),
        image_family: None,
        most_recent,
    }
}

#[tokio::test]
async fn test_single_match() {
    let cloud = FakeCloud::new();
    let image = find_image(&cloud, &RetryPolicy::default(), &by_type("PUBLIC_IMAGE", false))
        .await
        .unwrap();
    assert_eq!(image.image_id, SOURCE_IMAGE);
}

#[tokio::test]
async fn test_ambiguous_match_needs_most_recent() {
    let cloud = FakeCloud::new();
    private_images(&cloud);

    let err = find_image(&cloud, &RetryPolicy::default(), &by_type("PRIVATE_IMAGE", false))
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::ImageLookup(ref m) if m.contains("returned 3 results")));

    let image = find_image(&cloud, &RetryPolicy::default(), &by_type("PRIVATE_IMAGE", true))
        .await
        .unwrap();
    assert_eq!(image.image_id, "img-newer001");
}

#[tokio::test]
async fn test_no_match() {
    let cloud = FakeCloud::new();
    let err = find_image(&cloud, &RetryPolicy::default(), &by_type("SHARED_IMAGE", true))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No image found using the specified filters");

    let family = ImageQuery {
        image_family: Some("tencentos".into()),
        ..Default::default()
    };
    let err = find_image(&cloud, &RetryPolicy::default(), &family)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "No image found using the specified image family");
}

#[tokio::test]
async fn test_invalid_query_makes_no_call() {
    let cloud = FakeCloud::new();
    let err = find_image(&cloud, &RetryPolicy::default(), &ImageQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BuildError::ImageLookup(_)));
    assert!(cloud.calls().is_empty());
}
