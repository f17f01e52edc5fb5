//! Compute service

use crate::client::{CVM, TencentClient};
use async_trait::async_trait;
use cvmforge_auth::ServiceTarget;
use cvmforge_cloud::{
    CreateImageRequest, CvmApi, Filter, Image, Instance, Result, RunInstancesRequest,
    SharePermission, ZoneInfo,
};
use serde::{Deserialize, Serialize};

/// Page size used for `DescribeImages`
const IMAGE_PAGE_LIMIT: u32 = 100;

pub struct CvmClient {
    client: TencentClient,
}

impl CvmClient {
    pub fn new(target: ServiceTarget<'_>) -> Result<Self> {
        Ok(Self {
            client: TencentClient::new(CVM, target)?,
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceIds<'a> {
    instance_ids: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeImagesRequest<'a> {
    filters: &'a [Filter],
    limit: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ImageFamily<'a> {
    image_family: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ImageIds<'a> {
    image_ids: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SyncImagesRequest<'a> {
    image_ids: &'a [String],
    destination_regions: &'a [String],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SharePermissionRequest<'a> {
    image_id: &'a str,
    account_ids: &'a [String],
    permission: SharePermission,
}

#[derive(Serialize)]
struct Empty {}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct ZoneSet {
    zone_set: Vec<ZoneInfo>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct InstanceSet {
    instance_set: Vec<Instance>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct InstanceIdSet {
    instance_id_set: Vec<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct ImageSet {
    image_set: Vec<Image>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct FamilyImage {
    image: Option<Image>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
struct CreatedImage {
    image_id: Option<String>,
}

#[derive(Deserialize, Default)]
struct Ack {}

#[async_trait]
impl CvmApi for CvmClient {
    async fn describe_zones(&self) -> Result<Vec<ZoneInfo>> {
        let resp: ZoneSet = self.client.call("DescribeZones", &Empty {}).await?;
        Ok(resp.zone_set)
    }

    async fn describe_instances(&self, instance_ids: &[String]) -> Result<Vec<Instance>> {
        let resp: InstanceSet = self
            .client
            .call("DescribeInstances", &InstanceIds { instance_ids })
            .await?;
        Ok(resp.instance_set)
    }

    async fn run_instances(&self, request: &RunInstancesRequest) -> Result<Vec<String>> {
        let resp: InstanceIdSet = self.client.call("RunInstances", request).await?;
        Ok(resp.instance_id_set)
    }

    async fn terminate_instances(&self, instance_ids: &[String]) -> Result<()> {
        let _: Ack = self
            .client
            .call("TerminateInstances", &InstanceIds { instance_ids })
            .await?;
        Ok(())
    }

    async fn describe_images(&self, filters: &[Filter]) -> Result<Vec<Image>> {
        let request = DescribeImagesRequest {
            filters,
            limit: IMAGE_PAGE_LIMIT,
        };
        let resp: ImageSet = self.client.call("DescribeImages", &request).await?;
        Ok(resp.image_set)
    }

    async fn describe_image_from_family(&self, family: &str) -> Result<Option<Image>> {
        let resp: FamilyImage = self
            .client
            .call(
                "DescribeImageFromFamily",
                &ImageFamily {
                    image_family: family,
                },
            )
            .await?;
        Ok(resp.image)
    }

    async fn create_image(&self, request: &CreateImageRequest) -> Result<Option<String>> {
        let resp: CreatedImage = self.client.call("CreateImage", request).await?;
        Ok(resp.image_id.filter(|id| !id.is_empty()))
    }

    async fn delete_images(&self, image_ids: &[String]) -> Result<()> {
        let _: Ack = self
            .client
            .call("DeleteImages", &ImageIds { image_ids })
            .await?;
        Ok(())
    }

    async fn sync_images(
        &self,
        image_ids: &[String],
        destination_regions: &[String],
    ) -> Result<()> {
        let request = SyncImagesRequest {
            image_ids,
            destination_regions,
        };
        let _: Ack = self.client.call("SyncImages", &request).await?;
        Ok(())
    }

    async fn modify_image_share_permission(
        &self,
        image_id: &str,
        account_ids: &[String],
        permission: SharePermission,
    ) -> Result<()> {
        let request = SharePermissionRequest {
            image_id,
            account_ids,
            permission,
        };
        let _: Ack = self
            .client
            .call("ModifyImageSharePermission", &request)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_request_body() {
        let accounts = vec!["100001".to_string(), "100002".to_string()];
        let body = serde_json::to_value(SharePermissionRequest {
            image_id: "img-12345678",
            account_ids: &accounts,
            permission: SharePermission::Cancel,
        })
        .unwrap();
        assert_eq!(body["ImageId"], "img-12345678");
        assert_eq!(body["AccountIds"][1], "100002");
        assert_eq!(body["Permission"], "CANCEL");
    }

    #[test]
    fn test_describe_images_body() {
        let filters = [Filter::new("image-name", "golden")];
        let body = serde_json::to_value(DescribeImagesRequest {
            filters: &filters,
            limit: IMAGE_PAGE_LIMIT,
        })
        .unwrap();
        assert_eq!(body["Filters"][0]["Name"], "image-name");
        assert_eq!(body["Filters"][0]["Values"][0], "golden");
        assert_eq!(body["Limit"], 100);
    }

    #[test]
    fn test_family_image_may_be_absent() {
        let resp: FamilyImage =
            crate::client::decode_response(r#"{"Response": {"RequestId": "r"}}"#).unwrap();
        assert!(resp.image.is_none());
    }
}
