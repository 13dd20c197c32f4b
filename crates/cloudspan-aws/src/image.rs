//! AMIs created from running instances

use crate::api::Ec2Api;
use crate::model::Image;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, ImageHandler, ImageInfo, ImageReqInfo, KeyValue, PollStatus,
    Result,
};
use std::sync::Arc;

pub struct AwsImageHandler {
    api: Arc<dyn Ec2Api>,
    ctx: HandlerContext,
}

impl AwsImageHandler {
    pub fn new(api: Arc<dyn Ec2Api>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }
}

#[async_trait]
impl ImageHandler for AwsImageHandler {
    async fn create_image(&self, req: ImageReqInfo) -> Result<ImageInfo> {
        if req.source_id.is_empty() {
            return Err(CloudError::InvalidRequest(
                "source_id must name the instance to image".into(),
            ));
        }
        if self
            .api
            .describe_images()
            .await?
            .iter()
            .any(|i| i.name == req.name)
        {
            return Err(CloudError::already_exists("Image", &req.name));
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, instance = %req.source_id, "creating AMI");
        let image_id = self.api.create_image(&req.source_id, &req.name).await?;

        let api = self.api.as_ref();
        let id = image_id.as_str();
        self.ctx
            .wait_for(&format!("create image {}", req.name), move || async move {
                let image = api.describe_image(id).await?;
                match image.state.as_str() {
                    "available" => Ok(PollStatus::Done(())),
                    "failed" | "error" | "invalid" => Err(CloudError::OperationFailed {
                        operation: format!("create image {id}"),
                        message: format!("image state is {}", image.state),
                    }),
                    _ => Ok(PollStatus::Pending),
                }
            })
            .await?;

        self.get_image(&image_id).await
    }

    async fn list_image(&self) -> Result<Vec<ImageInfo>> {
        Ok(self
            .api
            .describe_images()
            .await?
            .iter()
            .map(map_image)
            .collect())
    }

    async fn get_image(&self, image_id: &str) -> Result<ImageInfo> {
        Ok(map_image(&self.api.describe_image(image_id).await?))
    }

    async fn delete_image(&self, image_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, image_id, "deregistering AMI");
        self.api.deregister_image(image_id).await?;
        Ok(true)
    }
}

pub fn map_image(image: &Image) -> ImageInfo {
    ImageInfo {
        id: image.image_id.clone(),
        name: image.name.clone(),
        guest_os: image.platform_details.clone(),
        status: image.state.clone(),
        key_value_list: vec![
            KeyValue::new("Architecture", &image.architecture),
            KeyValue::new("RootDeviceType", &image.root_device_type),
        ],
    }
}
