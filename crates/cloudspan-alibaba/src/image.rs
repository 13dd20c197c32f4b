//! Custom images created from instances

use crate::api::{AlibabaApi, Service, describe_all, describe_one, params, required_str};
use crate::model::Image;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, ImageHandler, ImageInfo, ImageReqInfo, KeyValue, PollStatus,
    Result,
};
use std::sync::Arc;

async fn describe_image(api: &dyn AlibabaApi, image_id: &str) -> Result<Image> {
    describe_one(
        api,
        Service::Ecs,
        "DescribeImages",
        params([("ImageId", image_id), ("ImageOwnerAlias", "self")]),
        "/Images/Image",
        &format!("image {image_id}"),
    )
    .await
}

pub struct AlibabaImageHandler {
    api: Arc<dyn AlibabaApi>,
    ctx: HandlerContext,
}

impl AlibabaImageHandler {
    pub fn new(api: Arc<dyn AlibabaApi>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }

    async fn own_images(&self) -> Result<Vec<Image>> {
        describe_all(
            self.api.as_ref(),
            Service::Ecs,
            "DescribeImages",
            params([("ImageOwnerAlias", "self")]),
            "/Images/Image",
        )
        .await
    }
}

#[async_trait]
impl ImageHandler for AlibabaImageHandler {
    async fn create_image(&self, req: ImageReqInfo) -> Result<ImageInfo> {
        if req.source_id.is_empty() {
            return Err(CloudError::InvalidRequest(
                "source_id must name the instance to image".into(),
            ));
        }
        if self
            .own_images()
            .await?
            .iter()
            .any(|i| i.image_name == req.name)
        {
            return Err(CloudError::already_exists("Image", &req.name));
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, instance = %req.source_id, "creating image");
        let response = self
            .api
            .call(
                Service::Ecs,
                "CreateImage",
                params([
                    ("InstanceId", req.source_id.as_str()),
                    ("ImageName", req.name.as_str()),
                ]),
            )
            .await?;
        let image_id = required_str(&response, "ImageId")?;

        let api = self.api.as_ref();
        let id = image_id.as_str();
        self.ctx
            .wait_for(&format!("create image {}", req.name), move || async move {
                let image = describe_image(api, id).await?;
                match image.status.as_str() {
                    "Available" => Ok(PollStatus::Done(())),
                    "CreateFailed" | "UnAvailable" => Err(CloudError::OperationFailed {
                        operation: format!("create image {id}"),
                        message: format!("image status is {}", image.status),
                    }),
                    _ => Ok(PollStatus::Pending),
                }
            })
            .await?;

        self.get_image(&image_id).await
    }

    async fn list_image(&self) -> Result<Vec<ImageInfo>> {
        Ok(self.own_images().await?.iter().map(map_image).collect())
    }

    async fn get_image(&self, image_id: &str) -> Result<ImageInfo> {
        Ok(map_image(&describe_image(self.api.as_ref(), image_id).await?))
    }

    async fn delete_image(&self, image_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, image_id, "deleting image");
        self.api
            .call(Service::Ecs, "DeleteImage", params([("ImageId", image_id)]))
            .await?;
        Ok(true)
    }
}

pub fn map_image(image: &Image) -> ImageInfo {
    ImageInfo {
        id: image.image_id.clone(),
        name: image.image_name.clone(),
        guest_os: image.os_name.clone(),
        status: image.status.clone(),
        key_value_list: vec![
            KeyValue::new("OSType", &image.os_type),
            KeyValue::new("Architecture", &image.architecture),
            KeyValue::new("Size", image.size.to_string()),
        ],
    }
}
