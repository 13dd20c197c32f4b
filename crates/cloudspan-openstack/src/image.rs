//! Glance images; creation snapshots a Nova server

use crate::api::OpenStackApi;
use crate::model::Image;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, ImageHandler, ImageInfo, ImageReqInfo, KeyValue, PollStatus,
    Result,
};
use std::sync::Arc;

pub struct OpenStackImageHandler {
    api: Arc<dyn OpenStackApi>,
    ctx: HandlerContext,
}

impl OpenStackImageHandler {
    pub fn new(api: Arc<dyn OpenStackApi>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }
}

#[async_trait]
impl ImageHandler for OpenStackImageHandler {
    async fn create_image(&self, req: ImageReqInfo) -> Result<ImageInfo> {
        if self
            .api
            .list_images()
            .await?
            .iter()
            .any(|i| i.name == req.name)
        {
            return Err(CloudError::already_exists("Image", &req.name));
        }
        if req.source_id.is_empty() {
            return Err(CloudError::InvalidRequest(
                "source_id (server to snapshot) is required".into(),
            ));
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, server = %req.source_id, "snapshotting server");
        let image_id = self
            .api
            .create_server_image(&req.source_id, &req.name)
            .await?;

        let api = &self.api;
        let id = image_id.as_str();
        let operation = format!("create image {}", req.name);
        let op = operation.as_str();
        self.ctx
            .wait_for(op, move || async move {
                let image = api.get_image(id).await?;
                match image.status.as_str() {
                    "active" => Ok(PollStatus::Done(())),
                    "killed" | "deleted" => Err(CloudError::OperationFailed {
                        operation: op.to_string(),
                        message: format!("image status {}", image.status),
                    }),
                    _ => Ok(PollStatus::Pending),
                }
            })
            .await?;

        self.get_image(&image_id).await
    }

    async fn list_image(&self) -> Result<Vec<ImageInfo>> {
        Ok(self.api.list_images().await?.iter().map(map_image).collect())
    }

    async fn get_image(&self, image_id: &str) -> Result<ImageInfo> {
        Ok(map_image(&self.api.get_image(image_id).await?))
    }

    async fn delete_image(&self, image_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, image_id, "deleting image");
        self.api.delete_image(image_id).await?;
        Ok(true)
    }
}

pub fn map_image(image: &Image) -> ImageInfo {
    let mut key_value_list = vec![KeyValue::new("Visibility", &image.visibility)];
    if let Some(format) = &image.disk_format {
        key_value_list.push(KeyValue::new("DiskFormat", format));
    }
    if let Some(format) = &image.container_format {
        key_value_list.push(KeyValue::new("ContainerFormat", format));
    }
    if let Some(size) = image.size {
        key_value_list.push(KeyValue::new("Size", size.to_string()));
    }
    key_value_list.push(KeyValue::new("MinDisk", image.min_disk.to_string()));

    ImageInfo {
        id: image.id.clone(),
        name: image.name.clone(),
        guest_os: image.os_distro.clone().unwrap_or_default(),
        status: image.status.clone(),
        key_value_list,
    }
}
