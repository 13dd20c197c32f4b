//! Custom images captured from an instance's boot disk

use crate::api::{GcpApi, ProjectScope};
use crate::model::{Image, Instance};
use crate::poll::{complete, fetch, fetch_all};
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    CloudError, HandlerContext, ImageHandler, ImageInfo, ImageReqInfo, KeyValue, Result,
};
use serde_json::json;
use std::sync::Arc;

pub struct GcpImageHandler {
    api: Arc<dyn GcpApi>,
    scope: ProjectScope,
    ctx: HandlerContext,
}

impl GcpImageHandler {
    pub fn new(api: Arc<dyn GcpApi>, scope: ProjectScope, ctx: HandlerContext) -> Self {
        Self { api, scope, ctx }
    }

    /// Public images are addressed by partial URL, custom ones by name.
    fn path(&self, image_id: &str) -> String {
        if image_id.contains('/') {
            image_id.to_string()
        } else {
            format!("{}/{image_id}", self.scope.global("images"))
        }
    }
}

#[async_trait]
impl ImageHandler for GcpImageHandler {
    async fn create_image(&self, req: ImageReqInfo) -> Result<ImageInfo> {
        if found(self.api.get(&self.path(&req.name)).await)?.is_some() {
            return Err(CloudError::already_exists("Image", &req.name));
        }

        let instance: Instance =
            fetch(self.api.as_ref(), &self.scope.instance(&req.source_id)).await?;
        let disk = instance
            .boot_disk()
            .map(|d| d.source.clone())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                CloudError::InvalidRequest(format!("instance {} has no boot disk", req.source_id))
            })?;

        tracing::info!(parent: &self.ctx.span, name = %req.name, source = %req.source_id, "creating image");
        let op = self
            .api
            .post(
                &format!("{}?forceCreate=true", self.scope.global("images")),
                &json!({ "name": req.name, "sourceDisk": disk }),
            )
            .await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("create image {}", req.name),
            op,
        )
        .await?;

        self.get_image(&req.name).await
    }

    async fn list_image(&self) -> Result<Vec<ImageInfo>> {
        let images: Vec<Image> = fetch_all(self.api.as_ref(), &self.scope.global("images")).await?;
        Ok(images.iter().map(map_image).collect())
    }

    async fn get_image(&self, image_id: &str) -> Result<ImageInfo> {
        let image: Image = fetch(self.api.as_ref(), &self.path(image_id)).await?;
        Ok(map_image(&image))
    }

    async fn delete_image(&self, image_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, image_id, "deleting image");
        let op = self.api.delete(&self.path(image_id)).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("delete image {image_id}"),
            op,
        )
        .await?;
        Ok(true)
    }
}

pub fn map_image(image: &Image) -> ImageInfo {
    let features = image
        .guest_os_features
        .iter()
        .map(|f| f.kind.as_str())
        .collect::<Vec<_>>()
        .join(",");

    ImageInfo {
        id: image.name.clone(),
        name: image.name.clone(),
        guest_os: image.guest_os(),
        status: image.status.clone(),
        key_value_list: vec![
            KeyValue::new("SourceType", &image.source_type),
            KeyValue::new("SelfLink", &image.self_link),
            KeyValue::new("GuestOsFeature", features),
            KeyValue::new("DiskSizeGb", &image.disk_size_gb),
        ],
    }
}
