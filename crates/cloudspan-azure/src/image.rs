//! Managed images captured from a VM

use crate::api::{AzureApi, COMPUTE, COMPUTE_API_VERSION, ResourceScope, resource_name};
use crate::model::Image;
use crate::poll::{complete, fetch, fetch_all};
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    CloudError, HandlerContext, ImageHandler, ImageInfo, ImageReqInfo, KeyValue, Result,
};
use serde_json::json;
use std::sync::Arc;

pub struct AzureImageHandler {
    api: Arc<dyn AzureApi>,
    scope: ResourceScope,
    ctx: HandlerContext,
}

impl AzureImageHandler {
    pub fn new(api: Arc<dyn AzureApi>, scope: ResourceScope, ctx: HandlerContext) -> Self {
        Self { api, scope, ctx }
    }

    fn path(&self, id_or_name: &str) -> String {
        self.scope
            .path(COMPUTE, "images", resource_name(id_or_name))
    }
}

#[async_trait]
impl ImageHandler for AzureImageHandler {
    async fn create_image(&self, req: ImageReqInfo) -> Result<ImageInfo> {
        let path = self.path(&req.name);
        if found(self.api.get(&path, COMPUTE_API_VERSION).await)?.is_some() {
            return Err(CloudError::already_exists("Image", &req.name));
        }
        if req.source_id.is_empty() {
            return Err(CloudError::InvalidRequest(
                "source_id (VM to capture) is required".into(),
            ));
        }

        let source = self
            .scope
            .resolve(COMPUTE, "virtualMachines", &req.source_id);
        tracing::info!(parent: &self.ctx.span, name = %req.name, %source, "capturing image");
        let body = json!({
            "location": self.scope.location,
            "properties": {
                "sourceVirtualMachine": { "id": source },
                "hyperVGeneration": "V1"
            }
        });
        let accepted = self.api.put(&path, COMPUTE_API_VERSION, &body).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("create image {}", req.name),
            accepted,
        )
        .await?;

        self.get_image(&req.name).await
    }

    async fn list_image(&self) -> Result<Vec<ImageInfo>> {
        let images: Vec<Image> = fetch_all(
            self.api.as_ref(),
            &self.scope.collection(COMPUTE, "images"),
            COMPUTE_API_VERSION,
        )
        .await?;
        Ok(images.iter().map(map_image).collect())
    }

    async fn get_image(&self, image_id: &str) -> Result<ImageInfo> {
        let image: Image = fetch(self.api.as_ref(), &self.path(image_id), COMPUTE_API_VERSION).await?;
        Ok(map_image(&image))
    }

    async fn delete_image(&self, image_id: &str) -> Result<bool> {
        let path = self.path(image_id);
        self.api.get(&path, COMPUTE_API_VERSION).await?;

        tracing::info!(parent: &self.ctx.span, image_id, "deleting image");
        let accepted = self.api.delete(&path, COMPUTE_API_VERSION).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("delete image {image_id}"),
            accepted,
        )
        .await?;
        Ok(true)
    }
}

pub fn map_image(image: &Image) -> ImageInfo {
    let props = &image.properties;
    let mut key_value_list = Vec::new();
    if let Some(source) = &props.source_virtual_machine {
        key_value_list.push(KeyValue::new("SourceVirtualMachine", &source.id));
    }
    if let Some(generation) = &props.hyper_v_generation {
        key_value_list.push(KeyValue::new("HyperVGeneration", generation));
    }
    if let Some(size) = props.storage_profile.os_disk.disk_size_gb {
        key_value_list.push(KeyValue::new("OsDiskSizeGb", size.to_string()));
    }

    ImageInfo {
        id: image.id.clone(),
        name: image.name.clone(),
        guest_os: props
            .storage_profile
            .os_disk
            .os_type
            .clone()
            .unwrap_or_default(),
        status: props.provisioning_state.clone(),
        key_value_list,
    }
}
