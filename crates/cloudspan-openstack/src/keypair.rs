//! Nova key pairs

use crate::api::OpenStackApi;
use crate::model::Keypair;
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyPairHandler, KeyPairInfo, KeyPairReqInfo, KeyValue, Result,
};
use std::sync::Arc;

pub struct OpenStackKeyPairHandler {
    api: Arc<dyn OpenStackApi>,
    ctx: HandlerContext,
}

impl OpenStackKeyPairHandler {
    pub fn new(api: Arc<dyn OpenStackApi>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }
}

#[async_trait]
impl KeyPairHandler for OpenStackKeyPairHandler {
    async fn create_key(&self, req: KeyPairReqInfo) -> Result<KeyPairInfo> {
        if found(self.api.get_keypair(&req.name).await)?.is_some() {
            return Err(CloudError::already_exists("KeyPair", &req.name));
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, imported = req.public_key.is_some(), "creating key pair");
        let created = self
            .api
            .create_keypair(&req.name, req.public_key.as_deref())
            .await?;

        // the private key is only ever returned by the create call
        let mut info = self.get_key(&created.name).await?;
        info.private_key = created.private_key.unwrap_or_default();
        Ok(info)
    }

    async fn list_key(&self) -> Result<Vec<KeyPairInfo>> {
        Ok(self
            .api
            .list_keypairs()
            .await?
            .iter()
            .map(map_keypair)
            .collect())
    }

    async fn get_key(&self, key_name: &str) -> Result<KeyPairInfo> {
        Ok(map_keypair(&self.api.get_keypair(key_name).await?))
    }

    async fn delete_key(&self, key_name: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, key_name, "deleting key pair");
        self.api.delete_keypair(key_name).await?;
        Ok(true)
    }
}

pub fn map_keypair(keypair: &Keypair) -> KeyPairInfo {
    KeyPairInfo {
        name: keypair.name.clone(),
        fingerprint: keypair.fingerprint.clone(),
        public_key: keypair.public_key.clone(),
        private_key: String::new(),
        key_value_list: keypair
            .key_type
            .iter()
            .map(|t| KeyValue::new("Type", t))
            .collect(),
    }
}
