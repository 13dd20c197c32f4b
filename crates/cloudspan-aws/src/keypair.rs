//! EC2 key pairs

use crate::api::Ec2Api;
use crate::model::KeyPair;
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyPairHandler, KeyPairInfo, KeyPairReqInfo, KeyValue, Result,
};
use std::sync::Arc;

pub struct AwsKeyPairHandler {
    api: Arc<dyn Ec2Api>,
    ctx: HandlerContext,
}

impl AwsKeyPairHandler {
    pub fn new(api: Arc<dyn Ec2Api>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }
}

#[async_trait]
impl KeyPairHandler for AwsKeyPairHandler {
    async fn create_key(&self, req: KeyPairReqInfo) -> Result<KeyPairInfo> {
        if found(self.api.describe_key_pair(&req.name).await)?.is_some() {
            return Err(CloudError::already_exists("KeyPair", &req.name));
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, imported = req.public_key.is_some(), "creating key pair");
        let created = match req.public_key.as_deref() {
            Some(public_key) => self.api.import_key_pair(&req.name, public_key).await?,
            None => self.api.create_key_pair(&req.name).await?,
        };

        let mut info = self.get_key(&created.key_name).await?;
        info.private_key = created.private_key.unwrap_or_default();
        Ok(info)
    }

    async fn list_key(&self) -> Result<Vec<KeyPairInfo>> {
        Ok(self
            .api
            .describe_key_pairs()
            .await?
            .iter()
            .map(map_key_pair)
            .collect())
    }

    async fn get_key(&self, key_name: &str) -> Result<KeyPairInfo> {
        Ok(map_key_pair(&self.api.describe_key_pair(key_name).await?))
    }

    async fn delete_key(&self, key_name: &str) -> Result<bool> {
        // DeleteKeyPair succeeds for unknown names
        self.api.describe_key_pair(key_name).await?;

        tracing::info!(parent: &self.ctx.span, key_name, "deleting key pair");
        self.api.delete_key_pair(key_name).await?;
        Ok(true)
    }
}

pub fn map_key_pair(key: &KeyPair) -> KeyPairInfo {
    KeyPairInfo {
        name: key.key_name.clone(),
        fingerprint: key.fingerprint.clone(),
        public_key: key.public_key.clone(),
        private_key: String::new(),
        key_value_list: vec![
            KeyValue::new("KeyPairId", &key.key_pair_id),
            KeyValue::new("KeyType", &key.key_type),
        ],
    }
}
