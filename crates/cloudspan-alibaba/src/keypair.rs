//! ECS SSH key pairs
//!
//! `DescribeKeyPairs` returns no public key material, so `public_key` is
//! only filled for imported keys, from the request.

use crate::api::{AlibabaApi, Service, describe_all, json_list, params};
use crate::model::KeyPair;
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyPairHandler, KeyPairInfo, KeyPairReqInfo, Result,
};
use std::sync::Arc;

pub struct AlibabaKeyPairHandler {
    api: Arc<dyn AlibabaApi>,
    ctx: HandlerContext,
}

impl AlibabaKeyPairHandler {
    pub fn new(api: Arc<dyn AlibabaApi>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }

    async fn describe(&self, key_name: &str) -> Result<KeyPair> {
        // KeyPairName also matches as a wildcard pattern
        let keys: Vec<KeyPair> = describe_all(
            self.api.as_ref(),
            Service::Ecs,
            "DescribeKeyPairs",
            params([("KeyPairName", key_name)]),
            "/KeyPairs/KeyPair",
        )
        .await?;
        keys.into_iter()
            .find(|k| k.key_pair_name == key_name)
            .ok_or_else(|| CloudError::NotFound(format!("key pair {key_name} does not exist")))
    }
}

#[async_trait]
impl KeyPairHandler for AlibabaKeyPairHandler {
    async fn create_key(&self, req: KeyPairReqInfo) -> Result<KeyPairInfo> {
        if found(self.describe(&req.name).await)?.is_some() {
            return Err(CloudError::already_exists("KeyPair", &req.name));
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, imported = req.public_key.is_some(), "creating key pair");
        let response = match req.public_key.as_deref() {
            Some(public_key) => {
                self.api
                    .call(
                        Service::Ecs,
                        "ImportKeyPair",
                        params([
                            ("KeyPairName", req.name.as_str()),
                            ("PublicKeyBody", public_key),
                        ]),
                    )
                    .await?
            }
            None => {
                self.api
                    .call(
                        Service::Ecs,
                        "CreateKeyPair",
                        params([("KeyPairName", req.name.as_str())]),
                    )
                    .await?
            }
        };
        let created: KeyPair = serde_json::from_value(response)?;

        let mut info = self.get_key(&req.name).await?;
        info.private_key = created.private_key_body.unwrap_or_default();
        info.public_key = req.public_key.unwrap_or_default();
        Ok(info)
    }

    async fn list_key(&self) -> Result<Vec<KeyPairInfo>> {
        let keys: Vec<KeyPair> = describe_all(
            self.api.as_ref(),
            Service::Ecs,
            "DescribeKeyPairs",
            Default::default(),
            "/KeyPairs/KeyPair",
        )
        .await?;
        Ok(keys.iter().map(map_key_pair).collect())
    }

    async fn get_key(&self, key_name: &str) -> Result<KeyPairInfo> {
        Ok(map_key_pair(&self.describe(key_name).await?))
    }

    async fn delete_key(&self, key_name: &str) -> Result<bool> {
        // DeleteKeyPairs ignores unknown names
        self.describe(key_name).await?;

        tracing::info!(parent: &self.ctx.span, key_name, "deleting key pair");
        self.api
            .call(
                Service::Ecs,
                "DeleteKeyPairs",
                params([("KeyPairNames", json_list(&[key_name]).as_str())]),
            )
            .await?;
        Ok(true)
    }
}

pub fn map_key_pair(key: &KeyPair) -> KeyPairInfo {
    KeyPairInfo {
        name: key.key_pair_name.clone(),
        fingerprint: key.key_pair_finger_print.clone(),
        ..Default::default()
    }
}
