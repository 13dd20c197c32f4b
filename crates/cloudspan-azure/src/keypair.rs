//! SSH public key resources
//!
//! Without a caller-supplied public key, Azure generates the pair and
//! returns the private half once, from `generateKeyPair`.

use crate::api::{AzureApi, COMPUTE, COMPUTE_API_VERSION, ResourceScope, resource_name};
use crate::model::{GeneratedKeyPair, SshPublicKey};
use crate::poll::{complete, fetch, fetch_all};
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyPairHandler, KeyPairInfo, KeyPairReqInfo, KeyValue, Result,
};
use serde_json::json;
use std::sync::Arc;

pub struct AzureKeyPairHandler {
    api: Arc<dyn AzureApi>,
    scope: ResourceScope,
    ctx: HandlerContext,
}

impl AzureKeyPairHandler {
    pub fn new(api: Arc<dyn AzureApi>, scope: ResourceScope, ctx: HandlerContext) -> Self {
        Self { api, scope, ctx }
    }

    fn path(&self, id_or_name: &str) -> String {
        self.scope
            .path(COMPUTE, "sshPublicKeys", resource_name(id_or_name))
    }
}

#[async_trait]
impl KeyPairHandler for AzureKeyPairHandler {
    async fn create_key(&self, req: KeyPairReqInfo) -> Result<KeyPairInfo> {
        let path = self.path(&req.name);
        if found(self.api.get(&path, COMPUTE_API_VERSION).await)?.is_some() {
            return Err(CloudError::already_exists("KeyPair", &req.name));
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, imported = req.public_key.is_some(), "creating SSH public key");
        let mut properties = json!({});
        if let Some(public_key) = &req.public_key {
            properties["publicKey"] = json!(public_key);
        }
        let body = json!({ "location": self.scope.location, "properties": properties });
        let accepted = self.api.put(&path, COMPUTE_API_VERSION, &body).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("create key pair {}", req.name),
            accepted,
        )
        .await?;

        let private_key = if req.public_key.is_none() {
            let accepted = self
                .api
                .post(&format!("{path}/generateKeyPair"), COMPUTE_API_VERSION)
                .await?;
            let generated: GeneratedKeyPair = serde_json::from_value(accepted.body)?;
            generated.private_key
        } else {
            String::new()
        };

        let mut info = self.get_key(&req.name).await?;
        info.private_key = private_key;
        Ok(info)
    }

    async fn list_key(&self) -> Result<Vec<KeyPairInfo>> {
        let keys: Vec<SshPublicKey> = fetch_all(
            self.api.as_ref(),
            &self.scope.collection(COMPUTE, "sshPublicKeys"),
            COMPUTE_API_VERSION,
        )
        .await?;
        Ok(keys.iter().map(map_key).collect())
    }

    async fn get_key(&self, key_name: &str) -> Result<KeyPairInfo> {
        let key: SshPublicKey =
            fetch(self.api.as_ref(), &self.path(key_name), COMPUTE_API_VERSION).await?;
        Ok(map_key(&key))
    }

    async fn delete_key(&self, key_name: &str) -> Result<bool> {
        let path = self.path(key_name);
        self.api.get(&path, COMPUTE_API_VERSION).await?;

        tracing::info!(parent: &self.ctx.span, key_name, "deleting SSH public key");
        let accepted = self.api.delete(&path, COMPUTE_API_VERSION).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("delete key pair {key_name}"),
            accepted,
        )
        .await?;
        Ok(true)
    }
}

/// Public key text of a named key, used when building a VM's SSH config.
pub async fn public_key(api: &dyn AzureApi, scope: &ResourceScope, name: &str) -> Result<String> {
    let key: SshPublicKey = fetch(
        api,
        &scope.path(COMPUTE, "sshPublicKeys", resource_name(name)),
        COMPUTE_API_VERSION,
    )
    .await?;
    key.properties
        .public_key
        .ok_or_else(|| CloudError::InvalidRequest(format!("key pair {name} has no public key")))
}

pub fn map_key(key: &SshPublicKey) -> KeyPairInfo {
    KeyPairInfo {
        name: key.name.clone(),
        fingerprint: String::new(),
        public_key: key.properties.public_key.clone().unwrap_or_default(),
        private_key: String::new(),
        key_value_list: vec![KeyValue::new("ResourceId", &key.id)],
    }
}
