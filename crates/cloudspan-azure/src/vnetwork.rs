//! Virtual networks as subnets of the shared `CB-VNet` virtual network

use crate::api::{AzureApi, NETWORK, NETWORK_API_VERSION, ResourceScope, resource_name};
use crate::model::Subnet;
use crate::poll::{complete, fetch, fetch_all};
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    BASE_VNETWORK_CIDR, BASE_VNETWORK_NAME, CloudError, HandlerContext, KeyValue, Result,
    VNetworkHandler, VNetworkInfo, VNetworkReqInfo, next_subnet_cidr,
};
use serde_json::json;
use std::sync::Arc;

pub struct AzureVNetworkHandler {
    api: Arc<dyn AzureApi>,
    scope: ResourceScope,
    ctx: HandlerContext,
}

impl AzureVNetworkHandler {
    pub fn new(api: Arc<dyn AzureApi>, scope: ResourceScope, ctx: HandlerContext) -> Self {
        Self { api, scope, ctx }
    }

    fn base_path(&self) -> String {
        self.scope
            .path(NETWORK, "virtualNetworks", BASE_VNETWORK_NAME)
    }

    fn subnet_path(&self, id_or_name: &str) -> String {
        format!("{}/subnets/{}", self.base_path(), resource_name(id_or_name))
    }

    async fn base_exists(&self) -> Result<bool> {
        Ok(found(self.api.get(&self.base_path(), NETWORK_API_VERSION).await)?.is_some())
    }

    async fn ensure_base(&self) -> Result<()> {
        if self.base_exists().await? {
            return Ok(());
        }

        tracing::info!(parent: &self.ctx.span, "creating base virtual network {BASE_VNETWORK_NAME}");
        let body = json!({
            "location": self.scope.location,
            "properties": {
                "addressSpace": { "addressPrefixes": [BASE_VNETWORK_CIDR] }
            }
        });
        let accepted = self
            .api
            .put(&self.base_path(), NETWORK_API_VERSION, &body)
            .await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            "create virtual network",
            accepted,
        )
        .await?;
        Ok(())
    }

    async fn subnets(&self) -> Result<Vec<Subnet>> {
        fetch_all(
            self.api.as_ref(),
            &format!("{}/subnets", self.base_path()),
            NETWORK_API_VERSION,
        )
        .await
    }
}

#[async_trait]
impl VNetworkHandler for AzureVNetworkHandler {
    async fn create_vnetwork(&self, req: VNetworkReqInfo) -> Result<VNetworkInfo> {
        self.ensure_base().await?;

        let existing = self.subnets().await?;
        if existing.iter().any(|s| s.name == req.name) {
            return Err(CloudError::already_exists("VNetwork", &req.name));
        }

        let cidr = match req.requested_prefix() {
            Some(prefix) => prefix.to_string(),
            None => next_subnet_cidr(
                BASE_VNETWORK_CIDR,
                existing.iter().map(|s| &s.properties.address_prefix),
            )?,
        };

        tracing::info!(parent: &self.ctx.span, name = %req.name, %cidr, "creating subnet");
        let path = self.subnet_path(&req.name);
        let body = json!({ "properties": { "addressPrefix": cidr } });
        let accepted = self.api.put(&path, NETWORK_API_VERSION, &body).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("create subnet {}", req.name),
            accepted,
        )
        .await?;

        self.get_vnetwork(&req.name).await
    }

    async fn list_vnetwork(&self) -> Result<Vec<VNetworkInfo>> {
        if !self.base_exists().await? {
            return Ok(Vec::new());
        }
        Ok(self.subnets().await?.iter().map(map_subnet).collect())
    }

    async fn get_vnetwork(&self, vnetwork_id: &str) -> Result<VNetworkInfo> {
        let subnet: Subnet = fetch(
            self.api.as_ref(),
            &self.subnet_path(vnetwork_id),
            NETWORK_API_VERSION,
        )
        .await?;
        Ok(map_subnet(&subnet))
    }

    async fn delete_vnetwork(&self, vnetwork_id: &str) -> Result<bool> {
        // ARM answers 204 for a DELETE of a missing resource
        let path = self.subnet_path(vnetwork_id);
        self.api.get(&path, NETWORK_API_VERSION).await?;

        tracing::info!(parent: &self.ctx.span, vnetwork_id, "deleting subnet");
        let accepted = self.api.delete(&path, NETWORK_API_VERSION).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("delete subnet {vnetwork_id}"),
            accepted,
        )
        .await?;
        Ok(true)
    }
}

pub fn map_subnet(subnet: &Subnet) -> VNetworkInfo {
    let mut key_value_list = vec![KeyValue::new("VirtualNetwork", BASE_VNETWORK_NAME)];
    if let Some(nsg) = &subnet.properties.network_security_group {
        key_value_list.push(KeyValue::new("NetworkSecurityGroup", &nsg.id));
    }

    VNetworkInfo {
        id: subnet.id.clone(),
        name: subnet.name.clone(),
        address_prefix: subnet.properties.address_prefix.clone(),
        status: subnet.properties.provisioning_state.clone(),
        key_value_list,
    }
}
