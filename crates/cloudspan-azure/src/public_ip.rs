//! Static public IP addresses

use crate::api::{AzureApi, NETWORK, NETWORK_API_VERSION, ResourceScope, resource_name};
use crate::model::{NetworkInterface, PublicIpAddress};
use crate::poll::{complete, fetch, fetch_all};
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, PublicIpHandler, PublicIpInfo, PublicIpReqInfo, Result,
};
use serde_json::json;
use std::sync::Arc;

pub struct AzurePublicIpHandler {
    api: Arc<dyn AzureApi>,
    scope: ResourceScope,
    ctx: HandlerContext,
}

impl AzurePublicIpHandler {
    pub fn new(api: Arc<dyn AzureApi>, scope: ResourceScope, ctx: HandlerContext) -> Self {
        Self { api, scope, ctx }
    }

    fn path(&self, id_or_name: &str) -> String {
        self.scope
            .path(NETWORK, "publicIPAddresses", resource_name(id_or_name))
    }

    /// VM behind the NIC the address is bound to
    async fn owner(&self, ip: &PublicIpAddress) -> Result<String> {
        let Some(config) = &ip.properties.ip_configuration else {
            return Ok(String::new());
        };
        let nic: NetworkInterface =
            fetch(self.api.as_ref(), nic_path(&config.id), NETWORK_API_VERSION).await?;
        Ok(nic
            .properties
            .virtual_machine
            .map(|vm| vm.id)
            .unwrap_or_default())
    }
}

/// `.../networkInterfaces/nic/ipConfigurations/ipConfig1` -> `.../networkInterfaces/nic`
fn nic_path(ip_configuration_id: &str) -> &str {
    ip_configuration_id
        .find("/ipConfigurations/")
        .map(|idx| &ip_configuration_id[..idx])
        .unwrap_or(ip_configuration_id)
}

#[async_trait]
impl PublicIpHandler for AzurePublicIpHandler {
    async fn create_public_ip(&self, req: PublicIpReqInfo) -> Result<PublicIpInfo> {
        let path = self.path(&req.name);
        if found(self.api.get(&path, NETWORK_API_VERSION).await)?.is_some() {
            return Err(CloudError::already_exists("PublicIP", &req.name));
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, "allocating public IP");
        let body = json!({
            "location": self.scope.location,
            "sku": { "name": "Standard" },
            "properties": {
                "publicIPAllocationMethod": "Static",
                "publicIPAddressVersion": "IPv4"
            }
        });
        let accepted = self.api.put(&path, NETWORK_API_VERSION, &body).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("create public IP {}", req.name),
            accepted,
        )
        .await?;

        self.get_public_ip(&req.name).await
    }

    async fn list_public_ip(&self) -> Result<Vec<PublicIpInfo>> {
        let ips: Vec<PublicIpAddress> = fetch_all(
            self.api.as_ref(),
            &self.scope.collection(NETWORK, "publicIPAddresses"),
            NETWORK_API_VERSION,
        )
        .await?;
        let nics: Vec<NetworkInterface> = fetch_all(
            self.api.as_ref(),
            &self.scope.collection(NETWORK, "networkInterfaces"),
            NETWORK_API_VERSION,
        )
        .await?;

        Ok(ips
            .iter()
            .map(|ip| {
                let owner = ip
                    .properties
                    .ip_configuration
                    .as_ref()
                    .and_then(|c| nics.iter().find(|n| n.id == nic_path(&c.id)))
                    .and_then(|n| n.properties.virtual_machine.as_ref())
                    .map(|vm| vm.id.clone())
                    .unwrap_or_default();
                map_public_ip(ip, owner)
            })
            .collect())
    }

    async fn get_public_ip(&self, public_ip_id: &str) -> Result<PublicIpInfo> {
        let ip: PublicIpAddress =
            fetch(self.api.as_ref(), &self.path(public_ip_id), NETWORK_API_VERSION).await?;
        let owner = self.owner(&ip).await?;
        Ok(map_public_ip(&ip, owner))
    }

    async fn delete_public_ip(&self, public_ip_id: &str) -> Result<bool> {
        let path = self.path(public_ip_id);
        self.api.get(&path, NETWORK_API_VERSION).await?;

        tracing::info!(parent: &self.ctx.span, public_ip_id, "releasing public IP");
        let accepted = self.api.delete(&path, NETWORK_API_VERSION).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("delete public IP {public_ip_id}"),
            accepted,
        )
        .await?;
        Ok(true)
    }
}

pub fn map_public_ip(ip: &PublicIpAddress, owned_vm_id: String) -> PublicIpInfo {
    let mut key_value_list = vec![KeyValue::new(
        "AllocationMethod",
        &ip.properties.public_ip_allocation_method,
    )];
    if let Some(config) = &ip.properties.ip_configuration {
        key_value_list.push(KeyValue::new("IpConfiguration", &config.id));
    }

    PublicIpInfo {
        id: ip.id.clone(),
        name: ip.name.clone(),
        public_ip: ip.properties.ip_address.clone().unwrap_or_default(),
        owned_vm_id,
        status: ip.properties.provisioning_state.clone(),
        key_value_list,
    }
}
