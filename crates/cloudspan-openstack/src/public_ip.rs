//! Neutron floating IPs
//!
//! Floating IPs carry no name; the request name is stored in `description`.

use crate::api::OpenStackApi;
use crate::model::FloatingIp;
use crate::network::external_network_id;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, PublicIpHandler, PublicIpInfo, PublicIpReqInfo, Result,
};
use std::sync::Arc;

pub struct OpenStackPublicIpHandler {
    api: Arc<dyn OpenStackApi>,
    ctx: HandlerContext,
    external_network: Option<String>,
}

impl OpenStackPublicIpHandler {
    pub fn new(
        api: Arc<dyn OpenStackApi>,
        ctx: HandlerContext,
        external_network: Option<String>,
    ) -> Self {
        Self {
            api,
            ctx,
            external_network,
        }
    }

    /// Server owning the port the floating IP points at
    async fn owner(&self, ip: &FloatingIp) -> Result<String> {
        match ip.port_id.as_deref() {
            Some(port_id) => Ok(self.api.get_port(port_id).await?.device_id),
            None => Ok(String::new()),
        }
    }
}

#[async_trait]
impl PublicIpHandler for OpenStackPublicIpHandler {
    async fn create_public_ip(&self, req: PublicIpReqInfo) -> Result<PublicIpInfo> {
        if self
            .api
            .list_floating_ips()
            .await?
            .iter()
            .any(|ip| ip.description == req.name)
        {
            return Err(CloudError::already_exists("PublicIP", &req.name));
        }

        let network =
            external_network_id(self.api.as_ref(), self.external_network.as_deref()).await?;
        tracing::info!(parent: &self.ctx.span, name = %req.name, %network, "allocating floating IP");
        let ip = self.api.create_floating_ip(&network, &req.name).await?;

        self.get_public_ip(&ip.id).await
    }

    async fn list_public_ip(&self) -> Result<Vec<PublicIpInfo>> {
        let ips = self.api.list_floating_ips().await?;
        let ports = self.api.list_ports().await?;
        Ok(ips
            .iter()
            .map(|ip| {
                let owner = ip
                    .port_id
                    .as_deref()
                    .and_then(|id| ports.iter().find(|p| p.id == id))
                    .map(|p| p.device_id.clone())
                    .unwrap_or_default();
                map_floating_ip(ip, owner)
            })
            .collect())
    }

    async fn get_public_ip(&self, public_ip_id: &str) -> Result<PublicIpInfo> {
        let ip = self.api.get_floating_ip(public_ip_id).await?;
        let owner = self.owner(&ip).await?;
        Ok(map_floating_ip(&ip, owner))
    }

    async fn delete_public_ip(&self, public_ip_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, public_ip_id, "releasing floating IP");
        self.api.delete_floating_ip(public_ip_id).await?;
        Ok(true)
    }
}

pub fn map_floating_ip(ip: &FloatingIp, owned_vm_id: String) -> PublicIpInfo {
    let mut key_value_list = vec![KeyValue::new("FloatingNetworkId", &ip.floating_network_id)];
    if let Some(fixed) = &ip.fixed_ip_address {
        key_value_list.push(KeyValue::new("FixedIp", fixed));
    }

    PublicIpInfo {
        id: ip.id.clone(),
        name: ip.description.clone(),
        public_ip: ip.floating_ip_address.clone(),
        owned_vm_id,
        status: ip.status.clone(),
        key_value_list,
    }
}
