//! Virtual networks as subnets of the shared `CB-VNet` network
//!
//! Create runs find-or-create base network, reject duplicate name, allocate
//! CIDR, create subnet, find-or-create the shared router, then attach the
//! subnet to it. None of these steps is rolled back if a later one fails.
//! Delete detaches and removes the subnet only; the router and the base
//! network stay for later subnets.

use crate::api::OpenStackApi;
use crate::model::{CreateSubnet, Subnet};
use crate::network::{
    BASE_ROUTER_NAME, DNS_NAMESERVER, external_network_id, find_base_network, find_base_router,
};
use async_trait::async_trait;
use cloudspan_driver::{
    BASE_VNETWORK_CIDR, BASE_VNETWORK_NAME, CloudError, HandlerContext, KeyValue, Result,
    VNetworkHandler, VNetworkInfo, VNetworkReqInfo, next_subnet_cidr,
};
use std::sync::Arc;

pub struct OpenStackVNetworkHandler {
    api: Arc<dyn OpenStackApi>,
    ctx: HandlerContext,
    external_network: Option<String>,
}

impl OpenStackVNetworkHandler {
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

    async fn ensure_router(&self) -> Result<String> {
        if let Some(router) = find_base_router(self.api.as_ref()).await? {
            return Ok(router.id);
        }
        let gateway =
            external_network_id(self.api.as_ref(), self.external_network.as_deref()).await?;
        tracing::info!(parent: &self.ctx.span, %gateway, "creating {BASE_ROUTER_NAME}");
        Ok(self.api.create_router(BASE_ROUTER_NAME, &gateway).await?.id)
    }
}

#[async_trait]
impl VNetworkHandler for OpenStackVNetworkHandler {
    async fn create_vnetwork(&self, req: VNetworkReqInfo) -> Result<VNetworkInfo> {
        // subnets are always carved from the pool in order
        if let Some(prefix) = req.requested_prefix() {
            return Err(CloudError::InvalidRequest(format!(
                "subnet CIDR is allocated from {BASE_VNETWORK_CIDR}; {prefix} cannot be requested"
            )));
        }

        let base = match find_base_network(self.api.as_ref()).await? {
            Some(network) => network,
            None => {
                tracing::info!(parent: &self.ctx.span, "creating base network {BASE_VNETWORK_NAME}");
                self.api.create_network(BASE_VNETWORK_NAME).await?
            }
        };

        let existing = self.api.list_subnets(&base.id).await?;
        if existing.iter().any(|s| s.name == req.name) {
            return Err(CloudError::already_exists("VNetwork", &req.name));
        }

        let cidr = next_subnet_cidr(BASE_VNETWORK_CIDR, existing.iter().map(|s| &s.cidr))?;

        tracing::info!(parent: &self.ctx.span, name = %req.name, %cidr, "creating subnet");
        let subnet = self
            .api
            .create_subnet(&CreateSubnet {
                network_id: base.id,
                name: req.name,
                cidr,
                ip_version: 4,
                dns_nameservers: vec![DNS_NAMESERVER.to_string()],
            })
            .await?;

        let router_id = self.ensure_router().await?;
        self.api.add_router_interface(&router_id, &subnet.id).await?;

        self.get_vnetwork(&subnet.id).await
    }

    async fn list_vnetwork(&self) -> Result<Vec<VNetworkInfo>> {
        let Some(base) = find_base_network(self.api.as_ref()).await? else {
            return Ok(Vec::new());
        };
        Ok(self
            .api
            .list_subnets(&base.id)
            .await?
            .iter()
            .map(map_subnet)
            .collect())
    }

    async fn get_vnetwork(&self, vnetwork_id: &str) -> Result<VNetworkInfo> {
        Ok(map_subnet(&self.api.get_subnet(vnetwork_id).await?))
    }

    async fn delete_vnetwork(&self, vnetwork_id: &str) -> Result<bool> {
        let subnet = self.api.get_subnet(vnetwork_id).await?;

        if let Some(router) = find_base_router(self.api.as_ref()).await? {
            self.api
                .remove_router_interface(&router.id, &subnet.id)
                .await?;
        }

        tracing::info!(parent: &self.ctx.span, id = %subnet.id, "deleting subnet");
        self.api.delete_subnet(&subnet.id).await?;
        Ok(true)
    }
}

pub fn map_subnet(subnet: &Subnet) -> VNetworkInfo {
    let mut key_value_list = vec![KeyValue::new("NetworkId", &subnet.network_id)];
    if let Some(gateway) = &subnet.gateway_ip {
        key_value_list.push(KeyValue::new("GatewayIp", gateway));
    }
    if !subnet.dns_nameservers.is_empty() {
        key_value_list.push(KeyValue::new(
            "DnsNameservers",
            subnet.dns_nameservers.join(","),
        ));
    }

    VNetworkInfo {
        id: subnet.id.clone(),
        name: subnet.name.clone(),
        address_prefix: subnet.cidr.clone(),
        status: String::new(),
        key_value_list,
    }
}
