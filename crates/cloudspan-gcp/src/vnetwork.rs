//! Subnetworks of the shared base network
//!
//! Compute Engine names must be lowercase, so the base network is
//! `cb-vnet`, created in custom subnet mode on first use.

use crate::api::{GcpApi, ProjectScope, resource_name};
use crate::model::{Network, Subnetwork};
use crate::poll::{complete, fetch, fetch_all};
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    BASE_VNETWORK_CIDR, BASE_VNETWORK_NAME, CloudError, HandlerContext, KeyValue, Result,
    VNetworkHandler, VNetworkInfo, VNetworkReqInfo, next_subnet_cidr,
};
use serde_json::json;
use std::sync::Arc;

pub fn base_network_name() -> String {
    BASE_VNETWORK_NAME.to_lowercase()
}

/// Partial URL of the base network, as accepted in request bodies.
pub fn base_network_path(scope: &ProjectScope) -> String {
    format!("{}/{}", scope.global("networks"), base_network_name())
}

pub fn subnetwork_path(scope: &ProjectScope, name: &str) -> String {
    format!("{}/{}", scope.regional("subnetworks"), resource_name(name))
}

pub struct GcpVNetworkHandler {
    api: Arc<dyn GcpApi>,
    scope: ProjectScope,
    ctx: HandlerContext,
}

impl GcpVNetworkHandler {
    pub fn new(api: Arc<dyn GcpApi>, scope: ProjectScope, ctx: HandlerContext) -> Self {
        Self { api, scope, ctx }
    }

    async fn ensure_base_network(&self) -> Result<Network> {
        let path = base_network_path(&self.scope);
        if let Some(network) = found(fetch::<Network>(self.api.as_ref(), &path).await)? {
            return Ok(network);
        }

        let name = base_network_name();
        tracing::info!(parent: &self.ctx.span, network = %name, "creating base network");
        let op = self
            .api
            .post(
                &self.scope.global("networks"),
                &json!({
                    "name": name,
                    "autoCreateSubnetworks": false,
                    "routingConfig": { "routingMode": "REGIONAL" }
                }),
            )
            .await?;
        complete(self.api.as_ref(), &self.ctx, "create base network", op).await?;
        fetch(self.api.as_ref(), &path).await
    }

    /// Subnetworks of the base network in this region
    async fn subnetworks(&self) -> Result<Vec<Subnetwork>> {
        let base = base_network_name();
        Ok(
            fetch_all::<Subnetwork>(self.api.as_ref(), &self.scope.regional("subnetworks"))
                .await?
                .into_iter()
                .filter(|s| resource_name(&s.network) == base)
                .collect(),
        )
    }

    /// CIDR ranges of the base network's subnetworks across all regions
    async fn network_ranges(&self, network: &Network) -> Result<Vec<String>> {
        let mut ranges = Vec::with_capacity(network.subnetworks.len());
        for link in &network.subnetworks {
            // deleted between the network read and this one
            if let Some(subnet) = found(fetch::<Subnetwork>(self.api.as_ref(), link).await)? {
                ranges.push(subnet.ip_cidr_range);
            }
        }
        Ok(ranges)
    }
}

#[async_trait]
impl VNetworkHandler for GcpVNetworkHandler {
    async fn create_vnetwork(&self, req: VNetworkReqInfo) -> Result<VNetworkInfo> {
        let existing = self.subnetworks().await?;
        if existing.iter().any(|s| s.name == req.name) {
            return Err(CloudError::already_exists("VNetwork", &req.name));
        }

        // the network is global, so the pool spans every region
        let network = self.ensure_base_network().await?;
        let cidr = match req.requested_prefix() {
            Some(prefix) => prefix.to_string(),
            None => next_subnet_cidr(BASE_VNETWORK_CIDR, &self.network_ranges(&network).await?)?,
        };

        tracing::info!(parent: &self.ctx.span, name = %req.name, %cidr, "creating subnetwork");
        let op = self
            .api
            .post(
                &self.scope.regional("subnetworks"),
                &json!({
                    "name": req.name,
                    "network": network.self_link,
                    "ipCidrRange": cidr
                }),
            )
            .await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("create subnetwork {}", req.name),
            op,
        )
        .await?;

        self.get_vnetwork(&req.name).await
    }

    async fn list_vnetwork(&self) -> Result<Vec<VNetworkInfo>> {
        Ok(self.subnetworks().await?.iter().map(map_subnetwork).collect())
    }

    async fn get_vnetwork(&self, vnetwork_id: &str) -> Result<VNetworkInfo> {
        let subnet: Subnetwork =
            fetch(self.api.as_ref(), &subnetwork_path(&self.scope, vnetwork_id)).await?;
        Ok(map_subnetwork(&subnet))
    }

    async fn delete_vnetwork(&self, vnetwork_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, vnetwork_id, "deleting subnetwork");
        let op = self
            .api
            .delete(&subnetwork_path(&self.scope, vnetwork_id))
            .await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("delete subnetwork {vnetwork_id}"),
            op,
        )
        .await?;
        Ok(true)
    }
}

pub fn map_subnetwork(subnet: &Subnetwork) -> VNetworkInfo {
    VNetworkInfo {
        id: subnet.name.clone(),
        name: subnet.name.clone(),
        address_prefix: subnet.ip_cidr_range.clone(),
        status: subnet.state.clone().unwrap_or_else(|| "READY".to_string()),
        key_value_list: vec![
            KeyValue::new("Network", resource_name(&subnet.network)),
            KeyValue::new("Region", resource_name(&subnet.region)),
            KeyValue::new("GatewayAddress", &subnet.gateway_address),
            KeyValue::new("SelfLink", &subnet.self_link),
        ],
    }
}
