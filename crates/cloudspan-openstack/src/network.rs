//! Shared base network, router and external network lookups

use crate::api::OpenStackApi;
use crate::model::{Network, Router};
use cloudspan_driver::{BASE_VNETWORK_NAME, CloudError, Result};

/// Router connecting every `CB-VNet` subnet to the external network
pub const BASE_ROUTER_NAME: &str = "CB-VNet-Router";

/// DNS server handed to every new subnet
pub const DNS_NAMESERVER: &str = "8.8.8.8";

/// Connection option naming the external (gateway / floating IP) network
pub const EXTERNAL_NETWORK_KEY: &str = "ExternalNetworkId";

pub async fn find_base_network(api: &dyn OpenStackApi) -> Result<Option<Network>> {
    Ok(api
        .list_networks()
        .await?
        .into_iter()
        .find(|n| n.name == BASE_VNETWORK_NAME))
}

pub async fn find_base_router(api: &dyn OpenStackApi) -> Result<Option<Router>> {
    Ok(api
        .list_routers()
        .await?
        .into_iter()
        .find(|r| r.name == BASE_ROUTER_NAME))
}

/// The configured external network, or the first network flagged
/// `router:external`.
pub async fn external_network_id(
    api: &dyn OpenStackApi,
    configured: Option<&str>,
) -> Result<String> {
    if let Some(id) = configured.filter(|id| !id.is_empty()) {
        return Ok(id.to_string());
    }
    api.list_networks()
        .await?
        .into_iter()
        .find(|n| n.external)
        .map(|n| n.id)
        .ok_or_else(|| {
            CloudError::InvalidConnection(format!(
                "no external network found; set {EXTERNAL_NETWORK_KEY}"
            ))
        })
}
