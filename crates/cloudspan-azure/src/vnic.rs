//! Network interfaces

use crate::api::{AzureApi, NETWORK, NETWORK_API_VERSION, ResourceScope, resource_name};
use crate::model::{NetworkInterface, PublicIpAddress};
use crate::poll::{complete, fetch, fetch_all};
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    BASE_VNETWORK_NAME, CloudError, HandlerContext, KeyValue, Result, VNicHandler, VNicInfo,
    VNicReqInfo,
};
use serde_json::json;
use std::sync::Arc;

const IP_CONFIG_NAME: &str = "ipConfig1";

pub struct AzureVNicHandler {
    api: Arc<dyn AzureApi>,
    scope: ResourceScope,
    ctx: HandlerContext,
}

impl AzureVNicHandler {
    pub fn new(api: Arc<dyn AzureApi>, scope: ResourceScope, ctx: HandlerContext) -> Self {
        Self { api, scope, ctx }
    }

    fn path(&self, id_or_name: &str) -> String {
        self.scope
            .path(NETWORK, "networkInterfaces", resource_name(id_or_name))
    }

    async fn public_ip_of(&self, nic: &NetworkInterface) -> Result<String> {
        let Some(public) = nic
            .primary_ip_configuration()
            .and_then(|c| c.public_ip_address.as_ref())
        else {
            return Ok(String::new());
        };
        let ip: PublicIpAddress = fetch(self.api.as_ref(), &public.id, NETWORK_API_VERSION).await?;
        Ok(ip.properties.ip_address.unwrap_or_default())
    }
}

/// Subnet id for a VNetwork id or name.
pub fn subnet_id(scope: &ResourceScope, vnetwork: &str) -> String {
    if vnetwork.starts_with("/subscriptions/") {
        vnetwork.to_string()
    } else {
        format!(
            "{}/subnets/{}",
            scope.path(NETWORK, "virtualNetworks", BASE_VNETWORK_NAME),
            vnetwork
        )
    }
}

/// Creates a NIC with one dynamic IP configuration and waits for it.
pub async fn put_nic(
    api: &dyn AzureApi,
    scope: &ResourceScope,
    ctx: &HandlerContext,
    req: &VNicReqInfo,
) -> Result<()> {
    if req.vnetwork_id.is_empty() {
        return Err(CloudError::InvalidRequest(
            "vnetwork_id is required for a network interface".into(),
        ));
    }

    let mut ip_config = json!({
        "name": IP_CONFIG_NAME,
        "properties": {
            "subnet": { "id": subnet_id(scope, &req.vnetwork_id) },
            "privateIPAllocationMethod": "Dynamic"
        }
    });
    if !req.public_ip_id.is_empty() {
        ip_config["properties"]["publicIPAddress"] = json!({
            "id": scope.resolve(NETWORK, "publicIPAddresses", &req.public_ip_id)
        });
    }

    let mut properties = json!({ "ipConfigurations": [ip_config] });
    if let Some(sg) = req.security_group_ids.first() {
        properties["networkSecurityGroup"] = json!({
            "id": scope.resolve(NETWORK, "networkSecurityGroups", sg)
        });
    }

    tracing::info!(parent: &ctx.span, name = %req.name, "creating network interface");
    let body = json!({ "location": scope.location, "properties": properties });
    let path = scope.path(NETWORK, "networkInterfaces", &req.name);
    let accepted = api.put(&path, NETWORK_API_VERSION, &body).await?;
    complete(
        api,
        ctx,
        &format!("create network interface {}", req.name),
        accepted,
    )
    .await?;
    Ok(())
}

#[async_trait]
impl VNicHandler for AzureVNicHandler {
    async fn create_vnic(&self, req: VNicReqInfo) -> Result<VNicInfo> {
        if found(self.api.get(&self.path(&req.name), NETWORK_API_VERSION).await)?.is_some() {
            return Err(CloudError::already_exists("VNic", &req.name));
        }
        put_nic(self.api.as_ref(), &self.scope, &self.ctx, &req).await?;
        self.get_vnic(&req.name).await
    }

    async fn list_vnic(&self) -> Result<Vec<VNicInfo>> {
        let nics: Vec<NetworkInterface> = fetch_all(
            self.api.as_ref(),
            &self.scope.collection(NETWORK, "networkInterfaces"),
            NETWORK_API_VERSION,
        )
        .await?;
        let ips: Vec<PublicIpAddress> = fetch_all(
            self.api.as_ref(),
            &self.scope.collection(NETWORK, "publicIPAddresses"),
            NETWORK_API_VERSION,
        )
        .await?;

        Ok(nics
            .iter()
            .map(|nic| {
                let public_ip = nic
                    .primary_ip_configuration()
                    .and_then(|c| c.public_ip_address.as_ref())
                    .and_then(|r| ips.iter().find(|ip| ip.id == r.id))
                    .and_then(|ip| ip.properties.ip_address.clone())
                    .unwrap_or_default();
                map_nic(nic, public_ip)
            })
            .collect())
    }

    async fn get_vnic(&self, vnic_id: &str) -> Result<VNicInfo> {
        let nic: NetworkInterface =
            fetch(self.api.as_ref(), &self.path(vnic_id), NETWORK_API_VERSION).await?;
        let public_ip = self.public_ip_of(&nic).await?;
        Ok(map_nic(&nic, public_ip))
    }

    async fn delete_vnic(&self, vnic_id: &str) -> Result<bool> {
        let path = self.path(vnic_id);
        self.api.get(&path, NETWORK_API_VERSION).await?;

        tracing::info!(parent: &self.ctx.span, vnic_id, "deleting network interface");
        let accepted = self.api.delete(&path, NETWORK_API_VERSION).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("delete network interface {vnic_id}"),
            accepted,
        )
        .await?;
        Ok(true)
    }
}

pub fn map_nic(nic: &NetworkInterface, public_ip: String) -> VNicInfo {
    let ip = nic.primary_ip_configuration();
    let mut key_value_list = Vec::new();
    if let Some(subnet) = ip.and_then(|c| c.subnet.as_ref()) {
        key_value_list.push(KeyValue::new("SubnetId", &subnet.id));
    }
    if let Some(private) = ip.and_then(|c| c.private_ip_address.as_ref()) {
        key_value_list.push(KeyValue::new("PrivateIp", private));
    }

    VNicInfo {
        id: nic.id.clone(),
        name: nic.name.clone(),
        owned_vm_id: nic
            .properties
            .virtual_machine
            .as_ref()
            .map(|vm| vm.id.clone())
            .unwrap_or_default(),
        mac_address: nic.properties.mac_address.clone(),
        security_group_ids: nic
            .properties
            .network_security_group
            .iter()
            .map(|sg| sg.id.clone())
            .collect(),
        public_ip,
        status: nic.properties.provisioning_state.clone(),
        key_value_list,
    }
}
