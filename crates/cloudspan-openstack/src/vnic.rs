//! Neutron ports as network interfaces

use crate::api::OpenStackApi;
use crate::model::{CreatePort, FixedIp, FloatingIp, Port};
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, Result, VNicHandler, VNicInfo, VNicReqInfo,
};
use std::sync::Arc;

pub struct OpenStackVNicHandler {
    api: Arc<dyn OpenStackApi>,
    ctx: HandlerContext,
}

impl OpenStackVNicHandler {
    pub fn new(api: Arc<dyn OpenStackApi>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }
}

#[async_trait]
impl VNicHandler for OpenStackVNicHandler {
    async fn create_vnic(&self, req: VNicReqInfo) -> Result<VNicInfo> {
        if self.api.list_ports().await?.iter().any(|p| p.name == req.name) {
            return Err(CloudError::already_exists("VNic", &req.name));
        }

        let subnet = self.api.get_subnet(&req.vnetwork_id).await?;
        tracing::info!(parent: &self.ctx.span, name = %req.name, subnet = %subnet.id, "creating port");
        let port = self
            .api
            .create_port(&CreatePort {
                network_id: subnet.network_id,
                name: req.name,
                fixed_ips: vec![FixedIp {
                    subnet_id: subnet.id,
                    ip_address: String::new(),
                }],
                security_groups: req.security_group_ids,
            })
            .await?;

        if !req.public_ip_id.is_empty() {
            self.api
                .update_floating_ip_port(&req.public_ip_id, Some(&port.id))
                .await?;
        }

        self.get_vnic(&port.id).await
    }

    async fn list_vnic(&self) -> Result<Vec<VNicInfo>> {
        let floating = self.api.list_floating_ips().await?;
        Ok(self
            .api
            .list_ports()
            .await?
            .iter()
            .map(|p| map_port(p, &floating))
            .collect())
    }

    async fn get_vnic(&self, vnic_id: &str) -> Result<VNicInfo> {
        let port = self.api.get_port(vnic_id).await?;
        let floating = self.api.list_floating_ips().await?;
        Ok(map_port(&port, &floating))
    }

    async fn delete_vnic(&self, vnic_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, vnic_id, "deleting port");
        self.api.delete_port(vnic_id).await?;
        Ok(true)
    }
}

pub fn map_port(port: &Port, floating: &[FloatingIp]) -> VNicInfo {
    let public_ip = floating
        .iter()
        .find(|f| f.port_id.as_deref() == Some(port.id.as_str()))
        .map(|f| f.floating_ip_address.clone())
        .unwrap_or_default();

    let mut key_value_list = vec![
        KeyValue::new("NetworkId", &port.network_id),
        KeyValue::new("DeviceOwner", &port.device_owner),
    ];
    if let Some(ip) = port.fixed_ips.first() {
        key_value_list.push(KeyValue::new("SubnetId", &ip.subnet_id));
        key_value_list.push(KeyValue::new("PrivateIp", &ip.ip_address));
    }

    VNicInfo {
        id: port.id.clone(),
        name: port.name.clone(),
        owned_vm_id: port.device_id.clone(),
        mac_address: port.mac_address.clone(),
        security_group_ids: port.security_groups.clone(),
        public_ip,
        status: port.status.clone(),
        key_value_list,
    }
}
