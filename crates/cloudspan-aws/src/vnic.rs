//! Elastic network interfaces

use crate::api::Ec2Api;
use crate::model::NetworkInterface;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, Result, VNicHandler, VNicInfo, VNicReqInfo,
};
use std::sync::Arc;

pub struct AwsVNicHandler {
    api: Arc<dyn Ec2Api>,
    ctx: HandlerContext,
}

impl AwsVNicHandler {
    pub fn new(api: Arc<dyn Ec2Api>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }
}

#[async_trait]
impl VNicHandler for AwsVNicHandler {
    async fn create_vnic(&self, req: VNicReqInfo) -> Result<VNicInfo> {
        if self
            .api
            .describe_network_interfaces()
            .await?
            .iter()
            .any(|n| n.name == req.name)
        {
            return Err(CloudError::already_exists("VNic", &req.name));
        }
        if req.vnetwork_id.is_empty() {
            return Err(CloudError::InvalidRequest("vnetwork_id is required".into()));
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, subnet = %req.vnetwork_id, "creating network interface");
        let nic = self
            .api
            .create_network_interface(&req.name, &req.vnetwork_id, &req.security_group_ids)
            .await?;

        if !req.public_ip_id.is_empty() {
            self.api
                .associate_address(&req.public_ip_id, &nic.network_interface_id)
                .await?;
        }

        self.get_vnic(&nic.network_interface_id).await
    }

    async fn list_vnic(&self) -> Result<Vec<VNicInfo>> {
        Ok(self
            .api
            .describe_network_interfaces()
            .await?
            .iter()
            .map(map_interface)
            .collect())
    }

    async fn get_vnic(&self, vnic_id: &str) -> Result<VNicInfo> {
        Ok(map_interface(
            &self.api.describe_network_interface(vnic_id).await?,
        ))
    }

    async fn delete_vnic(&self, vnic_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, vnic_id, "deleting network interface");
        self.api.delete_network_interface(vnic_id).await?;
        Ok(true)
    }
}

pub fn map_interface(nic: &NetworkInterface) -> VNicInfo {
    VNicInfo {
        id: nic.network_interface_id.clone(),
        name: nic.name.clone(),
        owned_vm_id: nic.attached_instance_id.clone(),
        mac_address: nic.mac_address.clone(),
        security_group_ids: nic.group_ids.clone(),
        public_ip: nic.public_ip.clone(),
        status: nic.status.clone(),
        key_value_list: vec![
            KeyValue::new("SubnetId", &nic.subnet_id),
            KeyValue::new("VpcId", &nic.vpc_id),
            KeyValue::new("PrivateIp", &nic.private_ip),
        ],
    }
}
