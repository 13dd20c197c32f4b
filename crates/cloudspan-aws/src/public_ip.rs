//! Elastic IP addresses
//!
//! Addresses are identified by allocation id and named through the `Name`
//! tag.

use crate::api::Ec2Api;
use crate::model::Address;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, PublicIpHandler, PublicIpInfo, PublicIpReqInfo, Result,
};
use std::sync::Arc;

pub struct AwsPublicIpHandler {
    api: Arc<dyn Ec2Api>,
    ctx: HandlerContext,
}

impl AwsPublicIpHandler {
    pub fn new(api: Arc<dyn Ec2Api>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }
}

#[async_trait]
impl PublicIpHandler for AwsPublicIpHandler {
    async fn create_public_ip(&self, req: PublicIpReqInfo) -> Result<PublicIpInfo> {
        if self
            .api
            .describe_addresses()
            .await?
            .iter()
            .any(|a| a.name == req.name)
        {
            return Err(CloudError::already_exists("PublicIP", &req.name));
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, "allocating elastic IP");
        let address = self.api.allocate_address(&req.name).await?;
        self.get_public_ip(&address.allocation_id).await
    }

    async fn list_public_ip(&self) -> Result<Vec<PublicIpInfo>> {
        Ok(self
            .api
            .describe_addresses()
            .await?
            .iter()
            .map(map_address)
            .collect())
    }

    async fn get_public_ip(&self, public_ip_id: &str) -> Result<PublicIpInfo> {
        Ok(map_address(&self.api.describe_address(public_ip_id).await?))
    }

    async fn delete_public_ip(&self, public_ip_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, public_ip_id, "releasing elastic IP");
        self.api.release_address(public_ip_id).await?;
        Ok(true)
    }
}

pub fn map_address(address: &Address) -> PublicIpInfo {
    let status = if address.association_id.is_empty() {
        "Available"
    } else {
        "InUse"
    };

    PublicIpInfo {
        id: address.allocation_id.clone(),
        name: address.name.clone(),
        public_ip: address.public_ip.clone(),
        owned_vm_id: address.instance_id.clone(),
        status: status.to_string(),
        key_value_list: vec![
            KeyValue::new("Domain", &address.domain),
            KeyValue::new("AssociationId", &address.association_id),
            KeyValue::new("NetworkInterfaceId", &address.network_interface_id),
        ],
    }
}
