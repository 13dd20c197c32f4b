//! Subnets of the shared base VPC
//!
//! The base VPC is found by its `Name` tag. On first creation it also gets
//! an internet gateway and a default route.

use crate::api::Ec2Api;
use crate::model::{Subnet, Vpc};
use async_trait::async_trait;
use cloudspan_driver::{
    BASE_VNETWORK_CIDR, BASE_VNETWORK_NAME, CloudError, HandlerContext, KeyValue, PollStatus,
    RegionInfo, Result, VNetworkHandler, VNetworkInfo, VNetworkReqInfo, next_subnet_cidr,
};
use std::sync::Arc;

pub struct AwsVNetworkHandler {
    api: Arc<dyn Ec2Api>,
    ctx: HandlerContext,
    region: RegionInfo,
}

/// The base VPC, if it exists.
pub async fn base_vpc(api: &dyn Ec2Api) -> Result<Option<Vpc>> {
    Ok(api
        .describe_vpcs_by_name(BASE_VNETWORK_NAME)
        .await?
        .into_iter()
        .next())
}

impl AwsVNetworkHandler {
    pub fn new(api: Arc<dyn Ec2Api>, ctx: HandlerContext, region: RegionInfo) -> Self {
        Self { api, ctx, region }
    }

    async fn ensure_base_vpc(&self) -> Result<Vpc> {
        if let Some(vpc) = base_vpc(self.api.as_ref()).await? {
            return Ok(vpc);
        }

        tracing::info!(parent: &self.ctx.span, name = BASE_VNETWORK_NAME, cidr = BASE_VNETWORK_CIDR, "creating base VPC");
        let vpc = self
            .api
            .create_vpc(BASE_VNETWORK_NAME, BASE_VNETWORK_CIDR)
            .await?;
        let gateway = self.api.attach_internet_gateway(&vpc.vpc_id).await?;
        tracing::debug!(parent: &self.ctx.span, vpc = %vpc.vpc_id, %gateway, "internet gateway attached");
        Ok(vpc)
    }

    async fn subnets(&self) -> Result<Vec<Subnet>> {
        match base_vpc(self.api.as_ref()).await? {
            Some(vpc) => self.api.describe_subnets(&vpc.vpc_id).await,
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl VNetworkHandler for AwsVNetworkHandler {
    async fn create_vnetwork(&self, req: VNetworkReqInfo) -> Result<VNetworkInfo> {
        let existing = self.subnets().await?;
        if existing.iter().any(|s| s.name == req.name) {
            return Err(CloudError::already_exists("VNetwork", &req.name));
        }

        let vpc = self.ensure_base_vpc().await?;
        let cidr = match req.requested_prefix() {
            Some(prefix) => prefix.to_string(),
            None => next_subnet_cidr(
                BASE_VNETWORK_CIDR,
                existing.iter().map(|s| s.cidr_block.as_str()),
            )?,
        };

        tracing::info!(parent: &self.ctx.span, name = %req.name, %cidr, "creating subnet");
        let subnet = self
            .api
            .create_subnet(&vpc.vpc_id, &req.name, &cidr, &self.region.zone)
            .await?;

        let api = self.api.as_ref();
        let id = subnet.subnet_id.as_str();
        self.ctx
            .wait_for(&format!("create subnet {}", req.name), move || async move {
                let subnet = api.describe_subnet(id).await?;
                Ok(if subnet.state == "available" {
                    PollStatus::Done(())
                } else {
                    PollStatus::Pending
                })
            })
            .await?;

        self.get_vnetwork(&subnet.subnet_id).await
    }

    async fn list_vnetwork(&self) -> Result<Vec<VNetworkInfo>> {
        Ok(self.subnets().await?.iter().map(map_subnet).collect())
    }

    async fn get_vnetwork(&self, vnetwork_id: &str) -> Result<VNetworkInfo> {
        Ok(map_subnet(&self.api.describe_subnet(vnetwork_id).await?))
    }

    async fn delete_vnetwork(&self, vnetwork_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, vnetwork_id, "deleting subnet");
        self.api.delete_subnet(vnetwork_id).await?;
        Ok(true)
    }
}

pub fn map_subnet(subnet: &Subnet) -> VNetworkInfo {
    VNetworkInfo {
        id: subnet.subnet_id.clone(),
        name: subnet.name.clone(),
        address_prefix: subnet.cidr_block.clone(),
        status: subnet.state.clone(),
        key_value_list: vec![
            KeyValue::new("VpcId", &subnet.vpc_id),
            KeyValue::new("AvailabilityZone", &subnet.availability_zone),
        ],
    }
}
