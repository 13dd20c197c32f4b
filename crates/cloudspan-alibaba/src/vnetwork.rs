//! VSwitches of the shared base VPC

use crate::api::{AlibabaApi, Service, describe_all, describe_one, params, required_str};
use crate::model::{VSwitch, Vpc};
use async_trait::async_trait;
use cloudspan_driver::{
    BASE_VNETWORK_CIDR, BASE_VNETWORK_NAME, CloudError, HandlerContext, KeyValue, PollStatus,
    RegionInfo, Result, VNetworkHandler, VNetworkInfo, VNetworkReqInfo, next_subnet_cidr,
};
use std::sync::Arc;

const AVAILABLE: &str = "Available";

/// The base VPC, if it exists.
pub async fn base_vpc(api: &dyn AlibabaApi) -> Result<Option<Vpc>> {
    let vpcs: Vec<Vpc> = describe_all(
        api,
        Service::Vpc,
        "DescribeVpcs",
        params([("VpcName", BASE_VNETWORK_NAME)]),
        "/Vpcs/Vpc",
    )
    .await?;
    Ok(vpcs.into_iter().find(|v| v.vpc_name == BASE_VNETWORK_NAME))
}

pub async fn describe_vswitch(api: &dyn AlibabaApi, vswitch_id: &str) -> Result<VSwitch> {
    describe_one(
        api,
        Service::Vpc,
        "DescribeVSwitches",
        params([("VSwitchId", vswitch_id)]),
        "/VSwitches/VSwitch",
        &format!("vswitch {vswitch_id}"),
    )
    .await
}

pub struct AlibabaVNetworkHandler {
    api: Arc<dyn AlibabaApi>,
    ctx: HandlerContext,
    region: RegionInfo,
}

impl AlibabaVNetworkHandler {
    pub fn new(api: Arc<dyn AlibabaApi>, ctx: HandlerContext, region: RegionInfo) -> Self {
        Self { api, ctx, region }
    }

    async fn ensure_base_vpc(&self) -> Result<Vpc> {
        if let Some(vpc) = base_vpc(self.api.as_ref()).await? {
            return Ok(vpc);
        }

        tracing::info!(parent: &self.ctx.span, name = BASE_VNETWORK_NAME, cidr = BASE_VNETWORK_CIDR, "creating base VPC");
        let response = self
            .api
            .call(
                Service::Vpc,
                "CreateVpc",
                params([
                    ("VpcName", BASE_VNETWORK_NAME),
                    ("CidrBlock", BASE_VNETWORK_CIDR),
                ]),
            )
            .await?;
        let vpc_id = required_str(&response, "VpcId")?;

        let api = self.api.as_ref();
        let id = vpc_id.as_str();
        self.ctx
            .wait_for("create base VPC", move || async move {
                let vpc: Vpc = describe_one(
                    api,
                    Service::Vpc,
                    "DescribeVpcs",
                    params([("VpcId", id)]),
                    "/Vpcs/Vpc",
                    &format!("vpc {id}"),
                )
                .await?;
                Ok(if vpc.status == AVAILABLE {
                    PollStatus::Done(vpc)
                } else {
                    PollStatus::Pending
                })
            })
            .await
    }

    async fn vswitches(&self) -> Result<Vec<VSwitch>> {
        match base_vpc(self.api.as_ref()).await? {
            Some(vpc) => {
                describe_all(
                    self.api.as_ref(),
                    Service::Vpc,
                    "DescribeVSwitches",
                    params([("VpcId", vpc.vpc_id.as_str())]),
                    "/VSwitches/VSwitch",
                )
                .await
            }
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl VNetworkHandler for AlibabaVNetworkHandler {
    async fn create_vnetwork(&self, req: VNetworkReqInfo) -> Result<VNetworkInfo> {
        if self.region.zone.is_empty() {
            return Err(CloudError::InvalidRequest(
                "a zone is required to place a vswitch".into(),
            ));
        }
        let existing = self.vswitches().await?;
        if existing.iter().any(|s| s.vswitch_name == req.name) {
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

        tracing::info!(parent: &self.ctx.span, name = %req.name, %cidr, zone = %self.region.zone, "creating vswitch");
        let response = self
            .api
            .call(
                Service::Vpc,
                "CreateVSwitch",
                params([
                    ("VpcId", vpc.vpc_id.as_str()),
                    ("ZoneId", self.region.zone.as_str()),
                    ("CidrBlock", cidr.as_str()),
                    ("VSwitchName", req.name.as_str()),
                ]),
            )
            .await?;
        let vswitch_id = required_str(&response, "VSwitchId")?;

        let api = self.api.as_ref();
        let id = vswitch_id.as_str();
        self.ctx
            .wait_for(&format!("create vswitch {}", req.name), move || async move {
                let vswitch = describe_vswitch(api, id).await?;
                Ok(if vswitch.status == AVAILABLE {
                    PollStatus::Done(())
                } else {
                    PollStatus::Pending
                })
            })
            .await?;

        self.get_vnetwork(&vswitch_id).await
    }

    async fn list_vnetwork(&self) -> Result<Vec<VNetworkInfo>> {
        Ok(self.vswitches().await?.iter().map(map_vswitch).collect())
    }

    async fn get_vnetwork(&self, vnetwork_id: &str) -> Result<VNetworkInfo> {
        Ok(map_vswitch(
            &describe_vswitch(self.api.as_ref(), vnetwork_id).await?,
        ))
    }

    async fn delete_vnetwork(&self, vnetwork_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, vnetwork_id, "deleting vswitch");
        self.api
            .call(
                Service::Vpc,
                "DeleteVSwitch",
                params([("VSwitchId", vnetwork_id)]),
            )
            .await?;
        Ok(true)
    }
}

pub fn map_vswitch(vswitch: &VSwitch) -> VNetworkInfo {
    VNetworkInfo {
        id: vswitch.vswitch_id.clone(),
        name: vswitch.vswitch_name.clone(),
        address_prefix: vswitch.cidr_block.clone(),
        status: vswitch.status.clone(),
        key_value_list: vec![
            KeyValue::new("VpcId", &vswitch.vpc_id),
            KeyValue::new("ZoneId", &vswitch.zone_id),
            KeyValue::new(
                "AvailableIpAddressCount",
                vswitch.available_ip_address_count.to_string(),
            ),
        ],
    }
}
