//! Elastic IP addresses (VPC API)

use crate::api::{AlibabaApi, Service, describe_all, describe_one, params, required_str};
use crate::model::EipAddress;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, PollStatus, PublicIpHandler, PublicIpInfo,
    PublicIpReqInfo, Result,
};
use std::sync::Arc;

pub async fn describe_eip(api: &dyn AlibabaApi, allocation_id: &str) -> Result<EipAddress> {
    describe_one(
        api,
        Service::Vpc,
        "DescribeEipAddresses",
        params([("AllocationId", allocation_id)]),
        "/EipAddresses/EipAddress",
        &format!("EIP {allocation_id}"),
    )
    .await
}

/// Binds an EIP to an ECS instance or network interface and waits until it
/// reports `InUse`.
pub async fn associate_eip(
    api: &dyn AlibabaApi,
    ctx: &HandlerContext,
    allocation_id: &str,
    instance_id: &str,
    instance_type: &str,
) -> Result<()> {
    tracing::info!(parent: &ctx.span, allocation_id, instance_id, instance_type, "associating EIP");
    api.call(
        Service::Vpc,
        "AssociateEipAddress",
        params([
            ("AllocationId", allocation_id),
            ("InstanceId", instance_id),
            ("InstanceType", instance_type),
        ]),
    )
    .await?;

    ctx.wait_for(&format!("associate EIP {allocation_id}"), move || async move {
        let eip = describe_eip(api, allocation_id).await?;
        Ok(if eip.status == "InUse" {
            PollStatus::Done(())
        } else {
            PollStatus::Pending
        })
    })
    .await
}

pub struct AlibabaPublicIpHandler {
    api: Arc<dyn AlibabaApi>,
    ctx: HandlerContext,
}

impl AlibabaPublicIpHandler {
    pub fn new(api: Arc<dyn AlibabaApi>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }
}

#[async_trait]
impl PublicIpHandler for AlibabaPublicIpHandler {
    async fn create_public_ip(&self, req: PublicIpReqInfo) -> Result<PublicIpInfo> {
        let existing: Vec<EipAddress> = describe_all(
            self.api.as_ref(),
            Service::Vpc,
            "DescribeEipAddresses",
            Default::default(),
            "/EipAddresses/EipAddress",
        )
        .await?;
        if existing.iter().any(|e| e.name == req.name) {
            return Err(CloudError::already_exists("PublicIP", &req.name));
        }

        let mut query = params([("Name", req.name.as_str())]);
        for kv in &req.key_value_list {
            // Bandwidth, InternetChargeType, ISP, ...
            query.insert(kv.key.clone(), kv.value.clone());
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, "allocating EIP");
        let response = self
            .api
            .call(Service::Vpc, "AllocateEipAddress", query)
            .await?;
        let allocation_id = required_str(&response, "AllocationId")?;

        self.get_public_ip(&allocation_id).await
    }

    async fn list_public_ip(&self) -> Result<Vec<PublicIpInfo>> {
        let eips: Vec<EipAddress> = describe_all(
            self.api.as_ref(),
            Service::Vpc,
            "DescribeEipAddresses",
            Default::default(),
            "/EipAddresses/EipAddress",
        )
        .await?;
        Ok(eips.iter().map(map_eip).collect())
    }

    async fn get_public_ip(&self, public_ip_id: &str) -> Result<PublicIpInfo> {
        Ok(map_eip(&describe_eip(self.api.as_ref(), public_ip_id).await?))
    }

    async fn delete_public_ip(&self, public_ip_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, public_ip_id, "releasing EIP");
        self.api
            .call(
                Service::Vpc,
                "ReleaseEipAddress",
                params([("AllocationId", public_ip_id)]),
            )
            .await?;
        Ok(true)
    }
}

pub fn map_eip(eip: &EipAddress) -> PublicIpInfo {
    let owned_vm_id = if eip.instance_type == "EcsInstance" {
        eip.instance_id.clone()
    } else {
        String::new()
    };

    PublicIpInfo {
        id: eip.allocation_id.clone(),
        name: eip.name.clone(),
        public_ip: eip.ip_address.clone(),
        owned_vm_id,
        status: eip.status.clone(),
        key_value_list: vec![
            KeyValue::new("InstanceType", &eip.instance_type),
            KeyValue::new("InstanceId", &eip.instance_id),
            KeyValue::new("Bandwidth", &eip.bandwidth),
            KeyValue::new("InternetChargeType", &eip.internet_charge_type),
        ],
    }
}
