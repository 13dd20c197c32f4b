//! Elastic network interfaces

use crate::api::{AlibabaApi, Params, Service, describe_all, describe_one, params, required_str};
use crate::model::NetworkInterface;
use crate::public_ip::associate_eip;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, PollStatus, Result, VNicHandler, VNicInfo, VNicReqInfo,
};
use std::sync::Arc;

async fn describe_interface(api: &dyn AlibabaApi, id: &str) -> Result<NetworkInterface> {
    describe_one(
        api,
        Service::Ecs,
        "DescribeNetworkInterfaces",
        params([("NetworkInterfaceId.1", id)]),
        "/NetworkInterfaceSets/NetworkInterfaceSet",
        &format!("network interface {id}"),
    )
    .await
}

pub struct AlibabaVNicHandler {
    api: Arc<dyn AlibabaApi>,
    ctx: HandlerContext,
}

impl AlibabaVNicHandler {
    pub fn new(api: Arc<dyn AlibabaApi>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }

    async fn interfaces(&self) -> Result<Vec<NetworkInterface>> {
        describe_all(
            self.api.as_ref(),
            Service::Ecs,
            "DescribeNetworkInterfaces",
            Params::new(),
            "/NetworkInterfaceSets/NetworkInterfaceSet",
        )
        .await
    }
}

#[async_trait]
impl VNicHandler for AlibabaVNicHandler {
    async fn create_vnic(&self, req: VNicReqInfo) -> Result<VNicInfo> {
        if self
            .interfaces()
            .await?
            .iter()
            .any(|n| n.network_interface_name == req.name)
        {
            return Err(CloudError::already_exists("VNic", &req.name));
        }
        let Some((first, rest)) = req.security_group_ids.split_first() else {
            return Err(CloudError::InvalidRequest(
                "network interfaces need at least one security group".into(),
            ));
        };

        let mut query = params([
            ("VSwitchId", req.vnetwork_id.as_str()),
            ("NetworkInterfaceName", req.name.as_str()),
            ("SecurityGroupId", first.as_str()),
        ]);
        for (n, group) in rest.iter().enumerate() {
            query.insert(format!("SecurityGroupIds.{}", n + 1), group.clone());
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, vswitch = %req.vnetwork_id, "creating network interface");
        let response = self
            .api
            .call(Service::Ecs, "CreateNetworkInterface", query)
            .await?;
        let nic_id = required_str(&response, "NetworkInterfaceId")?;

        let api = self.api.as_ref();
        let id = nic_id.as_str();
        self.ctx
            .wait_for(&format!("create network interface {}", req.name), move || async move {
                let nic = describe_interface(api, id).await?;
                Ok(if nic.status == "Available" {
                    PollStatus::Done(())
                } else {
                    PollStatus::Pending
                })
            })
            .await?;

        if !req.public_ip_id.is_empty() {
            associate_eip(
                self.api.as_ref(),
                &self.ctx,
                &req.public_ip_id,
                &nic_id,
                "NetworkInterface",
            )
            .await?;
        }

        self.get_vnic(&nic_id).await
    }

    async fn list_vnic(&self) -> Result<Vec<VNicInfo>> {
        Ok(self.interfaces().await?.iter().map(map_interface).collect())
    }

    async fn get_vnic(&self, vnic_id: &str) -> Result<VNicInfo> {
        Ok(map_interface(
            &describe_interface(self.api.as_ref(), vnic_id).await?,
        ))
    }

    async fn delete_vnic(&self, vnic_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, vnic_id, "deleting network interface");
        self.api
            .call(
                Service::Ecs,
                "DeleteNetworkInterface",
                params([("NetworkInterfaceId", vnic_id)]),
            )
            .await?;
        Ok(true)
    }
}

pub fn map_interface(nic: &NetworkInterface) -> VNicInfo {
    VNicInfo {
        id: nic.network_interface_id.clone(),
        name: nic.network_interface_name.clone(),
        owned_vm_id: nic.instance_id.clone(),
        mac_address: nic.mac_address.clone(),
        security_group_ids: nic.security_group_ids.security_group_id.clone(),
        public_ip: nic.associated_public_ip.public_ip_address.clone(),
        status: nic.status.clone(),
        key_value_list: vec![
            KeyValue::new("VSwitchId", &nic.vswitch_id),
            KeyValue::new("VpcId", &nic.vpc_id),
            KeyValue::new("PrivateIpAddress", &nic.private_ip_address),
            KeyValue::new("Type", &nic.kind),
        ],
    }
}
