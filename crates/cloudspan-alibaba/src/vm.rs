//! ECS instances

use crate::api::{
    AlibabaApi, Params, Service, describe_all, describe_one, items, json_list, params,
};
use crate::model::Instance;
use crate::public_ip::associate_eip;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, PollStatus, RegionInfo, Result, VmHandler, VmInfo,
    VmReqInfo, VmStatus, VmStatusInfo,
};
use std::sync::Arc;

pub async fn describe_instance(api: &dyn AlibabaApi, instance_id: &str) -> Result<Instance> {
    describe_one(
        api,
        Service::Ecs,
        "DescribeInstances",
        params([("InstanceIds", json_list(&[instance_id]).as_str())]),
        "/Instances/Instance",
        &format!("instance {instance_id}"),
    )
    .await
}

pub struct AlibabaVmHandler {
    api: Arc<dyn AlibabaApi>,
    ctx: HandlerContext,
    region: RegionInfo,
}

impl AlibabaVmHandler {
    pub fn new(api: Arc<dyn AlibabaApi>, ctx: HandlerContext, region: RegionInfo) -> Self {
        Self { api, ctx, region }
    }

    async fn instances(&self) -> Result<Vec<Instance>> {
        describe_all(
            self.api.as_ref(),
            Service::Ecs,
            "DescribeInstances",
            Params::new(),
            "/Instances/Instance",
        )
        .await
    }

    async fn lifecycle(&self, action: &str, vm_id: &str, target: &str) -> Result<()> {
        tracing::info!(parent: &self.ctx.span, vm_id, action, "instance lifecycle call");
        self.api
            .call(Service::Ecs, action, params([("InstanceId", vm_id)]))
            .await?;
        self.wait_status(vm_id, &format!("{action} {vm_id}"), target)
            .await
    }

    async fn wait_status(&self, instance_id: &str, operation: &str, target: &str) -> Result<()> {
        let api = self.api.as_ref();
        self.ctx
            .wait_for(operation, move || async move {
                let instance = describe_instance(api, instance_id).await?;
                Ok(if instance.status == target {
                    PollStatus::Done(())
                } else {
                    PollStatus::Pending
                })
            })
            .await
    }
}

/// `RunInstances` parameters for one instance.
pub fn run_params(req: &VmReqInfo) -> Result<Params> {
    let vswitch_id = if req.subnet_id.is_empty() {
        &req.vnetwork_id
    } else {
        &req.subnet_id
    };
    if vswitch_id.is_empty() {
        return Err(CloudError::InvalidRequest(
            "subnet_id or vnetwork_id is required".into(),
        ));
    }
    if req.security_group_ids.is_empty() {
        return Err(CloudError::InvalidRequest(
            "ECS instances need at least one security group".into(),
        ));
    }

    let mut query = params([
        ("InstanceName", req.name.as_str()),
        ("ImageId", req.image_id.as_str()),
        ("InstanceType", req.vm_spec_id.as_str()),
        ("VSwitchId", vswitch_id.as_str()),
        ("Amount", "1"),
        ("InternetMaxBandwidthOut", "0"),
    ]);
    for (n, group) in req.security_group_ids.iter().enumerate() {
        query.insert(format!("SecurityGroupIds.{}", n + 1), group.clone());
    }
    if !req.key_pair_name.is_empty() {
        query.insert("KeyPairName".into(), req.key_pair_name.clone());
    } else if !req.vm_user_passwd.is_empty() {
        query.insert("Password".into(), req.vm_user_passwd.clone());
    } else {
        return Err(CloudError::InvalidRequest(
            "key_pair_name or vm_user_passwd is required".into(),
        ));
    }
    if let Some(token) = &req.client_token {
        query.insert("ClientToken".into(), token.clone());
    }
    Ok(query)
}

#[async_trait]
impl VmHandler for AlibabaVmHandler {
    async fn start_vm(&self, req: VmReqInfo) -> Result<VmInfo> {
        if self
            .instances()
            .await?
            .iter()
            .any(|i| i.instance_name == req.name)
        {
            return Err(CloudError::already_exists("VirtualMachine", &req.name));
        }
        let query = run_params(&req)?;

        tracing::info!(parent: &self.ctx.span, name = %req.name, instance_type = %req.vm_spec_id, "running instance");
        let response = self.api.call(Service::Ecs, "RunInstances", query).await?;
        let instance_id = items(&response, "/InstanceIdSets/InstanceIdSet")
            .first()
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                CloudError::vendor(
                    cloudspan_driver::ProviderKind::Alibaba,
                    "RunInstances returned no instance id",
                )
            })?;

        self.wait_status(&instance_id, &format!("run instance {}", req.name), "Running")
            .await?;

        if !req.network_interface_id.is_empty() {
            tracing::info!(parent: &self.ctx.span, instance = %instance_id, eni = %req.network_interface_id, "attaching network interface");
            self.api
                .call(
                    Service::Ecs,
                    "AttachNetworkInterface",
                    params([
                        ("NetworkInterfaceId", req.network_interface_id.as_str()),
                        ("InstanceId", instance_id.as_str()),
                    ]),
                )
                .await?;
        }
        if !req.public_ip_id.is_empty() {
            associate_eip(
                self.api.as_ref(),
                &self.ctx,
                &req.public_ip_id,
                &instance_id,
                "EcsInstance",
            )
            .await?;
        }

        self.get_vm(&instance_id).await
    }

    async fn suspend_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.lifecycle("StopInstance", vm_id, "Stopped").await?;
        Ok(VmStatus::Suspended)
    }

    async fn resume_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.lifecycle("StartInstance", vm_id, "Running").await?;
        Ok(VmStatus::Running)
    }

    async fn reboot_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.lifecycle("RebootInstance", vm_id, "Running").await?;
        Ok(VmStatus::Running)
    }

    async fn terminate_vm(&self, vm_id: &str) -> Result<VmStatus> {
        describe_instance(self.api.as_ref(), vm_id).await?;

        tracing::info!(parent: &self.ctx.span, vm_id, "deleting instance");
        self.api
            .call(
                Service::Ecs,
                "DeleteInstance",
                params([("InstanceId", vm_id), ("Force", "true")]),
            )
            .await?;

        let api = self.api.as_ref();
        self.ctx
            .wait_for(&format!("delete instance {vm_id}"), move || async move {
                match describe_instance(api, vm_id).await {
                    Ok(_) => Ok(PollStatus::Pending),
                    Err(err) if err.is_not_found() => Ok(PollStatus::Done(())),
                    Err(err) => Err(err),
                }
            })
            .await?;
        Ok(VmStatus::Terminated)
    }

    async fn list_vm_status(&self) -> Result<Vec<VmStatusInfo>> {
        Ok(self
            .instances()
            .await?
            .iter()
            .map(|i| VmStatusInfo::new(&i.instance_id, vm_status(&i.status), &i.status))
            .collect())
    }

    async fn get_vm_status(&self, vm_id: &str) -> Result<VmStatusInfo> {
        let instance = describe_instance(self.api.as_ref(), vm_id).await?;
        Ok(VmStatusInfo::new(
            &instance.instance_id,
            vm_status(&instance.status),
            &instance.status,
        ))
    }

    async fn list_vm(&self) -> Result<Vec<VmInfo>> {
        Ok(self
            .instances()
            .await?
            .iter()
            .map(|i| map_instance(i, &self.region))
            .collect())
    }

    async fn get_vm(&self, vm_id: &str) -> Result<VmInfo> {
        Ok(map_instance(
            &describe_instance(self.api.as_ref(), vm_id).await?,
            &self.region,
        ))
    }
}

pub fn vm_status(status: &str) -> VmStatus {
    match status {
        "Pending" => VmStatus::Creating,
        "Starting" => VmStatus::Resuming,
        "Running" => VmStatus::Running,
        "Stopping" => VmStatus::Suspending,
        "Stopped" => VmStatus::Suspended,
        _ => VmStatus::Unknown,
    }
}

pub fn map_instance(instance: &Instance, region: &RegionInfo) -> VmInfo {
    let vpc = &instance.vpc_attributes;
    VmInfo {
        id: instance.instance_id.clone(),
        name: instance.instance_name.clone(),
        region: RegionInfo::new(&region.region, &instance.zone_id),
        image_id: instance.image_id.clone(),
        vm_spec_id: instance.instance_type.clone(),
        vnetwork_id: vpc.vswitch_id.clone(),
        subnet_id: vpc.vswitch_id.clone(),
        security_group_ids: instance.security_group_ids.security_group_id.clone(),
        network_interface_id: instance
            .primary_interface()
            .unwrap_or_default()
            .to_string(),
        public_ip: instance.public_ip(),
        private_ip: vpc
            .private_ip_address
            .ip_address
            .first()
            .cloned()
            .unwrap_or_default(),
        key_pair_name: instance.key_pair_name.clone(),
        key_value_list: vec![
            KeyValue::new("Status", &instance.status),
            KeyValue::new("VpcId", &vpc.vpc_id),
            KeyValue::new("CreationTime", &instance.creation_time),
            KeyValue::new("InstanceChargeType", &instance.instance_charge_type),
        ],
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> VmReqInfo {
        VmReqInfo {
            name: "web-1".into(),
            image_id: "aliyun_3_x64_20G_alibase_20240819.vhd".into(),
            vm_spec_id: "ecs.t6-c1m1.large".into(),
            vnetwork_id: "vsw-1".into(),
            security_group_ids: vec!["sg-1".into(), "sg-2".into()],
            key_pair_name: "deploy".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_run_params() {
        let query = run_params(&VmReqInfo {
            client_token: Some("tok-1".into()),
            ..request()
        })
        .unwrap();
        assert_eq!(query["VSwitchId"], "vsw-1");
        assert_eq!(query["SecurityGroupIds.1"], "sg-1");
        assert_eq!(query["SecurityGroupIds.2"], "sg-2");
        assert_eq!(query["KeyPairName"], "deploy");
        assert_eq!(query["ClientToken"], "tok-1");
        assert!(!query.contains_key("Password"));
    }

    #[test]
    fn test_run_params_password_and_missing_auth() {
        let query = run_params(&VmReqInfo {
            key_pair_name: String::new(),
            vm_user_passwd: "S3cret!pass".into(),
            ..request()
        })
        .unwrap();
        assert_eq!(query["Password"], "S3cret!pass");
        assert!(!query.contains_key("ClientToken"));

        let err = run_params(&VmReqInfo {
            key_pair_name: String::new(),
            ..request()
        })
        .unwrap_err();
        assert!(matches!(err, CloudError::InvalidRequest(_)));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(vm_status("Pending"), VmStatus::Creating);
        assert_eq!(vm_status("Starting"), VmStatus::Resuming);
        assert_eq!(vm_status("Stopping"), VmStatus::Suspending);
        assert_eq!(vm_status("Stopped"), VmStatus::Suspended);
        assert_eq!(vm_status("Expired"), VmStatus::Unknown);
    }
}
