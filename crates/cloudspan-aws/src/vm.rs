//! EC2 instances
//!
//! EC2 has no operation handles; waits poll the instance state until it
//! reaches the target.

use crate::api::Ec2Api;
use crate::model::{Instance, RunInstance};
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, PollStatus, RegionInfo, Result, VmHandler, VmInfo,
    VmReqInfo, VmStatus, VmStatusInfo,
};
use std::sync::Arc;

pub struct AwsVmHandler {
    api: Arc<dyn Ec2Api>,
    ctx: HandlerContext,
    region: RegionInfo,
}

impl AwsVmHandler {
    pub fn new(api: Arc<dyn Ec2Api>, ctx: HandlerContext, region: RegionInfo) -> Self {
        Self { api, ctx, region }
    }

    /// Polls until the instance reports `target`. Landing in `terminated`
    /// (or `shutting-down` when not terminating) fails the wait.
    async fn wait_state(&self, instance_id: &str, operation: &str, target: &str) -> Result<()> {
        let api = self.api.as_ref();
        self.ctx
            .wait_for(operation, move || async move {
                let instance = api.describe_instance(instance_id).await?;
                if instance.state == target {
                    return Ok(PollStatus::Done(()));
                }
                if target != "terminated"
                    && (instance.state == "terminated" || instance.state == "shutting-down")
                {
                    return Err(CloudError::OperationFailed {
                        operation: operation.to_string(),
                        message: format!("instance {instance_id} is {}", instance.state),
                    });
                }
                Ok(PollStatus::Pending)
            })
            .await
    }

    /// Live instance, treating `terminated` as gone.
    async fn live_instance(&self, vm_id: &str) -> Result<Instance> {
        let instance = self.api.describe_instance(vm_id).await?;
        if instance.state == "terminated" {
            return Err(CloudError::NotFound(format!("instance {vm_id} is terminated")));
        }
        Ok(instance)
    }
}

#[async_trait]
impl VmHandler for AwsVmHandler {
    async fn start_vm(&self, req: VmReqInfo) -> Result<VmInfo> {
        if self
            .api
            .describe_instances()
            .await?
            .iter()
            .any(|i| i.name == req.name)
        {
            return Err(CloudError::already_exists("VirtualMachine", &req.name));
        }

        let subnet_id = if req.subnet_id.is_empty() {
            req.vnetwork_id.clone()
        } else {
            req.subnet_id.clone()
        };
        if subnet_id.is_empty() && req.network_interface_id.is_empty() {
            return Err(CloudError::InvalidRequest(
                "subnet_id, vnetwork_id or network_interface_id is required".into(),
            ));
        }
        if req.key_pair_name.is_empty() {
            return Err(CloudError::InvalidRequest(
                "EC2 instances need key_pair_name".into(),
            ));
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, instance_type = %req.vm_spec_id, "running instance");
        let instance = self
            .api
            .run_instance(&RunInstance {
                name: req.name.clone(),
                image_id: req.image_id.clone(),
                instance_type: req.vm_spec_id.clone(),
                subnet_id,
                security_group_ids: req.security_group_ids.clone(),
                network_interface_id: req.network_interface_id.clone(),
                key_name: req.key_pair_name.clone(),
                client_token: req.client_token.clone(),
            })
            .await?;

        self.wait_state(
            &instance.instance_id,
            &format!("run instance {}", req.name),
            "running",
        )
        .await?;

        if !req.public_ip_id.is_empty() {
            let running = self.api.describe_instance(&instance.instance_id).await?;
            tracing::info!(parent: &self.ctx.span, instance = %running.instance_id, allocation = %req.public_ip_id, "associating elastic IP");
            self.api
                .associate_address(&req.public_ip_id, &running.network_interface_id)
                .await?;
        }

        self.get_vm(&instance.instance_id).await
    }

    async fn suspend_vm(&self, vm_id: &str) -> Result<VmStatus> {
        tracing::info!(parent: &self.ctx.span, vm_id, "stopping instance");
        self.api.stop_instance(vm_id).await?;
        self.wait_state(vm_id, &format!("stop {vm_id}"), "stopped")
            .await?;
        Ok(VmStatus::Suspended)
    }

    async fn resume_vm(&self, vm_id: &str) -> Result<VmStatus> {
        tracing::info!(parent: &self.ctx.span, vm_id, "starting instance");
        self.api.start_instance(vm_id).await?;
        self.wait_state(vm_id, &format!("start {vm_id}"), "running")
            .await?;
        Ok(VmStatus::Running)
    }

    async fn reboot_vm(&self, vm_id: &str) -> Result<VmStatus> {
        tracing::info!(parent: &self.ctx.span, vm_id, "rebooting instance");
        self.api.reboot_instance(vm_id).await?;
        self.wait_state(vm_id, &format!("reboot {vm_id}"), "running")
            .await?;
        Ok(VmStatus::Running)
    }

    async fn terminate_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.live_instance(vm_id).await?;

        tracing::info!(parent: &self.ctx.span, vm_id, "terminating instance");
        self.api.terminate_instance(vm_id).await?;
        self.wait_state(vm_id, &format!("terminate {vm_id}"), "terminated")
            .await?;
        Ok(VmStatus::Terminated)
    }

    async fn list_vm_status(&self) -> Result<Vec<VmStatusInfo>> {
        Ok(self
            .api
            .describe_instances()
            .await?
            .iter()
            .map(|i| VmStatusInfo::new(&i.instance_id, vm_status(&i.state), &i.state))
            .collect())
    }

    async fn get_vm_status(&self, vm_id: &str) -> Result<VmStatusInfo> {
        let instance = self.api.describe_instance(vm_id).await?;
        Ok(VmStatusInfo::new(
            &instance.instance_id,
            vm_status(&instance.state),
            &instance.state,
        ))
    }

    async fn list_vm(&self) -> Result<Vec<VmInfo>> {
        Ok(self
            .api
            .describe_instances()
            .await?
            .iter()
            .map(|i| map_instance(i, &self.region))
            .collect())
    }

    async fn get_vm(&self, vm_id: &str) -> Result<VmInfo> {
        Ok(map_instance(
            &self.api.describe_instance(vm_id).await?,
            &self.region,
        ))
    }
}

pub fn vm_status(state: &str) -> VmStatus {
    match state {
        "pending" => VmStatus::Creating,
        "running" => VmStatus::Running,
        "stopping" => VmStatus::Suspending,
        "stopped" => VmStatus::Suspended,
        "shutting-down" => VmStatus::Terminating,
        "terminated" => VmStatus::Terminated,
        _ => VmStatus::Unknown,
    }
}

pub fn map_instance(instance: &Instance, region: &RegionInfo) -> VmInfo {
    VmInfo {
        id: instance.instance_id.clone(),
        name: instance.name.clone(),
        region: RegionInfo::new(&region.region, &instance.availability_zone),
        image_id: instance.image_id.clone(),
        vm_spec_id: instance.instance_type.clone(),
        vnetwork_id: instance.subnet_id.clone(),
        subnet_id: instance.subnet_id.clone(),
        security_group_ids: instance.security_group_ids.clone(),
        network_interface_id: instance.network_interface_id.clone(),
        public_ip: instance.public_ip.clone(),
        private_ip: instance.private_ip.clone(),
        key_pair_name: instance.key_name.clone(),
        vm_boot_disk: instance.root_device_name.clone(),
        key_value_list: vec![
            KeyValue::new("State", &instance.state),
            KeyValue::new("VpcId", &instance.vpc_id),
            KeyValue::new("LaunchTime", &instance.launch_time),
        ],
        ..Default::default()
    }
}
