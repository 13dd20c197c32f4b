//! Virtual machine lifecycle
//!
//! Status comes from the instance view: `PowerState/*` and
//! `ProvisioningState/*` codes, reported together as `power(provisioning)`.

use crate::api::{
    AzureApi, COMPUTE, COMPUTE_API_VERSION, NETWORK, NETWORK_API_VERSION, ResourceScope,
    resource_name, vm_name_from_id,
};
use crate::keypair::public_key;
use crate::model::{
    ImageReference, InstanceView, NetworkInterface, PublicIpAddress, VirtualMachine,
};
use crate::poll::{complete, fetch, fetch_all};
use crate::vnic::put_nic;
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, RegionInfo, Result, VNicReqInfo, VmHandler, VmInfo,
    VmReqInfo, VmStatus, VmStatusInfo,
};
use serde_json::{Value, json};
use std::sync::Arc;

/// Admin user when the request names none
pub const DEFAULT_VM_USER: &str = "cb-user";

pub struct AzureVmHandler {
    api: Arc<dyn AzureApi>,
    scope: ResourceScope,
    ctx: HandlerContext,
    region: RegionInfo,
}

impl AzureVmHandler {
    pub fn new(
        api: Arc<dyn AzureApi>,
        scope: ResourceScope,
        ctx: HandlerContext,
        region: RegionInfo,
    ) -> Self {
        Self {
            api,
            scope,
            ctx,
            region,
        }
    }

    fn path(&self, id_or_name: &str) -> String {
        self.scope
            .path(COMPUTE, "virtualMachines", resource_name(id_or_name))
    }

    async fn network_interface(&self, req: &VmReqInfo) -> Result<String> {
        if !req.network_interface_id.is_empty() {
            return Ok(self
                .scope
                .resolve(NETWORK, "networkInterfaces", &req.network_interface_id));
        }

        let vnetwork = if req.subnet_id.is_empty() {
            &req.vnetwork_id
        } else {
            &req.subnet_id
        };
        let nic = VNicReqInfo {
            name: format!("{}-nic", req.name),
            vnetwork_id: vnetwork.clone(),
            security_group_ids: req.security_group_ids.clone(),
            public_ip_id: req.public_ip_id.clone(),
        };
        put_nic(self.api.as_ref(), &self.scope, &self.ctx, &nic).await?;
        Ok(self.scope.path(NETWORK, "networkInterfaces", &nic.name))
    }

    fn image_reference(&self, image_id: &str) -> ImageReference {
        if image_id.contains(':') || image_id.starts_with('/') {
            ImageReference::parse(image_id)
        } else {
            ImageReference::parse(&self.scope.path(COMPUTE, "images", image_id))
        }
    }

    async fn os_profile(&self, req: &VmReqInfo) -> Result<Value> {
        let user = if req.vm_user_id.is_empty() {
            DEFAULT_VM_USER
        } else {
            req.vm_user_id.as_str()
        };

        if !req.key_pair_name.is_empty() {
            let key = public_key(self.api.as_ref(), &self.scope, &req.key_pair_name).await?;
            return Ok(json!({
                "computerName": req.name,
                "adminUsername": user,
                "linuxConfiguration": {
                    "disablePasswordAuthentication": true,
                    "ssh": {
                        "publicKeys": [{
                            "path": format!("/home/{user}/.ssh/authorized_keys"),
                            "keyData": key
                        }]
                    }
                }
            }));
        }

        if req.vm_user_passwd.is_empty() {
            return Err(CloudError::InvalidRequest(
                "key_pair_name or vm_user_passwd is required".into(),
            ));
        }
        Ok(json!({
            "computerName": req.name,
            "adminUsername": user,
            "adminPassword": req.vm_user_passwd
        }))
    }

    async fn lifecycle(&self, vm_id: &str, action: &str, reached: VmStatus) -> Result<VmStatus> {
        tracing::info!(parent: &self.ctx.span, vm_id, action, "virtual machine action");
        let accepted = self
            .api
            .post(&format!("{}/{action}", self.path(vm_id)), COMPUTE_API_VERSION)
            .await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("{action} {vm_id}"),
            accepted,
        )
        .await?;
        Ok(reached)
    }

    async fn instance_view(&self, vm_name: &str) -> Result<InstanceView> {
        fetch(
            self.api.as_ref(),
            &format!("{}/instanceView", self.path(vm_name)),
            COMPUTE_API_VERSION,
        )
        .await
    }

    /// Primary NIC of the VM and the address of its public IP
    async fn network_details(
        &self,
        vm: &VirtualMachine,
    ) -> Result<(Option<NetworkInterface>, String)> {
        let Some(nic_ref) = vm.properties.network_profile.network_interfaces.first() else {
            return Ok((None, String::new()));
        };
        let nic: NetworkInterface = fetch(self.api.as_ref(), &nic_ref.id, NETWORK_API_VERSION).await?;

        let public_ip = match nic
            .primary_ip_configuration()
            .and_then(|c| c.public_ip_address.as_ref())
        {
            Some(ip_ref) => {
                let ip: PublicIpAddress =
                    fetch(self.api.as_ref(), &ip_ref.id, NETWORK_API_VERSION).await?;
                ip.properties.ip_address.unwrap_or_default()
            }
            None => String::new(),
        };
        Ok((Some(nic), public_ip))
    }

    async fn to_info(&self, vm: &VirtualMachine) -> Result<VmInfo> {
        let (nic, public_ip) = self.network_details(vm).await?;
        Ok(map_vm(vm, nic.as_ref(), public_ip, &self.region))
    }
}

#[async_trait]
impl VmHandler for AzureVmHandler {
    async fn start_vm(&self, req: VmReqInfo) -> Result<VmInfo> {
        let path = self.path(&req.name);
        if found(self.api.get(&path, COMPUTE_API_VERSION).await)?.is_some() {
            return Err(CloudError::already_exists("VirtualMachine", &req.name));
        }

        let os_profile = self.os_profile(&req).await?;
        let nic_id = self.network_interface(&req).await?;

        let mut body = json!({
            "location": self.scope.location,
            "properties": {
                "hardwareProfile": { "vmSize": req.vm_spec_id },
                "storageProfile": {
                    "imageReference": self.image_reference(&req.image_id),
                    "osDisk": {
                        "createOption": "FromImage",
                        "deleteOption": "Delete",
                        "managedDisk": { "storageAccountType": "Standard_LRS" }
                    }
                },
                "osProfile": os_profile,
                "networkProfile": {
                    "networkInterfaces": [{
                        "id": nic_id,
                        "properties": { "primary": true }
                    }]
                }
            }
        });
        if !self.region.zone.is_empty() {
            body["zones"] = json!([self.region.zone]);
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, "creating virtual machine");
        let accepted = self.api.put(&path, COMPUTE_API_VERSION, &body).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("create virtual machine {}", req.name),
            accepted,
        )
        .await?;

        self.get_vm(&req.name).await
    }

    async fn suspend_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.lifecycle(vm_id, "powerOff", VmStatus::Suspended).await
    }

    async fn resume_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.lifecycle(vm_id, "start", VmStatus::Running).await
    }

    async fn reboot_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.lifecycle(vm_id, "restart", VmStatus::Running).await
    }

    async fn terminate_vm(&self, vm_id: &str) -> Result<VmStatus> {
        let path = self.path(vm_id);
        self.api.get(&path, COMPUTE_API_VERSION).await?;

        tracing::info!(parent: &self.ctx.span, vm_id, "deleting virtual machine");
        let accepted = self.api.delete(&path, COMPUTE_API_VERSION).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("delete virtual machine {vm_id}"),
            accepted,
        )
        .await?;
        Ok(VmStatus::Terminated)
    }

    async fn list_vm_status(&self) -> Result<Vec<VmStatusInfo>> {
        let vms: Vec<VirtualMachine> = fetch_all(
            self.api.as_ref(),
            &format!(
                "{}?statusOnly=true",
                self.scope.collection(COMPUTE, "virtualMachines")
            ),
            COMPUTE_API_VERSION,
        )
        .await?;

        let mut statuses = Vec::with_capacity(vms.len());
        for vm in vms {
            let view = match vm.properties.instance_view {
                Some(view) => view,
                None => {
                    let name = vm_name_from_id(&vm.id).unwrap_or(&vm.name);
                    self.instance_view(name).await?
                }
            };
            statuses.push(status_info(&vm.id, &view));
        }
        Ok(statuses)
    }

    async fn get_vm_status(&self, vm_id: &str) -> Result<VmStatusInfo> {
        let view = self.instance_view(vm_id).await?;
        Ok(status_info(&self.path(vm_id), &view))
    }

    async fn list_vm(&self) -> Result<Vec<VmInfo>> {
        let vms: Vec<VirtualMachine> = fetch_all(
            self.api.as_ref(),
            &self.scope.collection(COMPUTE, "virtualMachines"),
            COMPUTE_API_VERSION,
        )
        .await?;

        let mut infos = Vec::with_capacity(vms.len());
        for vm in &vms {
            infos.push(self.to_info(vm).await?);
        }
        Ok(infos)
    }

    async fn get_vm(&self, vm_id: &str) -> Result<VmInfo> {
        let vm: VirtualMachine = fetch(
            self.api.as_ref(),
            &format!("{}?$expand=instanceView", self.path(vm_id)),
            COMPUTE_API_VERSION,
        )
        .await?;
        self.to_info(&vm).await
    }
}

/// `power(provisioning)`, a single state when only one is known, `-` when
/// neither is.
pub fn compose_status(power: Option<&str>, provisioning: Option<&str>) -> String {
    match (power, provisioning) {
        (Some(power), Some(provisioning)) => format!("{power}({provisioning})"),
        (Some(state), None) | (None, Some(state)) => state.to_string(),
        (None, None) => "-".to_string(),
    }
}

pub fn vm_status(power: Option<&str>, provisioning: Option<&str>) -> VmStatus {
    match provisioning {
        Some("creating") => return VmStatus::Creating,
        Some("deleting") => return VmStatus::Terminating,
        Some("failed") => return VmStatus::Failed,
        _ => {}
    }

    match power {
        Some("starting") => VmStatus::Resuming,
        Some("running") => VmStatus::Running,
        Some("stopping") | Some("deallocating") => VmStatus::Suspending,
        Some("stopped") | Some("deallocated") => VmStatus::Suspended,
        _ => VmStatus::Unknown,
    }
}

fn status_info(vm_id: &str, view: &InstanceView) -> VmStatusInfo {
    let power = view.power_state();
    let provisioning = view.provisioning_state();
    VmStatusInfo::new(
        vm_id,
        vm_status(power, provisioning),
        compose_status(power, provisioning),
    )
}

pub fn map_vm(
    vm: &VirtualMachine,
    nic: Option<&NetworkInterface>,
    public_ip: String,
    region: &RegionInfo,
) -> VmInfo {
    let props = &vm.properties;
    let ip = nic.and_then(|n| n.primary_ip_configuration());
    let subnet_id = ip
        .and_then(|c| c.subnet.as_ref())
        .map(|s| s.id.clone())
        .unwrap_or_default();

    let mut key_value_list = vec![KeyValue::new(
        "ProvisioningState",
        &props.provisioning_state,
    )];
    if !props.vm_id.is_empty() {
        key_value_list.push(KeyValue::new("VmId", &props.vm_id));
    }
    if let Some(created) = &props.time_created {
        key_value_list.push(KeyValue::new("TimeCreated", created));
    }
    if let Some(view) = &props.instance_view {
        key_value_list.push(KeyValue::new(
            "Status",
            compose_status(view.power_state(), view.provisioning_state()),
        ));
    }

    let location = if vm.location.is_empty() {
        region.region.clone()
    } else {
        vm.location.clone()
    };

    VmInfo {
        id: vm.id.clone(),
        name: vm.name.clone(),
        region: RegionInfo::new(location, vm.zones.first().cloned().unwrap_or_default()),
        image_id: props.storage_profile.image_reference.to_image_id(),
        vm_spec_id: props.hardware_profile.vm_size.clone(),
        vnetwork_id: subnet_id.clone(),
        subnet_id,
        security_group_ids: nic
            .and_then(|n| n.properties.network_security_group.as_ref())
            .map(|sg| vec![sg.id.clone()])
            .unwrap_or_default(),
        network_interface_id: nic.map(|n| n.id.clone()).unwrap_or_default(),
        public_ip,
        private_ip: ip
            .and_then(|c| c.private_ip_address.clone())
            .unwrap_or_default(),
        vm_user_id: props.os_profile.admin_username.clone(),
        vm_boot_disk: props.storage_profile.os_disk.name.clone(),
        key_value_list,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_status() {
        assert_eq!(
            compose_status(Some("running"), Some("succeeded")),
            "running(succeeded)"
        );
        assert_eq!(compose_status(Some("running"), None), "running");
        assert_eq!(compose_status(None, Some("creating")), "creating");
        assert_eq!(compose_status(None, None), "-");
    }

    #[test]
    fn test_vm_status_mapping() {
        assert_eq!(vm_status(Some("running"), Some("succeeded")), VmStatus::Running);
        assert_eq!(vm_status(Some("starting"), Some("succeeded")), VmStatus::Resuming);
        assert_eq!(vm_status(Some("deallocating"), None), VmStatus::Suspending);
        assert_eq!(vm_status(Some("deallocated"), Some("succeeded")), VmStatus::Suspended);
        assert_eq!(vm_status(Some("starting"), Some("creating")), VmStatus::Creating);
        assert_eq!(vm_status(Some("running"), Some("deleting")), VmStatus::Terminating);
        assert_eq!(vm_status(None, Some("failed")), VmStatus::Failed);
        assert_eq!(vm_status(None, None), VmStatus::Unknown);
    }
}
