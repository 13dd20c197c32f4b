//! Compute Engine instances
//!
//! Instances are addressed by name inside the connection's zone. A stopped
//! instance reports `TERMINATED`, which maps to [`VmStatus::Suspended`].

use crate::api::{GcpApi, ProjectScope, resource_name};
use crate::model::{Disk, Instance};
use crate::poll::{complete, fetch, fetch_all};
use crate::vnetwork::subnetwork_path;
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, RegionInfo, Result, VmHandler, VmInfo, VmReqInfo,
    VmStatus, VmStatusInfo,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Value, json};
use std::sync::Arc;

pub struct GcpVmHandler {
    api: Arc<dyn GcpApi>,
    scope: ProjectScope,
    ctx: HandlerContext,
    region: RegionInfo,
}

impl GcpVmHandler {
    pub fn new(
        api: Arc<dyn GcpApi>,
        scope: ProjectScope,
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

    /// Image names resolve inside the project; anything with a slash is
    /// taken as a partial URL (`projects/debian-cloud/global/images/family/debian-12`).
    fn source_image(&self, image_id: &str) -> String {
        if image_id.contains('/') {
            image_id.to_string()
        } else {
            format!("{}/{image_id}", self.scope.global("images"))
        }
    }

    fn insert_body(&self, req: &VmReqInfo) -> Result<Value> {
        let subnet = if req.subnet_id.is_empty() {
            &req.vnetwork_id
        } else {
            &req.subnet_id
        };
        if subnet.is_empty() {
            return Err(CloudError::InvalidRequest(
                "vnetwork_id or subnet_id is required".into(),
            ));
        }

        Ok(json!({
            "name": req.name,
            "machineType": format!("{}/{}", self.scope.zonal("machineTypes"), req.vm_spec_id),
            "disks": [{
                "boot": true,
                "autoDelete": true,
                "initializeParams": { "sourceImage": self.source_image(&req.image_id) }
            }],
            "networkInterfaces": [{
                "subnetwork": subnetwork_path(&self.scope, subnet),
                "accessConfigs": [{ "name": "External NAT", "type": "ONE_TO_ONE_NAT" }]
            }],
            "tags": { "items": req.security_group_ids },
            "metadata": {
                "items": [{ "key": "enable-oslogin", "value": "TRUE" }]
            }
        }))
    }

    async fn lifecycle(&self, vm_id: &str, action: &str, reached: VmStatus) -> Result<VmStatus> {
        tracing::info!(parent: &self.ctx.span, vm_id, action, "instance action");
        let op = self
            .api
            .post(&format!("{}/{action}", self.scope.instance(vm_id)), &json!({}))
            .await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("{action} {vm_id}"),
            op,
        )
        .await?;
        Ok(reached)
    }

    async fn to_info(&self, instance: &Instance) -> Result<VmInfo> {
        let disk = match instance.boot_disk() {
            Some(attached) if !attached.source.is_empty() => {
                found(fetch::<Disk>(self.api.as_ref(), &attached.source).await)?
            }
            _ => None,
        };
        Ok(map_vm(instance, disk.as_ref(), &self.region))
    }
}

#[async_trait]
impl VmHandler for GcpVmHandler {
    async fn start_vm(&self, req: VmReqInfo) -> Result<VmInfo> {
        if found(self.api.get(&self.scope.instance(&req.name)).await)?.is_some() {
            return Err(CloudError::already_exists("VirtualMachine", &req.name));
        }

        let body = self.insert_body(&req)?;
        let mut path = self.scope.zonal("instances");
        if let Some(token) = req.client_token.as_deref() {
            path = format!(
                "{path}?requestId={}",
                utf8_percent_encode(token, NON_ALPHANUMERIC)
            );
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, machine_type = %req.vm_spec_id, "inserting instance");
        let op = self.api.post(&path, &body).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("insert instance {}", req.name),
            op,
        )
        .await?;

        self.get_vm(&req.name).await
    }

    async fn suspend_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.lifecycle(vm_id, "stop", VmStatus::Suspended).await
    }

    async fn resume_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.lifecycle(vm_id, "start", VmStatus::Running).await
    }

    async fn reboot_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.lifecycle(vm_id, "reset", VmStatus::Running).await
    }

    async fn terminate_vm(&self, vm_id: &str) -> Result<VmStatus> {
        tracing::info!(parent: &self.ctx.span, vm_id, "deleting instance");
        let op = self.api.delete(&self.scope.instance(vm_id)).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("delete instance {vm_id}"),
            op,
        )
        .await?;
        Ok(VmStatus::Terminated)
    }

    async fn list_vm_status(&self) -> Result<Vec<VmStatusInfo>> {
        let instances: Vec<Instance> =
            fetch_all(self.api.as_ref(), &self.scope.zonal("instances")).await?;
        Ok(instances
            .iter()
            .map(|i| VmStatusInfo::new(&i.name, vm_status(&i.status), &i.status))
            .collect())
    }

    async fn get_vm_status(&self, vm_id: &str) -> Result<VmStatusInfo> {
        let instance: Instance = fetch(self.api.as_ref(), &self.scope.instance(vm_id)).await?;
        Ok(VmStatusInfo::new(
            &instance.name,
            vm_status(&instance.status),
            &instance.status,
        ))
    }

    async fn list_vm(&self) -> Result<Vec<VmInfo>> {
        let instances: Vec<Instance> =
            fetch_all(self.api.as_ref(), &self.scope.zonal("instances")).await?;
        let mut infos = Vec::with_capacity(instances.len());
        for instance in &instances {
            infos.push(self.to_info(instance).await?);
        }
        Ok(infos)
    }

    async fn get_vm(&self, vm_id: &str) -> Result<VmInfo> {
        let instance: Instance = fetch(self.api.as_ref(), &self.scope.instance(vm_id)).await?;
        self.to_info(&instance).await
    }
}

pub fn vm_status(status: &str) -> VmStatus {
    match status {
        "PROVISIONING" | "STAGING" => VmStatus::Creating,
        "RUNNING" => VmStatus::Running,
        "STOPPING" | "SUSPENDING" => VmStatus::Suspending,
        "STOPPED" | "SUSPENDED" | "TERMINATED" => VmStatus::Suspended,
        _ => VmStatus::Unknown,
    }
}

pub fn map_vm(instance: &Instance, disk: Option<&Disk>, region: &RegionInfo) -> VmInfo {
    let nic = instance.network_interfaces.first();
    let external = nic.and_then(|n| n.external());
    let subnet = nic
        .map(|n| resource_name(&n.subnetwork).to_string())
        .unwrap_or_default();

    let mut key_value_list = vec![
        KeyValue::new("InstanceId", &instance.id),
        KeyValue::new("Status", &instance.status),
        KeyValue::new("CreationTimestamp", &instance.creation_timestamp),
    ];
    if let Some(nic) = nic {
        key_value_list.push(KeyValue::new("Network", resource_name(&nic.network)));
    }
    if let Some(external) = external {
        key_value_list.push(KeyValue::new("NetworkTier", &external.network_tier));
    }

    VmInfo {
        id: instance.name.clone(),
        name: instance.name.clone(),
        region: RegionInfo::new(&region.region, resource_name(&instance.zone)),
        image_id: disk.map(|d| d.source_image.clone()).unwrap_or_default(),
        vm_spec_id: resource_name(&instance.machine_type).to_string(),
        vnetwork_id: subnet.clone(),
        subnet_id: subnet,
        security_group_ids: instance.tags.items.clone(),
        network_interface_id: instance.name.clone(),
        public_ip: external.map(|e| e.nat_ip.clone()).unwrap_or_default(),
        private_ip: nic.map(|n| n.network_ip.clone()).unwrap_or_default(),
        vm_boot_disk: instance
            .boot_disk()
            .map(|d| resource_name(&d.source).to_string())
            .unwrap_or_default(),
        key_value_list,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        assert_eq!(vm_status("STAGING"), VmStatus::Creating);
        assert_eq!(vm_status("RUNNING"), VmStatus::Running);
        assert_eq!(vm_status("STOPPING"), VmStatus::Suspending);
        assert_eq!(vm_status("TERMINATED"), VmStatus::Suspended);
        assert_eq!(vm_status("REPAIRING"), VmStatus::Unknown);
    }

    #[test]
    fn test_map_vm() {
        let instance: Instance = serde_json::from_value(json!({
            "id": "991",
            "name": "vm-1",
            "zone": "https://www.googleapis.com/compute/v1/projects/p/zones/asia-northeast3-a",
            "status": "RUNNING",
            "machineType": "https://www.googleapis.com/compute/v1/projects/p/zones/asia-northeast3-a/machineTypes/e2-small",
            "tags": { "items": ["web-fw"] },
            "networkInterfaces": [{
                "name": "nic0",
                "network": "https://www.googleapis.com/compute/v1/projects/p/global/networks/cb-vnet",
                "subnetwork": "https://www.googleapis.com/compute/v1/projects/p/regions/asia-northeast3/subnetworks/subnet-a",
                "networkIP": "130.0.0.2",
                "accessConfigs": [{ "name": "External NAT", "natIP": "34.64.1.2", "networkTier": "PREMIUM" }]
            }],
            "disks": [{ "boot": true, "source": "https://www.googleapis.com/compute/v1/projects/p/zones/asia-northeast3-a/disks/vm-1" }]
        }))
        .unwrap();
        let disk = Disk {
            name: "vm-1".into(),
            source_image: "projects/debian-cloud/global/images/debian-12".into(),
            ..Default::default()
        };

        let info = map_vm(
            &instance,
            Some(&disk),
            &RegionInfo::new("asia-northeast3", "asia-northeast3-a"),
        );
        assert_eq!(info.id, "vm-1");
        assert_eq!(info.vm_spec_id, "e2-small");
        assert_eq!(info.subnet_id, "subnet-a");
        assert_eq!(info.public_ip, "34.64.1.2");
        assert_eq!(info.private_ip, "130.0.0.2");
        assert_eq!(info.vm_boot_disk, "vm-1");
        assert_eq!(info.image_id, "projects/debian-cloud/global/images/debian-12");
        assert_eq!(info.region.zone, "asia-northeast3-a");
        assert_eq!(info.security_group_ids, vec!["web-fw"]);
    }
}
