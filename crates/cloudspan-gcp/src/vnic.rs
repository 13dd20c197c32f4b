//! Network interfaces
//!
//! Compute Engine has no standalone NIC resource: interfaces are part of an
//! instance. Create and delete only log, and list/get report the first
//! interface of each instance under the instance's name.

use crate::api::{GcpApi, ProjectScope, resource_name};
use crate::model::Instance;
use crate::poll::{fetch, fetch_all};
use async_trait::async_trait;
use cloudspan_driver::{
    HandlerContext, KeyValue, Result, VNicHandler, VNicInfo, VNicReqInfo,
};
use std::sync::Arc;

pub struct GcpVNicHandler {
    api: Arc<dyn GcpApi>,
    scope: ProjectScope,
    ctx: HandlerContext,
}

impl GcpVNicHandler {
    pub fn new(api: Arc<dyn GcpApi>, scope: ProjectScope, ctx: HandlerContext) -> Self {
        Self { api, scope, ctx }
    }
}

#[async_trait]
impl VNicHandler for GcpVNicHandler {
    async fn create_vnic(&self, req: VNicReqInfo) -> Result<VNicInfo> {
        tracing::warn!(parent: &self.ctx.span, name = %req.name, "standalone network interfaces are not supported; nothing created");
        Ok(VNicInfo::default())
    }

    async fn list_vnic(&self) -> Result<Vec<VNicInfo>> {
        let instances: Vec<Instance> =
            fetch_all(self.api.as_ref(), &self.scope.zonal("instances")).await?;
        Ok(instances.iter().filter_map(map_first_interface).collect())
    }

    async fn get_vnic(&self, vnic_id: &str) -> Result<VNicInfo> {
        let instance: Instance = fetch(self.api.as_ref(), &self.scope.instance(vnic_id)).await?;
        Ok(map_first_interface(&instance).unwrap_or_else(|| VNicInfo {
            id: instance.name.clone(),
            owned_vm_id: instance.name.clone(),
            status: instance.status.clone(),
            ..Default::default()
        }))
    }

    async fn delete_vnic(&self, vnic_id: &str) -> Result<bool> {
        self.api.get(&self.scope.instance(vnic_id)).await?;
        tracing::warn!(parent: &self.ctx.span, vnic_id, "interfaces are removed with their instance; nothing deleted");
        Ok(true)
    }
}

pub fn map_first_interface(instance: &Instance) -> Option<VNicInfo> {
    let nic = instance.network_interfaces.first()?;
    let external = nic.external();

    let mut key_value_list = vec![
        KeyValue::new("Network", resource_name(&nic.network)),
        KeyValue::new("NetworkIP", &nic.network_ip),
    ];
    if let Some(external) = external {
        key_value_list.push(KeyValue::new("PublicIPName", &external.name));
        key_value_list.push(KeyValue::new("NetworkTier", &external.network_tier));
    }

    Some(VNicInfo {
        id: instance.name.clone(),
        name: nic.name.clone(),
        owned_vm_id: instance.name.clone(),
        mac_address: String::new(),
        security_group_ids: instance.tags.items.clone(),
        public_ip: external.map(|e| e.nat_ip.clone()).unwrap_or_default(),
        status: instance.status.clone(),
        key_value_list,
    })
}
