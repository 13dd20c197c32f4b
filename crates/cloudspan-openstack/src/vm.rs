//! Nova server lifecycle

use crate::api::OpenStackApi;
use crate::model::{CreateServer, NamedRef, Port, Server, ServerAction, ServerNetwork};
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, PollStatus, RegionInfo, Result, VmHandler, VmInfo,
    VmReqInfo, VmStatus, VmStatusInfo,
};
use std::sync::Arc;

pub struct OpenStackVmHandler {
    api: Arc<dyn OpenStackApi>,
    ctx: HandlerContext,
    region: RegionInfo,
}

impl OpenStackVmHandler {
    pub fn new(api: Arc<dyn OpenStackApi>, ctx: HandlerContext, region: RegionInfo) -> Self {
        Self { api, ctx, region }
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Server>> {
        Ok(self
            .api
            .list_servers()
            .await?
            .into_iter()
            .find(|s| s.name == name))
    }

    /// Accepts a flavor name or id.
    async fn resolve_flavor(&self, spec: &str) -> Result<String> {
        self.api
            .list_flavors()
            .await?
            .into_iter()
            .find(|f| f.id == spec || f.name == spec)
            .map(|f| f.id)
            .ok_or_else(|| CloudError::InvalidRequest(format!("unknown flavor {spec}")))
    }

    async fn server_network(&self, req: &VmReqInfo) -> Result<ServerNetwork> {
        if !req.network_interface_id.is_empty() {
            return Ok(ServerNetwork {
                uuid: None,
                port: Some(req.network_interface_id.clone()),
            });
        }

        // a virtual network is a subnet of the shared base network
        let subnet_id = if req.subnet_id.is_empty() {
            &req.vnetwork_id
        } else {
            &req.subnet_id
        };
        if subnet_id.is_empty() {
            return Err(CloudError::InvalidRequest(
                "vnetwork_id or network_interface_id is required".into(),
            ));
        }
        let subnet = self.api.get_subnet(subnet_id).await?;
        Ok(ServerNetwork {
            uuid: Some(subnet.network_id),
            port: None,
        })
    }

    /// Waits until the server settles in `target` with no task in flight.
    async fn wait_for_status(&self, id: &str, operation: &str, target: &str) -> Result<Server> {
        let api = &self.api;
        self.ctx
            .wait_for(operation, move || async move {
                let server = api.get_server(id).await?;
                if server.status == "ERROR" {
                    let message = server
                        .fault
                        .map(|f| f.message)
                        .unwrap_or_else(|| "server entered ERROR".into());
                    return Err(CloudError::OperationFailed {
                        operation: operation.to_string(),
                        message,
                    });
                }
                if server.status == target && server.task_state.is_none() {
                    Ok(PollStatus::Done(server))
                } else {
                    Ok(PollStatus::Pending)
                }
            })
            .await
    }

    async fn associate_public_ip(&self, server_id: &str, floating_ip_id: &str) -> Result<()> {
        let port = self
            .api
            .list_ports()
            .await?
            .into_iter()
            .find(|p| p.device_id == server_id)
            .ok_or_else(|| CloudError::NotFound(format!("port of server {server_id}")))?;
        self.api
            .update_floating_ip_port(floating_ip_id, Some(&port.id))
            .await?;
        Ok(())
    }

    async fn lifecycle(
        &self,
        vm_id: &str,
        action: ServerAction,
        target: &str,
        reached: VmStatus,
    ) -> Result<VmStatus> {
        let operation = format!("{action:?} server {vm_id}");
        tracing::info!(parent: &self.ctx.span, vm_id, ?action, "server action");
        self.api.server_action(vm_id, action).await?;
        self.wait_for_status(vm_id, &operation, target).await?;
        Ok(reached)
    }
}

#[async_trait]
impl VmHandler for OpenStackVmHandler {
    async fn start_vm(&self, req: VmReqInfo) -> Result<VmInfo> {
        if self.find_by_name(&req.name).await?.is_some() {
            return Err(CloudError::already_exists("VirtualMachine", &req.name));
        }

        let key_name = Some(req.key_pair_name.clone()).filter(|k| !k.is_empty());
        let admin_pass = if key_name.is_none() {
            Some(req.vm_user_passwd.clone()).filter(|p| !p.is_empty())
        } else {
            None
        };

        let body = CreateServer {
            name: req.name.clone(),
            image_ref: req.image_id.clone(),
            flavor_ref: self.resolve_flavor(&req.vm_spec_id).await?,
            networks: vec![self.server_network(&req).await?],
            security_groups: req
                .security_group_ids
                .iter()
                .map(|id| NamedRef { name: id.clone() })
                .collect(),
            key_name,
            admin_pass,
            availability_zone: Some(self.region.zone.clone()).filter(|z| !z.is_empty()),
        };

        tracing::info!(parent: &self.ctx.span, name = %req.name, "creating server");
        let id = self.api.create_server(&body).await?;
        self.wait_for_status(&id, &format!("create server {}", req.name), "ACTIVE")
            .await?;

        if !req.public_ip_id.is_empty() {
            self.associate_public_ip(&id, &req.public_ip_id).await?;
        }

        let mut info = self.get_vm(&id).await?;
        info.vm_user_id = req.vm_user_id;
        Ok(info)
    }

    async fn suspend_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.lifecycle(vm_id, ServerAction::Stop, "SHUTOFF", VmStatus::Suspended)
            .await
    }

    async fn resume_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.lifecycle(vm_id, ServerAction::Start, "ACTIVE", VmStatus::Running)
            .await
    }

    async fn reboot_vm(&self, vm_id: &str) -> Result<VmStatus> {
        self.lifecycle(vm_id, ServerAction::Reboot, "ACTIVE", VmStatus::Running)
            .await
    }

    async fn terminate_vm(&self, vm_id: &str) -> Result<VmStatus> {
        tracing::info!(parent: &self.ctx.span, vm_id, "deleting server");
        self.api.delete_server(vm_id).await?;

        let api = &self.api;
        self.ctx
            .wait_for(&format!("delete server {vm_id}"), move || async move {
                match api.get_server(vm_id).await {
                    Err(e) if e.is_not_found() => Ok(PollStatus::Done(())),
                    Err(e) => Err(e),
                    Ok(server) if server.status == "DELETED" => Ok(PollStatus::Done(())),
                    Ok(_) => Ok(PollStatus::Pending),
                }
            })
            .await?;
        Ok(VmStatus::Terminated)
    }

    async fn list_vm_status(&self) -> Result<Vec<VmStatusInfo>> {
        Ok(self
            .api
            .list_servers()
            .await?
            .iter()
            .map(status_info)
            .collect())
    }

    async fn get_vm_status(&self, vm_id: &str) -> Result<VmStatusInfo> {
        Ok(status_info(&self.api.get_server(vm_id).await?))
    }

    async fn list_vm(&self) -> Result<Vec<VmInfo>> {
        let servers = self.api.list_servers().await?;
        let ports = self.api.list_ports().await?;
        Ok(servers
            .iter()
            .map(|s| map_server(s, &ports, &self.region))
            .collect())
    }

    async fn get_vm(&self, vm_id: &str) -> Result<VmInfo> {
        let server = self.api.get_server(vm_id).await?;
        let ports = self.api.list_ports().await?;
        Ok(map_server(&server, &ports, &self.region))
    }
}

/// Normalizes Nova `status` and `OS-EXT-STS:task_state`.
pub fn vm_status(status: &str, task_state: Option<&str>) -> VmStatus {
    match task_state {
        Some("powering-off") => return VmStatus::Suspending,
        Some("powering-on") => return VmStatus::Resuming,
        Some("deleting") => return VmStatus::Terminating,
        Some(t) if t.starts_with("reboot") => return VmStatus::Rebooting,
        _ => {}
    }

    match status {
        "BUILD" => VmStatus::Creating,
        "ACTIVE" => VmStatus::Running,
        "SHUTOFF" | "STOPPED" | "SUSPENDED" | "PAUSED" => VmStatus::Suspended,
        "REBOOT" | "HARD_REBOOT" => VmStatus::Rebooting,
        "DELETED" | "SOFT_DELETED" => VmStatus::Terminated,
        "ERROR" => VmStatus::Failed,
        _ => VmStatus::Unknown,
    }
}

fn status_info(server: &Server) -> VmStatusInfo {
    let vendor_status = match &server.task_state {
        Some(task) => format!("{}({})", server.status, task),
        None => server.status.clone(),
    };
    VmStatusInfo::new(
        &server.id,
        vm_status(&server.status, server.task_state.as_deref()),
        vendor_status,
    )
}

pub fn map_server(server: &Server, ports: &[Port], region: &RegionInfo) -> VmInfo {
    let port = ports.iter().find(|p| p.device_id == server.id);
    let subnet_id = port
        .and_then(|p| p.fixed_ips.first())
        .map(|ip| ip.subnet_id.clone())
        .unwrap_or_default();

    let mut key_value_list = vec![
        KeyValue::new("Status", &server.status),
        KeyValue::new("Created", &server.created),
    ];
    if !server.host_id.is_empty() {
        key_value_list.push(KeyValue::new("HostId", &server.host_id));
    }

    VmInfo {
        id: server.id.clone(),
        name: server.name.clone(),
        region: RegionInfo::new(&region.region, &server.availability_zone),
        image_id: server.image_id().to_string(),
        vm_spec_id: server.flavor.id.clone().unwrap_or_default(),
        vnetwork_id: subnet_id.clone(),
        subnet_id,
        security_group_ids: server
            .security_groups
            .iter()
            .map(|sg| sg.name.clone())
            .collect(),
        network_interface_id: port.map(|p| p.id.clone()).unwrap_or_default(),
        public_ip: server
            .address_of_type("floating")
            .map(|a| a.addr.clone())
            .unwrap_or_default(),
        private_ip: server
            .address_of_type("fixed")
            .map(|a| a.addr.clone())
            .unwrap_or_default(),
        key_pair_name: server.key_name.clone().unwrap_or_default(),
        vm_boot_disk: server
            .volumes_attached
            .first()
            .map(|v| v.id.clone())
            .unwrap_or_default(),
        key_value_list,
        ..Default::default()
    }
}
