use async_trait::async_trait;
use cloudspan_driver::*;
use std::sync::Arc;

/// Driver whose connections only offer a VM handler
pub struct StubDriver {
    pub kind: ProviderKind,
}

impl StubDriver {
    pub fn shared(kind: ProviderKind) -> Arc<dyn CloudDriver> {
        Arc::new(Self { kind })
    }
}

#[async_trait]
impl CloudDriver for StubDriver {
    fn provider(&self) -> ProviderKind {
        self.kind
    }

    fn version(&self) -> &str {
        "0.0.1-test"
    }

    fn capability(&self) -> DriverCapability {
        DriverCapability::only(&[Capability::Vm])
    }

    async fn connect_cloud(&self, info: ConnectionInfo) -> Result<Box<dyn CloudConnection>> {
        info.ensure_fields(self.kind, &["client_id", "region"])?;
        Ok(Box::new(StubConnection { kind: self.kind }))
    }
}

pub struct StubConnection {
    kind: ProviderKind,
}

impl CloudConnection for StubConnection {
    fn provider(&self) -> ProviderKind {
        self.kind
    }

    fn create_vm_handler(&self) -> Result<Box<dyn VmHandler>> {
        Ok(Box::new(StubVmHandler))
    }
}

pub struct StubVmHandler;

#[async_trait]
impl VmHandler for StubVmHandler {
    async fn start_vm(&self, req: VmReqInfo) -> Result<VmInfo> {
        Ok(VmInfo {
            id: format!("id-{}", req.name),
            name: req.name,
            ..Default::default()
        })
    }

    async fn suspend_vm(&self, _vm_id: &str) -> Result<VmStatus> {
        Ok(VmStatus::Suspended)
    }

    async fn resume_vm(&self, _vm_id: &str) -> Result<VmStatus> {
        Ok(VmStatus::Running)
    }

    async fn reboot_vm(&self, _vm_id: &str) -> Result<VmStatus> {
        Ok(VmStatus::Running)
    }

    async fn terminate_vm(&self, _vm_id: &str) -> Result<VmStatus> {
        Ok(VmStatus::Terminated)
    }

    async fn list_vm_status(&self) -> Result<Vec<VmStatusInfo>> {
        Ok(Vec::new())
    }

    async fn get_vm_status(&self, vm_id: &str) -> Result<VmStatusInfo> {
        Ok(VmStatusInfo::new(vm_id, VmStatus::Running, "running"))
    }

    async fn list_vm(&self) -> Result<Vec<VmInfo>> {
        Ok(Vec::new())
    }

    async fn get_vm(&self, vm_id: &str) -> Result<VmInfo> {
        Err(CloudError::NotFound(vm_id.to_string()))
    }
}

pub fn connection_info() -> ConnectionInfo {
    ConnectionInfo {
        credential: CredentialInfo {
            client_id: "key".into(),
            client_secret: "secret".into(),
            ..Default::default()
        },
        region: RegionInfo::new("region-1", "zone-a"),
        ..Default::default()
    }
}
