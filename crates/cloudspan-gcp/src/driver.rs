//! GCP driver and connection

use crate::api::{GcpApi, ProjectScope};
use crate::client::{GcpClient, GcpConfig};
use crate::image::GcpImageHandler;
use crate::security::GcpSecurityHandler;
use crate::vm::GcpVmHandler;
use crate::vnetwork::GcpVNetworkHandler;
use crate::vnic::GcpVNicHandler;
use async_trait::async_trait;
use cloudspan_driver::{
    Capability, CloudConnection, CloudDriver, ConnectionInfo, DriverCapability, HandlerContext,
    ImageHandler, ProviderKind, RegionInfo, Result, SecurityHandler, VNetworkHandler,
    VNicHandler, VmHandler,
};
use std::sync::Arc;

const REQUIRED_FIELDS: &[&str] = &["client_email", "private_key", "project_id", "region", "zone"];

/// Handlers this driver offers. Key pairs and public IPs are left to the
/// default `Unsupported` factories.
const CAPABILITIES: &[Capability] = &[
    Capability::Vm,
    Capability::Image,
    Capability::Security,
    Capability::VNetwork,
    Capability::VNic,
];

#[derive(Debug, Default)]
pub struct GcpDriver;

impl GcpDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CloudDriver for GcpDriver {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gcp
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn capability(&self) -> DriverCapability {
        DriverCapability::only(CAPABILITIES)
    }

    async fn connect_cloud(&self, info: ConnectionInfo) -> Result<Box<dyn CloudConnection>> {
        info.ensure_fields(ProviderKind::Gcp, REQUIRED_FIELDS)?;

        let client = GcpClient::new(GcpConfig {
            client_email: info.credential.client_email.clone(),
            private_key: info.credential.private_key.clone(),
        });
        Ok(Box::new(GcpConnection::with_api(Arc::new(client), &info)))
    }
}

/// Handlers of one project, region and zone
pub struct GcpConnection {
    api: Arc<dyn GcpApi>,
    scope: ProjectScope,
    ctx: HandlerContext,
    region: RegionInfo,
}

impl GcpConnection {
    /// Builds a connection over any [`GcpApi`] implementation.
    pub fn with_api(api: Arc<dyn GcpApi>, info: &ConnectionInfo) -> Self {
        Self {
            api,
            scope: ProjectScope {
                project_id: info.credential.project_id.clone(),
                region: info.region.region.clone(),
                zone: info.region.zone.clone(),
            },
            ctx: HandlerContext::for_connection(ProviderKind::Gcp, info),
            region: info.region.clone(),
        }
    }

    pub fn scope(&self) -> &ProjectScope {
        &self.scope
    }
}

impl CloudConnection for GcpConnection {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Gcp
    }

    fn create_vm_handler(&self) -> Result<Box<dyn VmHandler>> {
        Ok(Box::new(GcpVmHandler::new(
            self.api.clone(),
            self.scope.clone(),
            self.ctx.clone(),
            self.region.clone(),
        )))
    }

    fn create_image_handler(&self) -> Result<Box<dyn ImageHandler>> {
        Ok(Box::new(GcpImageHandler::new(
            self.api.clone(),
            self.scope.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_security_handler(&self) -> Result<Box<dyn SecurityHandler>> {
        Ok(Box::new(GcpSecurityHandler::new(
            self.api.clone(),
            self.scope.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_vnetwork_handler(&self) -> Result<Box<dyn VNetworkHandler>> {
        Ok(Box::new(GcpVNetworkHandler::new(
            self.api.clone(),
            self.scope.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_vnic_handler(&self) -> Result<Box<dyn VNicHandler>> {
        Ok(Box::new(GcpVNicHandler::new(
            self.api.clone(),
            self.scope.clone(),
            self.ctx.clone(),
        )))
    }
}
