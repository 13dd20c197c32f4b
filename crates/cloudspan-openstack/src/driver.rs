//! OpenStack driver and connection

use crate::api::OpenStackApi;
use crate::client::{OpenStackClient, OpenStackConfig};
use crate::image::OpenStackImageHandler;
use crate::keypair::OpenStackKeyPairHandler;
use crate::network::EXTERNAL_NETWORK_KEY;
use crate::public_ip::OpenStackPublicIpHandler;
use crate::security::OpenStackSecurityHandler;
use crate::vm::OpenStackVmHandler;
use crate::vnetwork::OpenStackVNetworkHandler;
use crate::vnic::OpenStackVNicHandler;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudConnection, CloudDriver, ConnectionInfo, DriverCapability, HandlerContext,
    ImageHandler, KeyPairHandler, ProviderKind, PublicIpHandler, RegionInfo, Result,
    SecurityHandler, VNetworkHandler, VNicHandler, VmHandler,
};
use std::sync::Arc;

const REQUIRED_FIELDS: &[&str] = &[
    "identity_endpoint",
    "username",
    "password",
    "domain_name",
    "project_id",
    "region",
];

#[derive(Debug, Default)]
pub struct OpenStackDriver;

impl OpenStackDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CloudDriver for OpenStackDriver {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenStack
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn capability(&self) -> DriverCapability {
        DriverCapability::all()
    }

    async fn connect_cloud(&self, info: ConnectionInfo) -> Result<Box<dyn CloudConnection>> {
        info.ensure_fields(ProviderKind::OpenStack, REQUIRED_FIELDS)?;

        let credential = &info.credential;
        let client = OpenStackClient::new(OpenStackConfig {
            identity_endpoint: credential.identity_endpoint.clone(),
            username: credential.username.clone(),
            password: credential.password.clone(),
            domain_name: credential.domain_name.clone(),
            project_id: credential.project_id.clone(),
            region: info.region.region.clone(),
        });

        Ok(Box::new(OpenStackConnection::with_api(
            Arc::new(client),
            &info,
        )))
    }
}

/// Handlers of one OpenStack project and region
pub struct OpenStackConnection {
    api: Arc<dyn OpenStackApi>,
    ctx: HandlerContext,
    region: RegionInfo,
    external_network: Option<String>,
}

impl OpenStackConnection {
    /// Builds a connection over any [`OpenStackApi`] implementation.
    pub fn with_api(api: Arc<dyn OpenStackApi>, info: &ConnectionInfo) -> Self {
        Self {
            api,
            ctx: HandlerContext::for_connection(ProviderKind::OpenStack, info),
            region: info.region.clone(),
            external_network: info.key_value(EXTERNAL_NETWORK_KEY).map(str::to_string),
        }
    }
}

impl CloudConnection for OpenStackConnection {
    fn provider(&self) -> ProviderKind {
        ProviderKind::OpenStack
    }

    fn create_vm_handler(&self) -> Result<Box<dyn VmHandler>> {
        Ok(Box::new(OpenStackVmHandler::new(
            self.api.clone(),
            self.ctx.clone(),
            self.region.clone(),
        )))
    }

    fn create_image_handler(&self) -> Result<Box<dyn ImageHandler>> {
        Ok(Box::new(OpenStackImageHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_security_handler(&self) -> Result<Box<dyn SecurityHandler>> {
        Ok(Box::new(OpenStackSecurityHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_vnetwork_handler(&self) -> Result<Box<dyn VNetworkHandler>> {
        Ok(Box::new(OpenStackVNetworkHandler::new(
            self.api.clone(),
            self.ctx.clone(),
            self.external_network.clone(),
        )))
    }

    fn create_vnic_handler(&self) -> Result<Box<dyn VNicHandler>> {
        Ok(Box::new(OpenStackVNicHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_keypair_handler(&self) -> Result<Box<dyn KeyPairHandler>> {
        Ok(Box::new(OpenStackKeyPairHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_public_ip_handler(&self) -> Result<Box<dyn PublicIpHandler>> {
        Ok(Box::new(OpenStackPublicIpHandler::new(
            self.api.clone(),
            self.ctx.clone(),
            self.external_network.clone(),
        )))
    }
}
