//! Alibaba Cloud driver and connection

use crate::api::AlibabaApi;
use crate::client::{AlibabaClient, AlibabaConfig};
use crate::image::AlibabaImageHandler;
use crate::keypair::AlibabaKeyPairHandler;
use crate::public_ip::AlibabaPublicIpHandler;
use crate::security::AlibabaSecurityHandler;
use crate::vm::AlibabaVmHandler;
use crate::vnetwork::AlibabaVNetworkHandler;
use crate::vnic::AlibabaVNicHandler;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudConnection, CloudDriver, ConnectionInfo, DriverCapability, HandlerContext,
    ImageHandler, KeyPairHandler, ProviderKind, PublicIpHandler, RegionInfo, Result,
    SecurityHandler, VNetworkHandler, VNicHandler, VmHandler,
};
use std::sync::Arc;

/// `client_id` carries the AccessKey id, `client_secret` its secret.
const REQUIRED_FIELDS: &[&str] = &["client_id", "client_secret", "region"];

#[derive(Debug, Default)]
pub struct AlibabaDriver;

impl AlibabaDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CloudDriver for AlibabaDriver {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Alibaba
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn capability(&self) -> DriverCapability {
        DriverCapability::all()
    }

    async fn connect_cloud(&self, info: ConnectionInfo) -> Result<Box<dyn CloudConnection>> {
        info.ensure_fields(ProviderKind::Alibaba, REQUIRED_FIELDS)?;

        let client = AlibabaClient::new(AlibabaConfig {
            access_key_id: info.credential.client_id.clone(),
            access_key_secret: info.credential.client_secret.clone(),
            region: info.region.region.clone(),
        });
        Ok(Box::new(AlibabaConnection::with_api(Arc::new(client), &info)))
    }
}

/// Handlers of one account and region. VSwitches are placed in the
/// connection's zone.
pub struct AlibabaConnection {
    api: Arc<dyn AlibabaApi>,
    ctx: HandlerContext,
    region: RegionInfo,
}

impl AlibabaConnection {
    /// Builds a connection over any [`AlibabaApi`] implementation.
    pub fn with_api(api: Arc<dyn AlibabaApi>, info: &ConnectionInfo) -> Self {
        Self {
            api,
            ctx: HandlerContext::for_connection(ProviderKind::Alibaba, info),
            region: info.region.clone(),
        }
    }
}

impl CloudConnection for AlibabaConnection {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Alibaba
    }

    fn create_vm_handler(&self) -> Result<Box<dyn VmHandler>> {
        Ok(Box::new(AlibabaVmHandler::new(
            self.api.clone(),
            self.ctx.clone(),
            self.region.clone(),
        )))
    }

    fn create_image_handler(&self) -> Result<Box<dyn ImageHandler>> {
        Ok(Box::new(AlibabaImageHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_security_handler(&self) -> Result<Box<dyn SecurityHandler>> {
        Ok(Box::new(AlibabaSecurityHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_vnetwork_handler(&self) -> Result<Box<dyn VNetworkHandler>> {
        Ok(Box::new(AlibabaVNetworkHandler::new(
            self.api.clone(),
            self.ctx.clone(),
            self.region.clone(),
        )))
    }

    fn create_vnic_handler(&self) -> Result<Box<dyn VNicHandler>> {
        Ok(Box::new(AlibabaVNicHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_keypair_handler(&self) -> Result<Box<dyn KeyPairHandler>> {
        Ok(Box::new(AlibabaKeyPairHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_public_ip_handler(&self) -> Result<Box<dyn PublicIpHandler>> {
        Ok(Box::new(AlibabaPublicIpHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }
}
