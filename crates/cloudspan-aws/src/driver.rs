//! AWS driver and connection

use crate::api::Ec2Api;
use crate::client::{AwsConfig, Ec2Client};
use crate::image::AwsImageHandler;
use crate::keypair::AwsKeyPairHandler;
use crate::public_ip::AwsPublicIpHandler;
use crate::security::AwsSecurityHandler;
use crate::vm::AwsVmHandler;
use crate::vnetwork::AwsVNetworkHandler;
use crate::vnic::AwsVNicHandler;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudConnection, CloudDriver, ConnectionInfo, DriverCapability, HandlerContext,
    ImageHandler, KeyPairHandler, ProviderKind, PublicIpHandler, RegionInfo, Result,
    SecurityHandler, VNetworkHandler, VNicHandler, VmHandler,
};
use std::sync::Arc;

/// `client_id` carries the access key id, `client_secret` the secret key.
const REQUIRED_FIELDS: &[&str] = &["client_id", "client_secret", "region"];

#[derive(Debug, Default)]
pub struct AwsDriver;

impl AwsDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CloudDriver for AwsDriver {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Aws
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn capability(&self) -> DriverCapability {
        DriverCapability::all()
    }

    async fn connect_cloud(&self, info: ConnectionInfo) -> Result<Box<dyn CloudConnection>> {
        info.ensure_fields(ProviderKind::Aws, REQUIRED_FIELDS)?;

        let client = Ec2Client::new(AwsConfig {
            access_key_id: info.credential.client_id.clone(),
            secret_access_key: info.credential.client_secret.clone(),
            region: info.region.region.clone(),
        })
        .await;
        Ok(Box::new(AwsConnection::with_api(Arc::new(client), &info)))
    }
}

/// Handlers of one account and region
pub struct AwsConnection {
    api: Arc<dyn Ec2Api>,
    ctx: HandlerContext,
    region: RegionInfo,
}

impl AwsConnection {
    /// Builds a connection over any [`Ec2Api`] implementation.
    pub fn with_api(api: Arc<dyn Ec2Api>, info: &ConnectionInfo) -> Self {
        Self {
            api,
            ctx: HandlerContext::for_connection(ProviderKind::Aws, info),
            region: info.region.clone(),
        }
    }
}

impl CloudConnection for AwsConnection {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Aws
    }

    fn create_vm_handler(&self) -> Result<Box<dyn VmHandler>> {
        Ok(Box::new(AwsVmHandler::new(
            self.api.clone(),
            self.ctx.clone(),
            self.region.clone(),
        )))
    }

    fn create_image_handler(&self) -> Result<Box<dyn ImageHandler>> {
        Ok(Box::new(AwsImageHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_security_handler(&self) -> Result<Box<dyn SecurityHandler>> {
        Ok(Box::new(AwsSecurityHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_vnetwork_handler(&self) -> Result<Box<dyn VNetworkHandler>> {
        Ok(Box::new(AwsVNetworkHandler::new(
            self.api.clone(),
            self.ctx.clone(),
            self.region.clone(),
        )))
    }

    fn create_vnic_handler(&self) -> Result<Box<dyn VNicHandler>> {
        Ok(Box::new(AwsVNicHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_keypair_handler(&self) -> Result<Box<dyn KeyPairHandler>> {
        Ok(Box::new(AwsKeyPairHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_public_ip_handler(&self) -> Result<Box<dyn PublicIpHandler>> {
        Ok(Box::new(AwsPublicIpHandler::new(
            self.api.clone(),
            self.ctx.clone(),
        )))
    }
}
