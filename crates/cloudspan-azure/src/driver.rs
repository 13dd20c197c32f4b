//! Azure driver and connection

use crate::api::{AzureApi, ResourceScope};
use crate::client::{AzureClient, AzureConfig};
use crate::image::AzureImageHandler;
use crate::keypair::AzureKeyPairHandler;
use crate::public_ip::AzurePublicIpHandler;
use crate::security::AzureSecurityHandler;
use crate::vm::AzureVmHandler;
use crate::vnetwork::AzureVNetworkHandler;
use crate::vnic::AzureVNicHandler;
use async_trait::async_trait;
use cloudspan_driver::{
    CloudConnection, CloudDriver, CloudError, ConnectionInfo, DriverCapability, HandlerContext,
    ImageHandler, KeyPairHandler, ProviderKind, PublicIpHandler, RegionInfo, Result,
    SecurityHandler, VNetworkHandler, VNicHandler, VmHandler,
};
use std::sync::Arc;

/// Connection option naming the resource group every resource lives in
pub const RESOURCE_GROUP_KEY: &str = "ResourceGroup";

const REQUIRED_FIELDS: &[&str] = &[
    "client_id",
    "client_secret",
    "tenant_id",
    "subscription_id",
    "region",
];

#[derive(Debug, Default)]
pub struct AzureDriver;

impl AzureDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CloudDriver for AzureDriver {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Azure
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn capability(&self) -> DriverCapability {
        DriverCapability::all()
    }

    async fn connect_cloud(&self, info: ConnectionInfo) -> Result<Box<dyn CloudConnection>> {
        info.ensure_fields(ProviderKind::Azure, REQUIRED_FIELDS)?;

        let client = AzureClient::new(AzureConfig {
            tenant_id: info.credential.tenant_id.clone(),
            client_id: info.credential.client_id.clone(),
            client_secret: info.credential.client_secret.clone(),
        });
        Ok(Box::new(AzureConnection::with_api(Arc::new(client), &info)?))
    }
}

/// Handlers of one subscription, resource group and region
pub struct AzureConnection {
    api: Arc<dyn AzureApi>,
    scope: ResourceScope,
    ctx: HandlerContext,
    region: RegionInfo,
}

impl AzureConnection {
    /// Builds a connection over any [`AzureApi`] implementation.
    ///
    /// Fails when the `ResourceGroup` option is missing.
    pub fn with_api(api: Arc<dyn AzureApi>, info: &ConnectionInfo) -> Result<Self> {
        let resource_group = info
            .key_value(RESOURCE_GROUP_KEY)
            .filter(|rg| !rg.is_empty())
            .ok_or_else(|| {
                CloudError::InvalidConnection(format!(
                    "azure requires the {RESOURCE_GROUP_KEY} option"
                ))
            })?;

        Ok(Self {
            api,
            scope: ResourceScope {
                subscription_id: info.credential.subscription_id.clone(),
                resource_group: resource_group.to_string(),
                location: info.region.region.clone(),
            },
            ctx: HandlerContext::for_connection(ProviderKind::Azure, info),
            region: info.region.clone(),
        })
    }

    pub fn scope(&self) -> &ResourceScope {
        &self.scope
    }
}

impl CloudConnection for AzureConnection {
    fn provider(&self) -> ProviderKind {
        ProviderKind::Azure
    }

    fn create_vm_handler(&self) -> Result<Box<dyn VmHandler>> {
        Ok(Box::new(AzureVmHandler::new(
            self.api.clone(),
            self.scope.clone(),
            self.ctx.clone(),
            self.region.clone(),
        )))
    }

    fn create_image_handler(&self) -> Result<Box<dyn ImageHandler>> {
        Ok(Box::new(AzureImageHandler::new(
            self.api.clone(),
            self.scope.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_security_handler(&self) -> Result<Box<dyn SecurityHandler>> {
        Ok(Box::new(AzureSecurityHandler::new(
            self.api.clone(),
            self.scope.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_vnetwork_handler(&self) -> Result<Box<dyn VNetworkHandler>> {
        Ok(Box::new(AzureVNetworkHandler::new(
            self.api.clone(),
            self.scope.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_vnic_handler(&self) -> Result<Box<dyn VNicHandler>> {
        Ok(Box::new(AzureVNicHandler::new(
            self.api.clone(),
            self.scope.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_keypair_handler(&self) -> Result<Box<dyn KeyPairHandler>> {
        Ok(Box::new(AzureKeyPairHandler::new(
            self.api.clone(),
            self.scope.clone(),
            self.ctx.clone(),
        )))
    }

    fn create_public_ip_handler(&self) -> Result<Box<dyn PublicIpHandler>> {
        Ok(Box::new(AzurePublicIpHandler::new(
            self.api.clone(),
            self.scope.clone(),
            self.ctx.clone(),
        )))
    }
}
