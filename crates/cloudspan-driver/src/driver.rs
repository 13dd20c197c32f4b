//! Driver and connection factory traits

use crate::connection::ConnectionInfo;
use crate::error::{CloudError, Result};
use crate::handler::*;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Cloud provider identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Alibaba,
    Aws,
    Azure,
    Gcp,
    OpenStack,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::Alibaba,
        ProviderKind::Aws,
        ProviderKind::Azure,
        ProviderKind::Gcp,
        ProviderKind::OpenStack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Alibaba => "alibaba",
            ProviderKind::Aws => "aws",
            ProviderKind::Azure => "azure",
            ProviderKind::Gcp => "gcp",
            ProviderKind::OpenStack => "openstack",
        }
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::Alibaba => "Alibaba Cloud",
            ProviderKind::Aws => "AWS",
            ProviderKind::Azure => "Microsoft Azure",
            ProviderKind::Gcp => "Google Cloud",
            ProviderKind::OpenStack => "OpenStack",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "alibaba" | "aliyun" => Ok(ProviderKind::Alibaba),
            "aws" => Ok(ProviderKind::Aws),
            "azure" => Ok(ProviderKind::Azure),
            "gcp" | "gce" => Ok(ProviderKind::Gcp),
            "openstack" => Ok(ProviderKind::OpenStack),
            _ => Err(CloudError::ProviderNotFound(s.to_string())),
        }
    }
}

/// One handler kind a driver may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Capability {
    Vm,
    Image,
    Security,
    VNetwork,
    VNic,
    KeyPair,
    PublicIp,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::Vm,
        Capability::Image,
        Capability::Security,
        Capability::VNetwork,
        Capability::VNic,
        Capability::KeyPair,
        Capability::PublicIp,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Vm => "vm",
            Capability::Image => "image",
            Capability::Security => "security",
            Capability::VNetwork => "vnetwork",
            Capability::VNic => "vnic",
            Capability::KeyPair => "keypair",
            Capability::PublicIp => "publicip",
        };
        f.write_str(name)
    }
}

/// Set of handlers a driver offers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverCapability {
    supported: BTreeSet<Capability>,
}

impl DriverCapability {
    pub fn all() -> Self {
        Self {
            supported: Capability::ALL.into_iter().collect(),
        }
    }

    pub fn only(capabilities: &[Capability]) -> Self {
        Self {
            supported: capabilities.iter().copied().collect(),
        }
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.supported.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.supported.iter().copied()
    }

    /// Capabilities the driver does not offer
    pub fn missing(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| !self.supported.contains(c))
            .collect()
    }
}

/// A cloud driver: connection factory plus self-description
#[async_trait]
pub trait CloudDriver: Send + Sync {
    fn provider(&self) -> ProviderKind;

    /// Driver version string
    fn version(&self) -> &str;

    fn capability(&self) -> DriverCapability;

    /// Validates `info` and builds the vendor client.
    ///
    /// No network call is made here; authentication failures surface on the
    /// first resource call.
    async fn connect_cloud(&self, info: ConnectionInfo) -> Result<Box<dyn CloudConnection>>;
}

/// A live connection handing out resource handlers.
///
/// Factory methods a driver does not override report the capability as
/// unsupported.
pub trait CloudConnection: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn create_vm_handler(&self) -> Result<Box<dyn VmHandler>> {
        Err(CloudError::unsupported(self.provider(), Capability::Vm))
    }

    fn create_image_handler(&self) -> Result<Box<dyn ImageHandler>> {
        Err(CloudError::unsupported(self.provider(), Capability::Image))
    }

    fn create_security_handler(&self) -> Result<Box<dyn SecurityHandler>> {
        Err(CloudError::unsupported(self.provider(), Capability::Security))
    }

    fn create_vnetwork_handler(&self) -> Result<Box<dyn VNetworkHandler>> {
        Err(CloudError::unsupported(self.provider(), Capability::VNetwork))
    }

    fn create_vnic_handler(&self) -> Result<Box<dyn VNicHandler>> {
        Err(CloudError::unsupported(self.provider(), Capability::VNic))
    }

    fn create_keypair_handler(&self) -> Result<Box<dyn KeyPairHandler>> {
        Err(CloudError::unsupported(self.provider(), Capability::KeyPair))
    }

    fn create_public_ip_handler(&self) -> Result<Box<dyn PublicIpHandler>> {
        Err(CloudError::unsupported(self.provider(), Capability::PublicIp))
    }
}
