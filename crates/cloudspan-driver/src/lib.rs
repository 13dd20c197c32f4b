//! cloudspan driver contract
//!
//! This crate defines the provider-agnostic surface every cloudspan driver
//! implements: connection info, request/info structs, one handler trait per
//! resource type, and the driver/connection factory traits that hand those
//! handlers out.
//!
//! # Supported Providers
//!
//! - **Alibaba Cloud**: ECS / VPC RPC APIs
//! - **AWS**: EC2 (via aws-sdk-ec2)
//! - **Azure**: Resource Manager REST API
//! - **GCP**: Compute Engine REST API
//! - **OpenStack**: Nova / Neutron / Glance REST APIs
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  cloudspan CLI                   │
//! └─────────────────┬───────────────────────────────┘
//!                   │ DriverRegistry::connect(kind, info)
//! ┌─────────────────▼───────────────────────────────┐
//! │               cloudspan-driver                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │ trait CloudDriver / CloudConnection       │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐   │
//! │  │  Handlers  │ │  wait_for  │ │    CIDR    │   │
//! │  └────────────┘ └────────────┘ └────────────┘   │
//! └───────┬─────────┬─────────┬─────────┬───────────┘
//!         │         │         │         │
//!    ┌────▼──┐ ┌────▼──┐ ┌────▼──┐ ┌────▼──────┐ ┌─────────┐
//!    │  aws  │ │ azure │ │  gcp  │ │ openstack │ │ alibaba │
//!    └───────┘ └───────┘ └───────┘ └───────────┘ └─────────┘
//! ```
//!
//! Handlers never retry. Every wait on a vendor-side operation is bounded by
//! the connection's [`WaitPolicy`] and fails with
//! [`CloudError::OperationTimedOut`] when it runs out.

pub mod cidr;
pub mod connection;
pub mod context;
pub mod driver;
pub mod error;
pub mod handler;
pub mod operation;
pub mod registry;
pub mod resources;

// Re-exports
pub use cidr::{BASE_VNETWORK_CIDR, BASE_VNETWORK_NAME, next_subnet_cidr};
pub use connection::{ConnectionInfo, CredentialInfo, RegionInfo};
pub use context::HandlerContext;
pub use driver::{Capability, CloudConnection, CloudDriver, DriverCapability, ProviderKind};
pub use error::{CloudError, Result};
pub use handler::{
    ImageHandler, KeyPairHandler, PublicIpHandler, SecurityHandler, VNetworkHandler, VNicHandler,
    VmHandler,
};
pub use operation::{PollStatus, WaitPolicy, wait_for};
pub use registry::DriverRegistry;
pub use resources::*;
