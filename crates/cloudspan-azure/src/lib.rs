//! Azure driver for cloudspan
//!
//! Works against the Resource Manager REST API with a service principal.
//! Every resource lives in the resource group named by the `ResourceGroup`
//! connection option; handler ids are full ARM resource ids, and bare names
//! are accepted wherever an id is expected.
//!
//! Virtual networks are subnets of a shared `CB-VNet` virtual network.
//! A VM created without a NIC gets one named `{vm}-nic`.

pub mod api;
pub mod client;
pub mod driver;
pub mod error;
pub mod image;
pub mod keypair;
pub mod model;
pub mod poll;
pub mod public_ip;
pub mod security;
pub mod vm;
pub mod vnetwork;
pub mod vnic;

pub use api::{Accepted, AzureApi, OperationStatus, ResourceScope};
pub use client::{AzureClient, AzureConfig};
pub use driver::{AzureConnection, AzureDriver, RESOURCE_GROUP_KEY};
pub use error::AzureError;
