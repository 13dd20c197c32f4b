//! Google Compute Engine driver for cloudspan
//!
//! Speaks the Compute Engine v1 REST API with a service-account key.
//! Every mutation returns an `Operation` that is polled until `DONE`.
//!
//! # Resource mapping
//!
//! - VM: instance in the connection's zone
//! - Image: global image captured from an instance's boot disk
//! - Security: firewall on the base network, applied through target tags
//! - VNetwork: subnetwork of the shared `cb-vnet` network
//! - VNic: first interface of each instance (read-only)
//!
//! Key pairs and public IPs are not offered.

pub mod api;
pub mod client;
pub mod driver;
pub mod error;
pub mod image;
pub mod model;
pub mod poll;
pub mod security;
pub mod vm;
pub mod vnetwork;
pub mod vnic;

pub use api::{GcpApi, Operation, ProjectScope};
pub use client::{GcpClient, GcpConfig};
pub use driver::{GcpConnection, GcpDriver};
pub use error::GcpError;
