//! OpenStack driver for cloudspan
//!
//! Talks to Keystone v3, Nova, Neutron and Glance over their REST APIs.
//!
//! # Resource mapping
//!
//! - VM: Nova server
//! - Image: Glance image (created as a server snapshot)
//! - Security: Neutron security group
//! - VNetwork: subnet of the shared `CB-VNet` network, routed through `CB-VNet-Router`
//! - VNic: Neutron port
//! - KeyPair: Nova key pair
//! - PublicIp: Neutron floating IP
//!
//! # Connection options
//!
//! - `ExternalNetworkId`: network used as router gateway and floating IP
//!   pool. Defaults to the first `router:external` network.
//!
//! # Example
//!
//! ```ignore
//! use cloudspan_driver::{CloudDriver, ConnectionInfo};
//! use cloudspan_openstack::OpenStackDriver;
//!
//! let conn = OpenStackDriver::new().connect_cloud(info).await?;
//! let servers = conn.create_vm_handler()?.list_vm().await?;
//! ```

pub mod api;
pub mod client;
pub mod driver;
pub mod error;
pub mod image;
pub mod keypair;
pub mod model;
pub mod network;
pub mod public_ip;
pub mod security;
pub mod vm;
pub mod vnetwork;
pub mod vnic;

pub use api::OpenStackApi;
pub use client::{OpenStackClient, OpenStackConfig};
pub use driver::{OpenStackConnection, OpenStackDriver};
pub use error::OpenStackError;
