//! Alibaba Cloud driver for cloudspan
//!
//! Calls the ECS (`2014-05-26`) and VPC (`2016-04-28`) RPC APIs with
//! ACS3-HMAC-SHA256 signed requests.
//!
//! # Resource mapping
//!
//! - VM: ECS instance
//! - Image: custom image created from an instance
//! - Security: ECS security group in the `CB-VNet` VPC
//! - VNetwork: vSwitch of the `CB-VNet` VPC, placed in the connection zone
//! - VNic: elastic network interface
//! - KeyPair: ECS SSH key pair
//! - PublicIp: elastic IP address
//!
//! `VmReqInfo::client_token` is sent as the `RunInstances` `ClientToken`.

pub mod api;
pub mod client;
pub mod driver;
pub mod error;
pub mod image;
pub mod keypair;
pub mod model;
pub mod public_ip;
pub mod security;
pub mod sign;
pub mod vm;
pub mod vnetwork;
pub mod vnic;

pub use api::{AlibabaApi, Params, Service};
pub use client::{AlibabaClient, AlibabaConfig};
pub use driver::{AlibabaConnection, AlibabaDriver};
pub use error::AlibabaError;
