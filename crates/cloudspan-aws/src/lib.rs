//! AWS driver for cloudspan
//!
//! Built on the official `aws-sdk-ec2` crate. Everything lives in one
//! region's EC2 API.
//!
//! # Resource mapping
//!
//! - VM: EC2 instance
//! - Image: AMI registered from an instance
//! - Security: VPC security group
//! - VNetwork: subnet of the `CB-VNet` VPC
//! - VNic: elastic network interface
//! - KeyPair: EC2 key pair
//! - PublicIp: elastic IP (VPC domain)
//!
//! Instances require a key pair; password logins are not offered.

pub mod api;
pub mod client;
pub mod driver;
pub mod error;
pub mod image;
pub mod keypair;
pub mod model;
pub mod public_ip;
pub mod security;
pub mod vm;
pub mod vnetwork;
pub mod vnic;

pub use api::Ec2Api;
pub use client::{AwsConfig, Ec2Client};
pub use driver::{AwsConnection, AwsDriver};
pub use error::AwsError;
