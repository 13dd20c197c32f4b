//! EC2 call seam between handlers and the SDK client

use crate::model::*;
use async_trait::async_trait;
use cloudspan_driver::Result;

/// The EC2 calls the handlers rely on.
///
/// [`crate::client::Ec2Client`] implements it over `aws-sdk-ec2`; tests plug
/// in an in-memory backend. Single-resource lookups fail with
/// `CloudError::NotFound` when EC2 does not know the id.
#[async_trait]
pub trait Ec2Api: Send + Sync {
    // Instances
    async fn run_instance(&self, req: &RunInstance) -> Result<Instance>;
    /// Every instance that is not `terminated`
    async fn describe_instances(&self) -> Result<Vec<Instance>>;
    async fn describe_instance(&self, id: &str) -> Result<Instance>;
    async fn stop_instance(&self, id: &str) -> Result<()>;
    async fn start_instance(&self, id: &str) -> Result<()>;
    async fn reboot_instance(&self, id: &str) -> Result<()>;
    async fn terminate_instance(&self, id: &str) -> Result<()>;

    // Images
    /// Returns the new image id
    async fn create_image(&self, instance_id: &str, name: &str) -> Result<String>;
    /// Images owned by the account
    async fn describe_images(&self) -> Result<Vec<Image>>;
    async fn describe_image(&self, id: &str) -> Result<Image>;
    async fn deregister_image(&self, id: &str) -> Result<()>;

    // VPC
    async fn describe_vpcs_by_name(&self, name: &str) -> Result<Vec<Vpc>>;
    async fn create_vpc(&self, name: &str, cidr: &str) -> Result<Vpc>;
    /// Creates an internet gateway, attaches it and routes `0.0.0.0/0`
    /// through it in the VPC's main route table.
    async fn attach_internet_gateway(&self, vpc_id: &str) -> Result<String>;
    async fn describe_subnets(&self, vpc_id: &str) -> Result<Vec<Subnet>>;
    async fn describe_subnet(&self, id: &str) -> Result<Subnet>;
    async fn create_subnet(&self, vpc_id: &str, name: &str, cidr: &str, zone: &str)
    -> Result<Subnet>;
    async fn delete_subnet(&self, id: &str) -> Result<()>;

    // Security groups
    async fn describe_security_groups(&self) -> Result<Vec<SecurityGroup>>;
    async fn describe_security_group(&self, id: &str) -> Result<SecurityGroup>;
    /// Returns the new group id
    async fn create_security_group(&self, name: &str, vpc_id: &str) -> Result<String>;
    async fn authorize_ingress(&self, group_id: &str, permissions: &[IpPermission]) -> Result<()>;
    async fn authorize_egress(&self, group_id: &str, permissions: &[IpPermission]) -> Result<()>;
    async fn delete_security_group(&self, id: &str) -> Result<()>;

    // Network interfaces
    async fn create_network_interface(
        &self,
        name: &str,
        subnet_id: &str,
        group_ids: &[String],
    ) -> Result<NetworkInterface>;
    async fn describe_network_interfaces(&self) -> Result<Vec<NetworkInterface>>;
    async fn describe_network_interface(&self, id: &str) -> Result<NetworkInterface>;
    async fn delete_network_interface(&self, id: &str) -> Result<()>;

    // Key pairs
    async fn create_key_pair(&self, name: &str) -> Result<KeyPair>;
    async fn import_key_pair(&self, name: &str, public_key: &str) -> Result<KeyPair>;
    async fn describe_key_pairs(&self) -> Result<Vec<KeyPair>>;
    async fn describe_key_pair(&self, name: &str) -> Result<KeyPair>;
    async fn delete_key_pair(&self, name: &str) -> Result<()>;

    // Elastic IPs
    async fn allocate_address(&self, name: &str) -> Result<Address>;
    async fn describe_addresses(&self) -> Result<Vec<Address>>;
    async fn describe_address(&self, allocation_id: &str) -> Result<Address>;
    async fn associate_address(&self, allocation_id: &str, network_interface_id: &str)
    -> Result<()>;
    async fn release_address(&self, allocation_id: &str) -> Result<()>;
}
