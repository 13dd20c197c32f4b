//! Vendor API seam between handlers and the REST client

use crate::model::*;
use async_trait::async_trait;
use cloudspan_driver::Result;

/// The Nova / Neutron / Glance calls the handlers rely on.
///
/// [`crate::client::OpenStackClient`] implements it over REST; tests plug in
/// an in-memory backend.
#[async_trait]
pub trait OpenStackApi: Send + Sync {
    // Compute
    async fn list_servers(&self) -> Result<Vec<Server>>;
    async fn get_server(&self, id: &str) -> Result<Server>;
    /// Returns the new server id
    async fn create_server(&self, req: &CreateServer) -> Result<String>;
    async fn server_action(&self, id: &str, action: ServerAction) -> Result<()>;
    async fn delete_server(&self, id: &str) -> Result<()>;
    /// Snapshots a server, returning the new image id
    async fn create_server_image(&self, server_id: &str, name: &str) -> Result<String>;
    async fn list_flavors(&self) -> Result<Vec<Flavor>>;
    async fn list_keypairs(&self) -> Result<Vec<Keypair>>;
    async fn get_keypair(&self, name: &str) -> Result<Keypair>;
    async fn create_keypair(&self, name: &str, public_key: Option<&str>) -> Result<Keypair>;
    async fn delete_keypair(&self, name: &str) -> Result<()>;

    // Image
    async fn list_images(&self) -> Result<Vec<Image>>;
    async fn get_image(&self, id: &str) -> Result<Image>;
    async fn delete_image(&self, id: &str) -> Result<()>;

    // Network
    async fn list_networks(&self) -> Result<Vec<Network>>;
    async fn create_network(&self, name: &str) -> Result<Network>;
    async fn list_subnets(&self, network_id: &str) -> Result<Vec<Subnet>>;
    async fn get_subnet(&self, id: &str) -> Result<Subnet>;
    async fn create_subnet(&self, req: &CreateSubnet) -> Result<Subnet>;
    async fn delete_subnet(&self, id: &str) -> Result<()>;
    async fn list_routers(&self) -> Result<Vec<Router>>;
    async fn create_router(&self, name: &str, external_network_id: &str) -> Result<Router>;
    async fn add_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()>;
    async fn remove_router_interface(&self, router_id: &str, subnet_id: &str) -> Result<()>;
    async fn list_security_groups(&self) -> Result<Vec<SecurityGroup>>;
    async fn get_security_group(&self, id: &str) -> Result<SecurityGroup>;
    async fn create_security_group(&self, name: &str, description: &str) -> Result<SecurityGroup>;
    async fn create_security_group_rule(
        &self,
        req: &CreateSecurityGroupRule,
    ) -> Result<SecurityGroupRule>;
    async fn delete_security_group(&self, id: &str) -> Result<()>;
    async fn list_ports(&self) -> Result<Vec<Port>>;
    async fn get_port(&self, id: &str) -> Result<Port>;
    async fn create_port(&self, req: &CreatePort) -> Result<Port>;
    async fn delete_port(&self, id: &str) -> Result<()>;
    async fn list_floating_ips(&self) -> Result<Vec<FloatingIp>>;
    async fn get_floating_ip(&self, id: &str) -> Result<FloatingIp>;
    async fn create_floating_ip(
        &self,
        floating_network_id: &str,
        description: &str,
    ) -> Result<FloatingIp>;
    /// Associates (`Some`) or disassociates (`None`) a floating IP
    async fn update_floating_ip_port(&self, id: &str, port_id: Option<&str>) -> Result<FloatingIp>;
    async fn delete_floating_ip(&self, id: &str) -> Result<()>;
}
