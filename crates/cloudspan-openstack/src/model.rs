//! Nova / Neutron / Glance resource shapes

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============ Compute (Nova) ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(rename = "OS-EXT-STS:task_state")]
    pub task_state: Option<String>,
    #[serde(rename = "OS-EXT-AZ:availability_zone")]
    pub availability_zone: String,
    /// `{"id": ...}`, or `""` for volume-backed servers
    pub image: serde_json::Value,
    pub flavor: FlavorRef,
    pub key_name: Option<String>,
    pub addresses: BTreeMap<String, Vec<ServerAddress>>,
    pub security_groups: Vec<NamedRef>,
    pub created: String,
    #[serde(rename = "hostId")]
    pub host_id: String,
    #[serde(rename = "os-extended-volumes:volumes_attached")]
    pub volumes_attached: Vec<IdRef>,
    pub fault: Option<Fault>,
}

impl Server {
    pub fn image_id(&self) -> &str {
        self.image
            .get("id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
    }

    /// First address of the given `OS-EXT-IPS:type` (`fixed` / `floating`)
    pub fn address_of_type(&self, ip_type: &str) -> Option<&ServerAddress> {
        self.addresses
            .values()
            .flatten()
            .find(|a| a.ip_type == ip_type)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlavorRef {
    pub id: Option<String>,
    pub original_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerAddress {
    pub addr: String,
    pub version: u8,
    #[serde(rename = "OS-EXT-IPS:type")]
    pub ip_type: String,
    #[serde(rename = "OS-EXT-IPS-MAC:mac_addr")]
    pub mac_addr: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fault {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateServer {
    pub name: String,
    #[serde(rename = "imageRef")]
    pub image_ref: String,
    #[serde(rename = "flavorRef")]
    pub flavor_ref: String,
    pub networks: Vec<ServerNetwork>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub security_groups: Vec<NamedRef>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub key_name: Option<String>,
    #[serde(rename = "adminPass", skip_serializing_if = "Option::is_none", default)]
    pub admin_pass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub availability_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerNetwork {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub port: Option<String>,
}

/// Power actions posted to `/servers/{id}/action`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerAction {
    Stop,
    Start,
    Reboot,
}

impl ServerAction {
    pub fn body(&self) -> serde_json::Value {
        match self {
            ServerAction::Stop => serde_json::json!({ "os-stop": null }),
            ServerAction::Start => serde_json::json!({ "os-start": null }),
            ServerAction::Reboot => serde_json::json!({ "reboot": { "type": "SOFT" } }),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    pub vcpus: u32,
    pub ram: u64,
    pub disk: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Keypair {
    pub name: String,
    pub public_key: String,
    pub fingerprint: String,
    /// Present only in the response that generated the key
    pub private_key: Option<String>,
    #[serde(rename = "type")]
    pub key_type: Option<String>,
}

// ============ Image (Glance v2) ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Image {
    pub id: String,
    pub name: String,
    pub status: String,
    pub disk_format: Option<String>,
    pub container_format: Option<String>,
    pub size: Option<u64>,
    pub min_disk: u64,
    pub visibility: String,
    pub os_distro: Option<String>,
}

// ============ Network (Neutron v2.0) ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub status: String,
    pub subnets: Vec<String>,
    #[serde(rename = "router:external")]
    pub external: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub network_id: String,
    pub cidr: String,
    pub ip_version: u8,
    pub gateway_ip: Option<String>,
    pub dns_nameservers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSubnet {
    pub network_id: String,
    pub name: String,
    pub cidr: String,
    pub ip_version: u8,
    pub dns_nameservers: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Router {
    pub id: String,
    pub name: String,
    pub status: String,
    pub external_gateway_info: Option<ExternalGateway>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalGateway {
    pub network_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    pub description: String,
    pub security_group_rules: Vec<SecurityGroupRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityGroupRule {
    pub id: String,
    pub security_group_id: String,
    pub direction: String,
    pub ethertype: String,
    pub protocol: Option<String>,
    pub port_range_min: Option<u16>,
    pub port_range_max: Option<u16>,
    pub remote_ip_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSecurityGroupRule {
    pub security_group_id: String,
    pub direction: String,
    pub ethertype: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub port_range_min: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub port_range_max: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub remote_ip_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Port {
    pub id: String,
    pub name: String,
    pub network_id: String,
    pub mac_address: String,
    pub device_id: String,
    pub device_owner: String,
    pub status: String,
    pub fixed_ips: Vec<FixedIp>,
    pub security_groups: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedIp {
    pub subnet_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ip_address: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePort {
    pub network_id: String,
    pub name: String,
    pub fixed_ips: Vec<FixedIp>,
    pub security_groups: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatingIp {
    pub id: String,
    pub floating_ip_address: String,
    pub floating_network_id: String,
    pub port_id: Option<String>,
    pub fixed_ip_address: Option<String>,
    pub status: String,
    pub description: String,
}
