//! Plain EC2 resource views
//!
//! The SDK types are non-exhaustive and builder-only, so the client copies
//! what the handlers read into these structs. The `Name` tag is lifted into
//! `name` everywhere.

/// `Name` tag key
pub const NAME_TAG: &str = "Name";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instance {
    pub instance_id: String,
    pub name: String,
    pub image_id: String,
    pub instance_type: String,

    /// `pending`, `running`, `stopping`, `stopped`, `shutting-down` or `terminated`
    pub state: String,
    pub availability_zone: String,
    pub vpc_id: String,
    pub subnet_id: String,
    pub security_group_ids: Vec<String>,
    pub network_interface_id: String,
    pub public_ip: String,
    pub private_ip: String,
    pub key_name: String,
    pub root_device_name: String,
    pub launch_time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunInstance {
    pub name: String,
    pub image_id: String,
    pub instance_type: String,
    pub subnet_id: String,
    pub security_group_ids: Vec<String>,
    pub network_interface_id: String,
    pub key_name: String,
    pub client_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub image_id: String,
    pub name: String,

    /// `pending`, `available`, `failed`, ...
    pub state: String,
    pub platform_details: String,
    pub architecture: String,
    pub root_device_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vpc {
    pub vpc_id: String,
    pub name: String,
    pub cidr_block: String,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subnet {
    pub subnet_id: String,
    pub name: String,
    pub vpc_id: String,
    pub cidr_block: String,
    pub state: String,
    pub availability_zone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityGroup {
    pub group_id: String,
    pub group_name: String,
    pub vpc_id: String,
    pub description: String,
    pub ingress: Vec<IpPermission>,
    pub egress: Vec<IpPermission>,
}

/// One permission. Ports are `None` for protocol `-1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpPermission {
    pub ip_protocol: String,
    pub from_port: Option<i32>,
    pub to_port: Option<i32>,
    pub cidr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkInterface {
    pub network_interface_id: String,
    pub name: String,
    pub subnet_id: String,
    pub vpc_id: String,
    pub mac_address: String,
    pub private_ip: String,
    pub public_ip: String,
    pub attached_instance_id: String,
    pub status: String,
    pub group_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPair {
    pub key_name: String,
    pub key_pair_id: String,
    pub fingerprint: String,
    pub key_type: String,
    pub public_key: String,

    /// Only set by `CreateKeyPair`
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub allocation_id: String,
    pub name: String,
    pub public_ip: String,
    pub instance_id: String,
    pub association_id: String,
    pub network_interface_id: String,
    pub domain: String,
}
