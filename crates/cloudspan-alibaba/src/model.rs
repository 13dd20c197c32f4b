//! ECS and VPC response payloads
//!
//! Lists arrive wrapped twice (`{"Instances": {"Instance": [...]}}`); the
//! handlers unwrap the outer layers with a JSON pointer and decode items
//! into these types.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct IpList {
    pub ip_address: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SecurityGroupIds {
    pub security_group_id: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VpcAttributes {
    pub vpc_id: String,
    #[serde(rename = "VSwitchId")]
    pub vswitch_id: String,
    pub private_ip_address: IpList,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EipBinding {
    pub ip_address: String,
    pub allocation_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstanceInterface {
    pub network_interface_id: String,
    #[serde(rename = "Type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InstanceInterfaces {
    pub network_interface: Vec<InstanceInterface>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Instance {
    pub instance_id: String,
    pub instance_name: String,
    pub image_id: String,
    pub instance_type: String,
    /// `Pending`, `Starting`, `Running`, `Stopping` or `Stopped`
    pub status: String,
    pub zone_id: String,
    pub creation_time: String,
    pub key_pair_name: String,
    pub instance_charge_type: String,
    pub vpc_attributes: VpcAttributes,
    pub security_group_ids: SecurityGroupIds,
    pub public_ip_address: IpList,
    pub eip_address: EipBinding,
    pub network_interfaces: InstanceInterfaces,
}

impl Instance {
    pub fn primary_interface(&self) -> Option<&str> {
        self.network_interfaces
            .network_interface
            .iter()
            .find(|n| n.kind == "Primary")
            .or_else(|| self.network_interfaces.network_interface.first())
            .map(|n| n.network_interface_id.as_str())
    }

    /// EIP address, else the ECS-assigned public address.
    pub fn public_ip(&self) -> String {
        if !self.eip_address.ip_address.is_empty() {
            return self.eip_address.ip_address.clone();
        }
        self.public_ip_address
            .ip_address
            .first()
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Image {
    pub image_id: String,
    pub image_name: String,
    /// `Creating`, `Available`, `CreateFailed` or `UnAvailable`
    pub status: String,
    #[serde(rename = "OSName")]
    pub os_name: String,
    #[serde(rename = "OSType")]
    pub os_type: String,
    pub architecture: String,
    pub size: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Vpc {
    pub vpc_id: String,
    pub vpc_name: String,
    pub cidr_block: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VSwitch {
    #[serde(rename = "VSwitchId")]
    pub vswitch_id: String,
    #[serde(rename = "VSwitchName")]
    pub vswitch_name: String,
    pub vpc_id: String,
    pub cidr_block: String,
    pub zone_id: String,
    pub status: String,
    pub available_ip_address_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SecurityGroup {
    pub security_group_id: String,
    pub security_group_name: String,
    pub vpc_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Permission {
    pub ip_protocol: String,
    /// `from/to`, `-1/-1` for every port
    pub port_range: String,
    /// `ingress` or `egress`
    pub direction: String,
    pub source_cidr_ip: String,
    pub dest_cidr_ip: String,
    pub policy: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Permissions {
    pub permission: Vec<Permission>,
}

/// `DescribeSecurityGroupAttribute` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SecurityGroupAttribute {
    pub security_group_id: String,
    pub security_group_name: String,
    pub vpc_id: String,
    pub description: String,
    pub permissions: Permissions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AssociatedPublicIp {
    pub public_ip_address: String,
    pub allocation_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NetworkInterface {
    pub network_interface_id: String,
    pub network_interface_name: String,
    /// `Available`, `Attaching`, `InUse`, `Detaching` or `Deleting`
    pub status: String,
    #[serde(rename = "Type")]
    pub kind: String,
    pub mac_address: String,
    pub private_ip_address: String,
    pub instance_id: String,
    #[serde(rename = "VSwitchId")]
    pub vswitch_id: String,
    pub vpc_id: String,
    pub security_group_ids: SecurityGroupIds,
    pub associated_public_ip: AssociatedPublicIp,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct KeyPair {
    pub key_pair_name: String,
    pub key_pair_finger_print: String,
    /// Only in the `CreateKeyPair` response
    pub private_key_body: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EipAddress {
    pub allocation_id: String,
    pub name: String,
    pub ip_address: String,
    /// `Associating`, `Unassociating`, `InUse` or `Available`
    pub status: String,
    pub instance_id: String,
    /// `EcsInstance`, `NetworkInterface`, `SlbInstance`, ...
    pub instance_type: String,
    pub bandwidth: String,
    pub internet_charge_type: String,
}
