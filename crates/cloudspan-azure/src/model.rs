//! Resource Manager payloads, decoded from and encoded to JSON

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRef {
    pub id: String,
}

impl IdRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

// ============ Compute ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualMachine {
    pub id: String,
    pub name: String,
    pub location: String,
    pub zones: Vec<String>,
    pub properties: VmProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VmProperties {
    pub provisioning_state: String,
    pub vm_id: String,
    pub hardware_profile: HardwareProfile,
    pub storage_profile: StorageProfile,
    pub os_profile: OsProfile,
    pub network_profile: NetworkProfile,
    pub instance_view: Option<InstanceView>,
    pub time_created: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HardwareProfile {
    pub vm_size: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageProfile {
    pub image_reference: ImageReference,
    pub os_disk: OsDisk,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ImageReference {
    /// `publisher:offer:sku:version` for marketplace images, a resource id
    /// for custom ones.
    pub fn parse(image: &str) -> Self {
        let parts: Vec<&str> = image.split(':').collect();
        if let [publisher, offer, sku, version] = parts.as_slice() {
            Self {
                publisher: Some(publisher.to_string()),
                offer: Some(offer.to_string()),
                sku: Some(sku.to_string()),
                version: Some(version.to_string()),
                id: None,
            }
        } else {
            Self {
                id: Some(image.to_string()),
                ..Default::default()
            }
        }
    }

    pub fn to_image_id(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        [&self.publisher, &self.offer, &self.sku, &self.version]
            .iter()
            .map(|p| p.as_deref().unwrap_or_default())
            .collect::<Vec<_>>()
            .join(":")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OsDisk {
    pub name: String,
    pub os_type: Option<String>,
    #[serde(rename = "diskSizeGB")]
    pub disk_size_gb: Option<u32>,
    pub managed_disk: Option<IdRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OsProfile {
    pub computer_name: String,
    pub admin_username: String,
    pub linux_configuration: Option<LinuxConfiguration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinuxConfiguration {
    pub disable_password_authentication: bool,
    pub ssh: Option<SshConfiguration>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SshConfiguration {
    pub public_keys: Vec<SshPublicKeyEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SshPublicKeyEntry {
    pub path: String,
    pub key_data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkProfile {
    pub network_interfaces: Vec<IdRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceView {
    pub statuses: Vec<InstanceStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceStatus {
    pub code: String,
    pub display_status: Option<String>,
}

impl InstanceView {
    fn status_with_prefix(&self, prefix: &str) -> Option<&str> {
        self.statuses
            .iter()
            .find_map(|s| s.code.strip_prefix(prefix))
    }

    /// `running` out of `PowerState/running`
    pub fn power_state(&self) -> Option<&str> {
        self.status_with_prefix("PowerState/")
    }

    /// `succeeded` out of `ProvisioningState/succeeded`
    pub fn provisioning_state(&self) -> Option<&str> {
        self.status_with_prefix("ProvisioningState/")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub name: String,
    pub location: String,
    pub properties: ImageProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageProperties {
    pub provisioning_state: String,
    pub source_virtual_machine: Option<IdRef>,
    pub storage_profile: StorageProfile,
    pub hyper_v_generation: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SshPublicKey {
    pub id: String,
    pub name: String,
    pub properties: SshPublicKeyProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SshPublicKeyProperties {
    pub public_key: Option<String>,
}

/// Body of `sshPublicKeys/{name}/generateKeyPair`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratedKeyPair {
    pub id: String,
    pub private_key: String,
    pub public_key: String,
}

// ============ Network ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualNetwork {
    pub id: String,
    pub name: String,
    pub location: String,
    pub properties: VirtualNetworkProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualNetworkProperties {
    pub provisioning_state: String,
    pub address_space: AddressSpace,
    pub subnets: Vec<Subnet>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressSpace {
    pub address_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub properties: SubnetProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubnetProperties {
    pub provisioning_state: String,
    pub address_prefix: String,
    pub network_security_group: Option<IdRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkSecurityGroup {
    pub id: String,
    pub name: String,
    pub location: String,
    pub properties: NetworkSecurityGroupProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkSecurityGroupProperties {
    pub provisioning_state: String,
    pub security_rules: Vec<SecurityRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityRule {
    pub name: String,
    pub properties: SecurityRuleProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityRuleProperties {
    pub protocol: String,
    pub source_port_range: String,
    pub destination_port_range: String,
    pub source_address_prefix: String,
    pub destination_address_prefix: String,
    pub access: String,
    pub priority: u32,
    pub direction: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkInterface {
    pub id: String,
    pub name: String,
    pub location: String,
    pub properties: NetworkInterfaceProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkInterfaceProperties {
    pub provisioning_state: String,
    pub mac_address: String,
    pub ip_configurations: Vec<IpConfiguration>,
    pub network_security_group: Option<IdRef>,
    pub virtual_machine: Option<IdRef>,
}

impl NetworkInterface {
    pub fn primary_ip_configuration(&self) -> Option<&IpConfigurationProperties> {
        self.properties
            .ip_configurations
            .first()
            .map(|c| &c.properties)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IpConfiguration {
    pub name: String,
    pub properties: IpConfigurationProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IpConfigurationProperties {
    #[serde(rename = "privateIPAddress")]
    pub private_ip_address: Option<String>,
    #[serde(rename = "privateIPAllocationMethod")]
    pub private_ip_allocation_method: String,
    pub subnet: Option<IdRef>,
    #[serde(rename = "publicIPAddress")]
    pub public_ip_address: Option<IdRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublicIpAddress {
    pub id: String,
    pub name: String,
    pub location: String,
    pub properties: PublicIpAddressProperties,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublicIpAddressProperties {
    pub provisioning_state: String,
    pub ip_address: Option<String>,
    #[serde(rename = "publicIPAllocationMethod")]
    pub public_ip_allocation_method: String,
    pub ip_configuration: Option<IdRef>,
}
