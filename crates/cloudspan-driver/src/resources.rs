//! Provider-agnostic request (`*ReqInfo`) and read (`*Info`) models

use crate::connection::RegionInfo;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic extension slot for provider-specific attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Finds a value in a key-value list.
pub fn key_value<'a>(list: &'a [KeyValue], key: &str) -> Option<&'a str> {
    list.iter()
        .find(|kv| kv.key == key)
        .map(|kv| kv.value.as_str())
}

// ============ VM ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VmReqInfo {
    pub name: String,
    pub image_id: String,
    pub vm_spec_id: String,
    pub vnetwork_id: String,
    pub subnet_id: String,
    pub network_interface_id: String,
    pub public_ip_id: String,
    pub security_group_ids: Vec<String>,
    pub key_pair_name: String,
    pub vm_user_id: String,
    pub vm_user_passwd: String,

    /// Idempotency token forwarded to vendors that accept one
    pub client_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VmInfo {
    pub id: String,
    pub name: String,
    pub region: RegionInfo,
    pub image_id: String,
    pub vm_spec_id: String,
    pub vnetwork_id: String,
    pub subnet_id: String,
    pub security_group_ids: Vec<String>,
    pub network_interface_id: String,
    pub public_ip: String,
    pub private_ip: String,
    pub key_pair_name: String,
    pub vm_user_id: String,
    pub vm_user_passwd: String,
    pub vm_boot_disk: String,
    pub key_value_list: Vec<KeyValue>,
}

/// Normalized VM status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VmStatus {
    Creating,
    Running,
    Suspending,
    Suspended,
    Resuming,
    Rebooting,
    Terminating,
    Terminated,
    Failed,
    #[default]
    Unknown,
}

impl fmt::Display for VmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmStatus::Creating => write!(f, "Creating"),
            VmStatus::Running => write!(f, "Running"),
            VmStatus::Suspending => write!(f, "Suspending"),
            VmStatus::Suspended => write!(f, "Suspended"),
            VmStatus::Resuming => write!(f, "Resuming"),
            VmStatus::Rebooting => write!(f, "Rebooting"),
            VmStatus::Terminating => write!(f, "Terminating"),
            VmStatus::Terminated => write!(f, "Terminated"),
            VmStatus::Failed => write!(f, "Failed"),
            VmStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmStatusInfo {
    pub vm_id: String,
    pub vm_status: VmStatus,

    /// Status in the vendor's own vocabulary, before normalization
    pub vendor_status: String,
}

impl VmStatusInfo {
    pub fn new(vm_id: impl Into<String>, vm_status: VmStatus, vendor_status: impl Into<String>) -> Self {
        Self {
            vm_id: vm_id.into(),
            vm_status,
            vendor_status: vendor_status.into(),
        }
    }
}

// ============ Image ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageReqInfo {
    pub name: String,

    /// Vendor id of the disk or instance to capture
    pub source_id: String,
    pub key_value_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageInfo {
    pub id: String,
    pub name: String,
    pub guest_os: String,
    pub status: String,
    pub key_value_list: Vec<KeyValue>,
}

// ============ Security group ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityReqInfo {
    pub name: String,
    pub vnetwork_id: String,
    pub security_rules: Vec<SecurityRuleInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityInfo {
    pub id: String,
    pub name: String,
    pub security_rules: Vec<SecurityRuleInfo>,
    pub key_value_list: Vec<KeyValue>,
}

/// One rule. Protocol and direction stay in the provider's vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityRuleInfo {
    pub from_port: String,
    pub to_port: String,
    pub ip_protocol: String,
    pub direction: String,
}

impl SecurityRuleInfo {
    pub fn new(
        from_port: impl Into<String>,
        to_port: impl Into<String>,
        ip_protocol: impl Into<String>,
        direction: impl Into<String>,
    ) -> Self {
        Self {
            from_port: from_port.into(),
            to_port: to_port.into(),
            ip_protocol: ip_protocol.into(),
            direction: direction.into(),
        }
    }

    /// `from-to`, or the single port when both ends agree.
    pub fn port_range(&self) -> String {
        if self.from_port == self.to_port || self.to_port.is_empty() {
            self.from_port.clone()
        } else {
            format!("{}-{}", self.from_port, self.to_port)
        }
    }
}

// ============ Virtual network ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VNetworkReqInfo {
    pub name: String,

    /// Synthesized from the shared base network when absent or empty
    pub address_prefix: Option<String>,
}

impl VNetworkReqInfo {
    /// The caller's prefix, unless absent or blank.
    pub fn requested_prefix(&self) -> Option<&str> {
        self.address_prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VNetworkInfo {
    pub id: String,
    pub name: String,
    pub address_prefix: String,
    pub status: String,
    pub key_value_list: Vec<KeyValue>,
}

// ============ Network interface ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VNicReqInfo {
    pub name: String,
    pub vnetwork_id: String,
    pub security_group_ids: Vec<String>,
    pub public_ip_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VNicInfo {
    pub id: String,
    pub name: String,
    pub owned_vm_id: String,
    pub mac_address: String,
    pub security_group_ids: Vec<String>,
    pub public_ip: String,
    pub status: String,
    pub key_value_list: Vec<KeyValue>,
}

// ============ Key pair ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPairReqInfo {
    pub name: String,

    /// OpenSSH public key to import; the vendor generates one when absent
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPairInfo {
    pub name: String,
    pub fingerprint: String,
    pub public_key: String,

    /// Only populated by the create call that generated the key
    pub private_key: String,
    pub key_value_list: Vec<KeyValue>,
}

// ============ Public IP ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicIpReqInfo {
    pub name: String,
    pub key_value_list: Vec<KeyValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicIpInfo {
    pub id: String,
    pub name: String,
    pub public_ip: String,
    pub owned_vm_id: String,
    pub status: String,
    pub key_value_list: Vec<KeyValue>,
}
