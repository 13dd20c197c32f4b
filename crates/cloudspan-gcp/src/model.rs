//! Compute Engine resource models
//!
//! Only the fields the handlers read. `uint64`/`int64` fields arrive as
//! JSON strings, so ids and sizes stay `String`.

use serde::{Deserialize, Serialize};

// ============ Instances ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub zone: String,
    pub machine_type: String,

    /// `PROVISIONING`, `STAGING`, `RUNNING`, `STOPPING`, `SUSPENDING`,
    /// `SUSPENDED`, `REPAIRING` or `TERMINATED`
    pub status: String,
    pub creation_timestamp: String,
    pub network_interfaces: Vec<NetworkInterface>,
    pub disks: Vec<AttachedDisk>,
    pub tags: Tags,
    pub self_link: String,
}

impl Instance {
    pub fn boot_disk(&self) -> Option<&AttachedDisk> {
        self.disks
            .iter()
            .find(|d| d.boot)
            .or_else(|| self.disks.first())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkInterface {
    pub name: String,
    pub network: String,
    pub subnetwork: String,
    #[serde(rename = "networkIP")]
    pub network_ip: String,
    pub access_configs: Vec<AccessConfig>,
}

impl NetworkInterface {
    pub fn external(&self) -> Option<&AccessConfig> {
        self.access_configs.first()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessConfig {
    pub name: String,
    #[serde(rename = "natIP")]
    pub nat_ip: String,
    pub network_tier: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttachedDisk {
    pub device_name: String,
    pub source: String,
    pub boot: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Disk {
    pub name: String,
    pub source_image: String,
    pub size_gb: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tags {
    pub items: Vec<String>,
}

// ============ Images ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Image {
    pub id: String,
    pub name: String,

    /// `PENDING`, `READY`, `FAILED` or `DELETING`
    pub status: String,
    pub source_type: String,
    pub source_disk: String,
    pub disk_size_gb: String,
    pub licenses: Vec<String>,
    pub guest_os_features: Vec<GuestOsFeature>,
    pub self_link: String,
}

impl Image {
    /// Last segment of the first license, e.g. `ubuntu-2204-lts`.
    pub fn guest_os(&self) -> String {
        self.licenses
            .first()
            .and_then(|l| l.rsplit('/').next())
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuestOsFeature {
    #[serde(rename = "type")]
    pub kind: String,
}

// ============ Networks ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Network {
    pub id: String,
    pub name: String,
    pub auto_create_subnetworks: bool,
    pub subnetworks: Vec<String>,
    pub self_link: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Subnetwork {
    pub id: String,
    pub name: String,
    pub network: String,
    pub region: String,
    pub ip_cidr_range: String,
    pub gateway_address: String,
    pub state: Option<String>,
    pub self_link: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Firewall {
    pub id: String,
    pub name: String,
    pub network: String,

    /// `INGRESS` or `EGRESS`
    pub direction: String,
    pub priority: Option<i64>,
    pub allowed: Vec<FirewallAllowed>,
    pub source_ranges: Vec<String>,
    pub destination_ranges: Vec<String>,
    pub target_tags: Vec<String>,
    pub self_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallAllowed {
    #[serde(rename = "IPProtocol")]
    pub ip_protocol: String,
    pub ports: Vec<String>,
}
