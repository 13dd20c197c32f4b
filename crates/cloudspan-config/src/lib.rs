//! Harness configuration
//!
//! One YAML file with a top-level section per provider:
//!
//! ```yaml
//! aws:
//!   credential:
//!     client_id: AKIA...
//!     client_secret: ...
//!   region: ap-northeast-1
//!   zone: ap-northeast-1a
//!   defaults:
//!     image_id: ami-0123456789abcdef0
//!     vm_spec_id: t3.micro
//! openstack:
//!   credential:
//!     identity_endpoint: https://keystone.example.com:5000/v3
//!     username: demo
//!     password: ...
//!     domain_name: Default
//!     project_id: 0123abcd
//!   region: RegionOne
//!   options:
//!     ExternalNetworkId: 5f0c...
//! ```

pub mod error;

pub use error::*;

use cloudspan_driver::{
    ConnectionInfo, CredentialInfo, KeyValue, ProviderKind, RegionInfo, WaitPolicy,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Env var naming the config file directly
pub const CONFIG_ENV: &str = "CLOUDSPAN_CONFIG";

/// Env var naming the project root holding `config/config.yaml`
pub const ROOT_ENV: &str = "CLOUDSPAN_PATH";

const RELATIVE_CONFIG: &str = "config/config.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub alibaba: Option<ProviderSection>,
    pub aws: Option<ProviderSection>,
    pub azure: Option<ProviderSection>,
    pub gcp: Option<ProviderSection>,
    pub openstack: Option<ProviderSection>,
}

/// Credentials, placement and example resource ids for one provider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub credential: CredentialInfo,
    pub region: String,
    pub zone: String,

    /// Provider-specific connection options, passed through as key-values
    pub options: BTreeMap<String, String>,
    pub wait: WaitSection,
    pub defaults: ResourceDefaults,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WaitSection {
    pub timeout_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for WaitSection {
    fn default() -> Self {
        let policy = WaitPolicy::default();
        Self {
            timeout_secs: policy.timeout.as_secs(),
            poll_interval_secs: policy.poll_interval.as_secs(),
        }
    }
}

/// Resource ids the harness falls back to when a flag is omitted
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResourceDefaults {
    pub base_name: String,
    pub vm_id: String,
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
}

impl Config {
    pub fn section(&self, kind: ProviderKind) -> Result<&ProviderSection> {
        let section = match kind {
            ProviderKind::Alibaba => &self.alibaba,
            ProviderKind::Aws => &self.aws,
            ProviderKind::Azure => &self.azure,
            ProviderKind::Gcp => &self.gcp,
            ProviderKind::OpenStack => &self.openstack,
        };
        section.as_ref().ok_or(ConfigError::MissingProvider(kind))
    }
}

impl ProviderSection {
    pub fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            credential: self.credential.clone(),
            region: RegionInfo::new(&self.region, &self.zone),
            wait: WaitPolicy::new(
                Duration::from_secs(self.wait.timeout_secs),
                Duration::from_secs(self.wait.poll_interval_secs),
            ),
            key_value_list: self
                .options
                .iter()
                .map(|(k, v)| KeyValue::new(k, v))
                .collect(),
        }
    }
}

/// Locates the config file.
///
/// Lookup order:
/// 1. `CLOUDSPAN_CONFIG` (direct path)
/// 2. `$CLOUDSPAN_PATH/config/config.yaml`
/// 3. `./config/config.yaml`
/// 4. `~/.config/cloudspan/config.yaml`
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Ok(root) = std::env::var(ROOT_ENV) {
        let path = Path::new(&root).join(RELATIVE_CONFIG);
        if path.exists() {
            return Ok(path);
        }
    }

    let local = std::env::current_dir()?.join(RELATIVE_CONFIG);
    if local.exists() {
        return Ok(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("cloudspan").join("config.yaml");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

pub fn load_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Finds and parses the config file.
pub fn load() -> Result<Config> {
    load_from(&find_config_file()?)
}
