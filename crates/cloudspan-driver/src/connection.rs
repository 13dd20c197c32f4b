//! Connection info handed to `CloudDriver::connect_cloud`

use crate::driver::ProviderKind;
use crate::error::{CloudError, Result};
use crate::operation::WaitPolicy;
use crate::resources::KeyValue;
use serde::{Deserialize, Serialize};

/// Everything a driver needs to build its vendor client.
///
/// Created by the caller per connection attempt and consumed by the driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub credential: CredentialInfo,
    pub region: RegionInfo,

    /// Bound applied to every wait on a vendor-side operation
    #[serde(default)]
    pub wait: WaitPolicy,

    /// Provider-specific connection options (e.g. `ResourceGroup` for Azure)
    #[serde(default)]
    pub key_value_list: Vec<KeyValue>,
}

/// Credential fields. Each provider reads the subset its auth scheme needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialInfo {
    /// Access key id (AWS, Alibaba) or application id (Azure)
    pub client_id: String,
    /// Secret access key (AWS, Alibaba) or client secret (Azure)
    pub client_secret: String,
    pub tenant_id: String,
    pub subscription_id: String,

    /// Keystone endpoint (OpenStack)
    pub identity_endpoint: String,
    pub username: String,
    pub password: String,
    pub domain_name: String,
    pub project_id: String,

    /// Service-account email (GCP)
    pub client_email: String,
    /// Service-account PEM private key (GCP)
    pub private_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionInfo {
    pub region: String,
    pub zone: String,
}

impl RegionInfo {
    pub fn new(region: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            zone: zone.into(),
        }
    }
}

impl ConnectionInfo {
    /// Looks up a provider-specific option.
    pub fn key_value(&self, key: &str) -> Option<&str> {
        self.key_value_list
            .iter()
            .find(|kv| kv.key == key)
            .map(|kv| kv.value.as_str())
    }

    /// Checks that every named credential/region field is non-empty.
    ///
    /// Field names are the serialized names (`client_id`, `region`, ...).
    pub fn ensure_fields(&self, provider: ProviderKind, required: &[&str]) -> Result<()> {
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| self.field(name).is_none_or(|v| v.trim().is_empty()))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CloudError::InvalidConnection(format!(
                "{provider} requires non-empty {}",
                missing.join(", ")
            )))
        }
    }

    fn field(&self, name: &str) -> Option<&str> {
        let c = &self.credential;
        let value = match name {
            "client_id" => &c.client_id,
            "client_secret" => &c.client_secret,
            "tenant_id" => &c.tenant_id,
            "subscription_id" => &c.subscription_id,
            "identity_endpoint" => &c.identity_endpoint,
            "username" => &c.username,
            "password" => &c.password,
            "domain_name" => &c.domain_name,
            "project_id" => &c.project_id,
            "client_email" => &c.client_email,
            "private_key" => &c.private_key,
            "region" => &self.region.region,
            "zone" => &self.region.zone,
            _ => return None,
        };
        Some(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ConnectionInfo {
        ConnectionInfo {
            credential: CredentialInfo {
                client_id: "AKIA".into(),
                client_secret: "secret".into(),
                ..Default::default()
            },
            region: RegionInfo {
                region: "ap-northeast-1".into(),
                zone: String::new(),
            },
            key_value_list: vec![KeyValue::new("ResourceGroup", "rg-1")],
            ..Default::default()
        }
    }

    #[test]
    fn test_ensure_fields_ok() {
        let info = info();
        assert!(
            info.ensure_fields(ProviderKind::Aws, &["client_id", "client_secret", "region"])
                .is_ok()
        );
    }

    #[test]
    fn test_ensure_fields_reports_every_missing_field() {
        let info = info();
        let err = info
            .ensure_fields(ProviderKind::Azure, &["client_id", "tenant_id", "zone"])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid connection info: azure requires non-empty tenant_id, zone"
        );
    }

    #[test]
    fn test_unknown_field_counts_as_missing() {
        let info = info();
        assert!(info.ensure_fields(ProviderKind::Aws, &["bogus"]).is_err());
    }

    #[test]
    fn test_key_value_lookup() {
        let info = info();
        assert_eq!(info.key_value("ResourceGroup"), Some("rg-1"));
        assert_eq!(info.key_value("Missing"), None);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let json = r#"{"credential":{"client_id":"a"},"region":{"region":"r"}}"#;
        let info: ConnectionInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.credential.client_id, "a");
        assert!(info.key_value_list.is_empty());
        assert_eq!(info.wait, WaitPolicy::default());
    }
}
