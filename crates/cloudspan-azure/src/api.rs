//! Resource Manager transport seam
//!
//! ARM exposes every resource under a uniform path, so handlers speak in
//! paths and JSON bodies and decode them into [`crate::model`] types.

use async_trait::async_trait;
use cloudspan_driver::Result;
use serde_json::Value;

pub const COMPUTE_API_VERSION: &str = "2024-03-01";
pub const NETWORK_API_VERSION: &str = "2024-01-01";

pub const COMPUTE: &str = "Microsoft.Compute";
pub const NETWORK: &str = "Microsoft.Network";

/// Response to a mutating call
#[derive(Debug, Clone, Default)]
pub struct Accepted {
    pub body: Value,

    /// `Azure-AsyncOperation` or `Location` URL to poll, when ARM returns one
    pub operation: Option<String>,
}

/// State of an ARM long-running operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus {
    InProgress,
    Succeeded,
    Failed(String),
}

#[async_trait]
pub trait AzureApi: Send + Sync {
    async fn get(&self, path: &str, api_version: &str) -> Result<Value>;

    /// Every item of a collection, following `nextLink`
    async fn list(&self, path: &str, api_version: &str) -> Result<Vec<Value>>;

    async fn put(&self, path: &str, api_version: &str, body: &Value) -> Result<Accepted>;
    async fn post(&self, path: &str, api_version: &str) -> Result<Accepted>;
    async fn delete(&self, path: &str, api_version: &str) -> Result<Accepted>;
    async fn operation_status(&self, url: &str) -> Result<OperationStatus>;
}

/// Subscription, resource group and location one connection works in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceScope {
    pub subscription_id: String,
    pub resource_group: String,
    pub location: String,
}

impl ResourceScope {
    pub fn collection(&self, provider: &str, kind: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{}/{}",
            self.subscription_id, self.resource_group, provider, kind
        )
    }

    pub fn path(&self, provider: &str, kind: &str, name: &str) -> String {
        format!("{}/{}", self.collection(provider, kind), name)
    }

    /// Accepts a full resource id or a bare name in this resource group.
    pub fn resolve(&self, provider: &str, kind: &str, id_or_name: &str) -> String {
        if id_or_name.starts_with("/subscriptions/") {
            id_or_name.to_string()
        } else {
            self.path(provider, kind, id_or_name)
        }
    }
}

/// Last path segment of a resource id.
pub fn resource_name(id: &str) -> &str {
    id.trim_end_matches('/').rsplit('/').next().unwrap_or(id)
}

/// VM name out of a resource id that may point below the VM
/// (e.g. `.../virtualMachines/vm-1/instanceView`).
pub fn vm_name_from_id(id: &str) -> Option<&str> {
    let mut segments = id.split('/');
    segments.find(|s| s.eq_ignore_ascii_case("virtualMachines"))?;
    segments.next().filter(|s| !s.is_empty())
}
