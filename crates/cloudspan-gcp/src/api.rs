//! Compute Engine transport seam
//!
//! Every Compute Engine resource lives under a project-relative path
//! (`projects/{p}/zones/{z}/instances/...`), and every mutation returns an
//! [`Operation`] to poll. Handlers speak in paths and JSON bodies.

use async_trait::async_trait;
use cloudspan_driver::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[async_trait]
pub trait GcpApi: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value>;

    /// Every item of a collection, following `nextPageToken`
    async fn list(&self, path: &str) -> Result<Vec<Value>>;

    /// `insert` (POST to a collection) and custom verbs such as `stop`
    async fn post(&self, path: &str, body: &Value) -> Result<Operation>;
    async fn delete(&self, path: &str) -> Result<Operation>;

    /// Re-reads an operation through its `selfLink`
    async fn operation(&self, self_link: &str) -> Result<Operation>;
}

/// Compute Engine `Operation` resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operation {
    pub name: String,
    pub operation_type: String,

    /// `PENDING`, `RUNNING` or `DONE`
    pub status: String,
    pub target_link: String,
    pub self_link: String,
    pub error: Option<OperationError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationError {
    pub errors: Vec<OperationErrorItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationErrorItem {
    pub code: String,
    pub message: String,
}

impl Operation {
    pub fn is_done(&self) -> bool {
        self.status == "DONE"
    }

    /// Joined error messages of a finished operation, if it failed
    pub fn failure(&self) -> Option<String> {
        let errors = &self.error.as_ref()?.errors;
        if errors.is_empty() {
            return None;
        }
        Some(
            errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Project, region and zone one connection works in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    pub project_id: String,
    pub region: String,
    pub zone: String,
}

impl ProjectScope {
    pub fn global(&self, kind: &str) -> String {
        format!("projects/{}/global/{kind}", self.project_id)
    }

    pub fn regional(&self, kind: &str) -> String {
        format!("projects/{}/regions/{}/{kind}", self.project_id, self.region)
    }

    pub fn zonal(&self, kind: &str) -> String {
        format!("projects/{}/zones/{}/{kind}", self.project_id, self.zone)
    }

    /// Instance path; accepts a name or a full self link.
    pub fn instance(&self, name: &str) -> String {
        format!("{}/{}", self.zonal("instances"), resource_name(name))
    }
}

/// Last segment of a self link or partial URL.
pub fn resource_name(link: &str) -> &str {
    link.trim_end_matches('/').rsplit('/').next().unwrap_or(link)
}
