//! RPC transport error types

use cloudspan_driver::{CloudError, ProviderKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AlibabaError {
    #[error("{code}: {message} (HTTP {status}, RequestId {request_id})")]
    Api {
        status: u16,
        code: String,
        message: String,
        request_id: String,
    },

    #[error("Request signing failed: {0}")]
    Signing(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AlibabaError>;

impl AlibabaError {
    /// `InvalidInstanceId.NotFound`, `InvalidVSwitchId.NotExist` and the like
    pub fn is_not_found(&self) -> bool {
        match self {
            AlibabaError::Api { status, code, .. } => {
                *status == 404 || code.contains("NotFound") || code.contains("NotExist")
            }
            _ => false,
        }
    }
}

impl From<AlibabaError> for CloudError {
    fn from(err: AlibabaError) -> Self {
        if err.is_not_found() {
            return CloudError::NotFound(err.to_string());
        }
        CloudError::vendor(ProviderKind::Alibaba, err)
    }
}
