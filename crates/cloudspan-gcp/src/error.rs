//! Compute Engine transport error types

use cloudspan_driver::{CloudError, ProviderKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GcpError {
    #[error("OAuth token request failed: {0}")]
    Authentication(String),

    #[error("Invalid service account key: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP {status} {reason}: {message}")]
    Http {
        status: u16,
        reason: String,
        message: String,
    },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GcpError>;

impl From<GcpError> for CloudError {
    fn from(err: GcpError) -> Self {
        match err {
            GcpError::Http {
                status: 404,
                message,
                ..
            } => CloudError::NotFound(message),
            other => CloudError::vendor(ProviderKind::Gcp, other),
        }
    }
}
