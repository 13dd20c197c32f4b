//! OpenStack transport error types

use cloudspan_driver::{CloudError, ProviderKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenStackError {
    #[error("Keystone authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("No {0} endpoint in the service catalog")]
    EndpointNotFound(&'static str),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, OpenStackError>;

impl From<OpenStackError> for CloudError {
    fn from(err: OpenStackError) -> Self {
        match err {
            OpenStackError::Http {
                status: 404,
                message,
            } => CloudError::NotFound(message),
            other => CloudError::vendor(ProviderKind::OpenStack, other),
        }
    }
}
