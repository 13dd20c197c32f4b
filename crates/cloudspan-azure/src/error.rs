//! Azure transport error types

use cloudspan_driver::{CloudError, ProviderKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AzureError {
    #[error("Azure AD token request failed: {0}")]
    Authentication(String),

    #[error("HTTP {status} {code}: {message}")]
    Http {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AzureError>;

impl From<AzureError> for CloudError {
    fn from(err: AzureError) -> Self {
        match err {
            AzureError::Http {
                status: 404,
                message,
                ..
            } => CloudError::NotFound(message),
            other => CloudError::vendor(ProviderKind::Azure, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_not_found_maps_to_not_found() {
        let err: CloudError = AzureError::Http {
            status: 404,
            code: "ResourceNotFound".into(),
            message: "The Resource 'vm-1' was not found.".into(),
        }
        .into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_conflict_keeps_code_in_vendor_message() {
        let err: CloudError = AzureError::Http {
            status: 409,
            code: "OperationNotAllowed".into(),
            message: "quota exceeded".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "azure API error: HTTP 409 OperationNotAllowed: quota exceeded"
        );
    }
}
