//! EC2 error conversion
//!
//! SDK errors carry an EC2 error code such as `InvalidInstanceID.NotFound`.
//! Every `*.NotFound` code becomes [`CloudError::NotFound`].

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use cloudspan_driver::{CloudError, ProviderKind};
use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("{operation} failed: {code}: {message}")]
    Service {
        operation: &'static str,
        code: String,
        message: String,
    },

    #[error("{operation} failed: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} returned no {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}

impl AwsError {
    pub fn from_sdk<E, R>(operation: &'static str, err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: Debug + Send + Sync + 'static,
    {
        match err.code() {
            Some(code) => AwsError::Service {
                operation,
                code: code.to_string(),
                message: err.message().unwrap_or_default().to_string(),
            },
            None => AwsError::Transport {
                operation,
                message: DisplayErrorContext(&err).to_string(),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::Service { code, .. } if code.ends_with("NotFound"))
    }
}

impl From<AwsError> for CloudError {
    fn from(err: AwsError) -> Self {
        if err.is_not_found() {
            CloudError::NotFound(err.to_string())
        } else {
            CloudError::vendor(ProviderKind::Aws, err)
        }
    }
}

/// `map_err` adapter for SDK calls
pub fn sdk<E, R>(operation: &'static str) -> impl FnOnce(SdkError<E, R>) -> CloudError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    move |err| AwsError::from_sdk(operation, err).into()
}
