//! Driver error types

use crate::driver::{Capability, ProviderKind};
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by every cloudspan driver
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    #[error("{provider} driver does not offer a {capability} handler")]
    Unsupported {
        provider: ProviderKind,
        capability: Capability,
    },

    #[error("{kind} with name {name} already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Vendor API or transport failure, message kept verbatim
    #[error("{provider} API error: {message}")]
    Vendor {
        provider: ProviderKind,
        message: String,
    },

    /// The vendor operation reached a failed terminal state
    #[error("Operation {operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("Operation {operation} did not complete within {timeout:?}")]
    OperationTimedOut { operation: String, timeout: Duration },

    #[error("Invalid connection info: {0}")]
    InvalidConnection(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid CIDR: {0}")]
    InvalidCidr(String),

    #[error("No free /24 subnet left in {base}")]
    SubnetPoolExhausted { base: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn vendor(provider: ProviderKind, message: impl Display) -> Self {
        Self::Vendor {
            provider,
            message: message.to_string(),
        }
    }

    pub fn already_exists(kind: &'static str, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }

    pub fn unsupported(provider: ProviderKind, capability: Capability) -> Self {
        Self::Unsupported {
            provider,
            capability,
        }
    }

    /// True when the vendor reported the resource as absent.
    ///
    /// Existence lookups use this to tell "free name" apart from a real failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

/// Turns a Get result into an existence answer: `NotFound` means absent,
/// every other error propagates.
pub fn found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}
