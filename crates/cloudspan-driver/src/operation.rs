//! Bounded waiting on vendor-side long-running operations

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// How long, and how often, to poll a vendor operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitPolicy {
    /// Upper bound for one wait; exceeding it yields `OperationTimedOut`
    pub timeout: Duration,

    /// Delay between two status checks
    pub poll_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(600),
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }
}

/// Result of one status check of a vendor operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus<T> {
    Pending,
    Done(T),
}

/// Polls `check` until it reports `Done`, bounded by `policy.timeout`.
///
/// A check error ends the wait immediately: vendor errors are never retried,
/// and a failed terminal state should be returned by the check as
/// [`CloudError::OperationFailed`]. Dropping the returned future cancels the
/// wait without touching the vendor operation.
pub async fn wait_for<T, F, Fut>(policy: &WaitPolicy, operation: &str, mut check: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PollStatus<T>>>,
{
    let interval = policy.poll_interval;
    let polling = async move {
        loop {
            match check().await? {
                PollStatus::Done(value) => return Ok(value),
                PollStatus::Pending => tokio::time::sleep(interval).await,
            }
        }
    };

    match tokio::time::timeout(policy.timeout, polling).await {
        Ok(result) => result,
        Err(_) => Err(CloudError::OperationTimedOut {
            operation: operation.to_string(),
            timeout: policy.timeout,
        }),
    }
}
