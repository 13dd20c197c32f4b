//! Per-connection context shared by every handler of that connection

use crate::connection::ConnectionInfo;
use crate::driver::ProviderKind;
use crate::error::Result;
use crate::operation::{PollStatus, WaitPolicy, wait_for};
use std::future::Future;
use tracing::Span;

/// Tracing span and wait bound injected into each handler.
///
/// The span lives as long as the connection's handlers; handler events are
/// emitted with it as parent, so nothing depends on a process-wide logger.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub provider: ProviderKind,
    pub span: Span,
    pub wait: WaitPolicy,
}

impl HandlerContext {
    pub fn new(provider: ProviderKind, span: Span, wait: WaitPolicy) -> Self {
        Self {
            provider,
            span,
            wait,
        }
    }

    /// Opens the `cloud_connection` span for a new connection.
    pub fn for_connection(provider: ProviderKind, info: &ConnectionInfo) -> Self {
        let span = tracing::info_span!(
            "cloud_connection",
            provider = %provider,
            region = %info.region.region,
            zone = %info.region.zone,
        );
        Self::new(provider, span, info.wait)
    }

    /// Waits on a vendor operation under this connection's policy.
    pub async fn wait_for<T, F, Fut>(&self, operation: &str, check: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<PollStatus<T>>>,
    {
        tracing::debug!(parent: &self.span, operation, "waiting for vendor operation");
        wait_for(&self.wait, operation, check).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::RegionInfo;
    use crate::error::CloudError;
    use std::time::Duration;

    #[tokio::test]
    async fn test_context_uses_connection_wait_policy() {
        let info = ConnectionInfo {
            region: RegionInfo::new("RegionOne", ""),
            wait: WaitPolicy::new(Duration::from_millis(10), Duration::from_millis(2)),
            ..Default::default()
        };
        let ctx = HandlerContext::for_connection(ProviderKind::OpenStack, &info);

        let result: Result<()> = ctx
            .wait_for("server ACTIVE", || async { Ok(PollStatus::Pending) })
            .await;
        assert!(matches!(result, Err(CloudError::OperationTimedOut { .. })));
    }
}
