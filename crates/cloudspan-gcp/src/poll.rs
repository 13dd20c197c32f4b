//! Decoding and operation helpers shared by the handlers

use crate::api::{GcpApi, Operation};
use cloudspan_driver::{CloudError, HandlerContext, PollStatus, Result};
use serde::de::DeserializeOwned;

pub async fn fetch<T: DeserializeOwned>(api: &dyn GcpApi, path: &str) -> Result<T> {
    Ok(serde_json::from_value(api.get(path).await?)?)
}

pub async fn fetch_all<T: DeserializeOwned>(api: &dyn GcpApi, path: &str) -> Result<Vec<T>> {
    api.list(path)
        .await?
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(CloudError::from))
        .collect()
}

/// Polls `started` until it is `DONE`; a done operation carrying errors
/// becomes [`CloudError::OperationFailed`].
pub async fn complete(
    api: &dyn GcpApi,
    ctx: &HandlerContext,
    operation: &str,
    started: Operation,
) -> Result<Operation> {
    let check = |op: Operation| match op.failure() {
        Some(message) => Err(CloudError::OperationFailed {
            operation: operation.to_string(),
            message,
        }),
        None => Ok(op),
    };
    if started.is_done() {
        return check(started);
    }

    let link = started.self_link.as_str();
    let finished = ctx
        .wait_for(operation, move || async move {
            let op = api.operation(link).await?;
            Ok(if op.is_done() {
                PollStatus::Done(op)
            } else {
                PollStatus::Pending
            })
        })
        .await?;
    check(finished)
}
