//! Decoding and long-running operation helpers shared by the handlers

use crate::api::{Accepted, AzureApi, OperationStatus};
use cloudspan_driver::{CloudError, HandlerContext, PollStatus, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

pub async fn fetch<T: DeserializeOwned>(
    api: &dyn AzureApi,
    path: &str,
    api_version: &str,
) -> Result<T> {
    Ok(serde_json::from_value(api.get(path, api_version).await?)?)
}

pub async fn fetch_all<T: DeserializeOwned>(
    api: &dyn AzureApi,
    path: &str,
    api_version: &str,
) -> Result<Vec<T>> {
    api.list(path, api_version)
        .await?
        .into_iter()
        .map(|v| serde_json::from_value(v).map_err(CloudError::from))
        .collect()
}

/// Waits for the operation behind `accepted`, if any, and returns its body.
pub async fn complete(
    api: &dyn AzureApi,
    ctx: &HandlerContext,
    operation: &str,
    accepted: Accepted,
) -> Result<Value> {
    let Some(url) = accepted.operation else {
        return Ok(accepted.body);
    };

    let url = url.as_str();
    ctx.wait_for(operation, move || async move {
        match api.operation_status(url).await? {
            OperationStatus::InProgress => Ok(PollStatus::Pending),
            OperationStatus::Succeeded => Ok(PollStatus::Done(())),
            OperationStatus::Failed(message) => Err(CloudError::OperationFailed {
                operation: operation.to_string(),
                message,
            }),
        }
    })
    .await?;
    Ok(accepted.body)
}
