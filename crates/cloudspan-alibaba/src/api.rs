//! RPC abstraction over the ECS and VPC APIs

use async_trait::async_trait;
use cloudspan_driver::{CloudError, ProviderKind, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Query parameters of one call
pub type Params = BTreeMap<String, String>;

/// Page size for `Describe*` calls
pub const PAGE_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Ecs,
    Vpc,
}

impl Service {
    pub fn version(&self) -> &'static str {
        match self {
            Service::Ecs => "2014-05-26",
            Service::Vpc => "2016-04-28",
        }
    }

    pub fn host(&self, region: &str) -> String {
        match self {
            Service::Ecs => format!("ecs.{region}.aliyuncs.com"),
            Service::Vpc => format!("vpc.{region}.aliyuncs.com"),
        }
    }
}

/// One signed RPC call per method invocation. Implementations add
/// `RegionId` when the caller did not.
#[async_trait]
pub trait AlibabaApi: Send + Sync {
    async fn call(&self, service: Service, action: &str, params: Params) -> Result<Value>;
}

/// Builds [`Params`] from string pairs.
pub fn params<const N: usize>(pairs: [(&str, &str); N]) -> Params {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Items under a `/Outer/Inner` JSON pointer, empty when absent.
pub fn items(response: &Value, pointer: &str) -> Vec<Value> {
    response
        .pointer(pointer)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// String at `key`, error when missing.
pub fn required_str(response: &Value, key: &str) -> Result<String> {
    response[key]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| CloudError::vendor(ProviderKind::Alibaba, format!("response carries no {key}")))
}

/// Pages through a `Describe*` action by `PageNumber` until `TotalCount`
/// items were read.
pub async fn describe_all<T: DeserializeOwned>(
    api: &dyn AlibabaApi,
    service: Service,
    action: &str,
    params: Params,
    pointer: &str,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    let mut page = 1usize;
    loop {
        let mut query = params.clone();
        query.insert("PageNumber".into(), page.to_string());
        query.insert("PageSize".into(), PAGE_SIZE.to_string());

        let response = api.call(service, action, query).await?;
        let batch = items(&response, pointer);
        let fetched = batch.len();
        for item in batch {
            out.push(serde_json::from_value(item)?);
        }

        let total = response["TotalCount"].as_u64().unwrap_or(0) as usize;
        if fetched == 0 || out.len() >= total {
            return Ok(out);
        }
        page += 1;
    }
}

/// First item of a filtered `Describe*`, `NotFound` when the filter matched
/// nothing.
pub async fn describe_one<T: DeserializeOwned>(
    api: &dyn AlibabaApi,
    service: Service,
    action: &str,
    params: Params,
    pointer: &str,
    what: &str,
) -> Result<T> {
    let response = api.call(service, action, params).await?;
    match items(&response, pointer).into_iter().next() {
        Some(item) => Ok(serde_json::from_value(item)?),
        None => Err(CloudError::NotFound(format!("{what} does not exist"))),
    }
}

/// JSON array parameter such as `InstanceIds=["i-1"]`.
pub fn json_list(values: &[&str]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}
