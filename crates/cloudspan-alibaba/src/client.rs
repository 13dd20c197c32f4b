//! Signed RPC client for the ECS and VPC endpoints of one region

use crate::api::{AlibabaApi, Params, Service};
use crate::error::{AlibabaError, Result};
use crate::sign::{RpcRequest, sign};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

/// AccessKey credentials and region
#[derive(Debug, Clone)]
pub struct AlibabaConfig {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub region: String,
}

pub struct AlibabaClient {
    http: reqwest::Client,
    config: AlibabaConfig,
}

impl AlibabaClient {
    pub fn new(config: AlibabaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn send(&self, service: Service, action: &str, mut params: Params) -> Result<Value> {
        params
            .entry("RegionId".to_string())
            .or_insert_with(|| self.config.region.clone());

        let host = service.host(&self.config.region);
        let date = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let nonce = uuid::Uuid::new_v4().to_string();
        let signed = sign(
            &RpcRequest {
                host: &host,
                action,
                version: service.version(),
                params: &params,
            },
            &self.config.access_key_id,
            &self.config.access_key_secret,
            &date,
            &nonce,
        )?;

        tracing::debug!(%host, action, "Alibaba Cloud request");
        let mut request = self
            .http
            .post(format!("https://{host}/?{}", signed.query));
        for (name, value) in &signed.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &text));
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// `{"Code": ..., "Message": ..., "RequestId": ...}`, or the raw text.
fn api_error(status: u16, text: &str) -> AlibabaError {
    let body: Value = serde_json::from_str(text).unwrap_or(Value::Null);
    let field = |key: &str| body[key].as_str().unwrap_or_default().to_string();
    let message = match field("Message") {
        m if m.is_empty() => text.to_string(),
        m => m,
    };
    AlibabaError::Api {
        status,
        code: field("Code"),
        message,
        request_id: field("RequestId"),
    }
}

#[async_trait]
impl AlibabaApi for AlibabaClient {
    async fn call(
        &self,
        service: Service,
        action: &str,
        params: Params,
    ) -> cloudspan_driver::Result<Value> {
        Ok(self.send(service, action, params).await?)
    }
}
