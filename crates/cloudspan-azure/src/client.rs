//! Resource Manager REST client
//!
//! Uses the OAuth2 client-credentials flow against Azure AD. The token is
//! fetched on first use and refreshed shortly before it expires.

use crate::api::{Accepted, AzureApi, OperationStatus};
use crate::error::{AzureError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;

pub const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
const LOGIN_ENDPOINT: &str = "https://login.microsoftonline.com";
const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";
const ASYNC_OPERATION_HEADER: &str = "Azure-AsyncOperation";

/// Refresh the token this long before it expires
const TOKEN_REFRESH_MARGIN_SECS: i64 = 120;

/// Service principal credentials
#[derive(Debug, Clone)]
pub struct AzureConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

pub struct AzureClient {
    http: reqwest::Client,
    config: AzureConfig,
    endpoint: String,
    token: RwLock<Option<AccessToken>>,
}

impl AzureClient {
    pub fn new(config: AzureConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            endpoint: MANAGEMENT_ENDPOINT.to_string(),
            token: RwLock::new(None),
        }
    }

    fn token_url(&self) -> String {
        format!("{LOGIN_ENDPOINT}/{}/oauth2/v2.0/token", self.config.tenant_id)
    }

    async fn request_token(&self) -> Result<AccessToken> {
        tracing::debug!(tenant = %self.config.tenant_id, "requesting Azure AD token");
        let response = self
            .http
            .post(self.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", MANAGEMENT_SCOPE),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AzureError::Authentication(format!("{status}: {text}")));
        }

        let body: TokenResponse = response.json().await?;
        Ok(AccessToken {
            token: body.access_token,
            expires_at: Utc::now() + Duration::seconds(body.expires_in),
        })
    }

    async fn bearer(&self) -> Result<String> {
        let fresh = |t: &AccessToken| {
            t.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) > Utc::now()
        };
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref().filter(|t| fresh(*t)) {
                return Ok(token.token.clone());
            }
        }

        let mut guard = self.token.write().await;
        if let Some(token) = guard.as_ref().filter(|t| fresh(*t)) {
            return Ok(token.token.clone());
        }
        let token = self.request_token().await?;
        let value = token.token.clone();
        *guard = Some(token);
        Ok(value)
    }

    fn url(&self, path: &str, api_version: &str) -> String {
        let separator = if path.contains('?') { '&' } else { '?' };
        format!("{}{path}{separator}api-version={api_version}", self.endpoint)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<(StatusCode, HeaderMap, Value)> {
        let token = self.bearer().await?;
        tracing::debug!(%method, %url, "ARM request");

        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;

        if !status.is_success() {
            let (code, message) = error_detail(&text);
            return Err(AzureError::Http {
                status: status.as_u16(),
                code,
                message,
            });
        }
        let value = if text.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };
        Ok((status, headers, value))
    }

    async fn mutate(
        &self,
        method: Method,
        path: &str,
        api_version: &str,
        body: Option<&Value>,
    ) -> Result<Accepted> {
        let url = self.url(path, api_version);
        let (_, headers, body) = self.send(method, &url, body).await?;
        Ok(Accepted {
            body,
            operation: operation_url(&headers),
        })
    }
}

/// The URL to poll for a long-running operation, if ARM returned one.
fn operation_url(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ASYNC_OPERATION_HEADER)
        .or_else(|| headers.get(LOCATION))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// `{"error": {"code": ..., "message": ...}}`, or the raw text.
fn error_detail(text: &str) -> (String, String) {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return (String::new(), text.to_string());
    };
    let error = &value["error"];
    (
        error["code"].as_str().unwrap_or_default().to_string(),
        error["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| text.to_string()),
    )
}

/// Reads an `Azure-AsyncOperation` status body.
fn parse_operation_status(status: StatusCode, body: &Value) -> OperationStatus {
    match body.get("status").and_then(Value::as_str) {
        Some("Succeeded") => OperationStatus::Succeeded,
        Some("Failed") | Some("Canceled") => OperationStatus::Failed(
            body["error"]["message"]
                .as_str()
                .unwrap_or("operation failed")
                .to_string(),
        ),
        Some(_) => OperationStatus::InProgress,
        // Location polling: 202 while running, 200/204 once done
        None if status == StatusCode::ACCEPTED => OperationStatus::InProgress,
        None => OperationStatus::Succeeded,
    }
}

#[async_trait]
impl AzureApi for AzureClient {
    async fn get(&self, path: &str, api_version: &str) -> cloudspan_driver::Result<Value> {
        let url = self.url(path, api_version);
        Ok(self.send(Method::GET, &url, None).await?.2)
    }

    async fn list(&self, path: &str, api_version: &str) -> cloudspan_driver::Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut next = Some(self.url(path, api_version));

        while let Some(url) = next.take() {
            let (_, _, mut page) = self.send(Method::GET, &url, None).await?;
            if let Value::Array(batch) = page["value"].take() {
                items.extend(batch);
            }
            next = page
                .get("nextLink")
                .and_then(Value::as_str)
                .map(str::to_string);
        }
        Ok(items)
    }

    async fn put(
        &self,
        path: &str,
        api_version: &str,
        body: &Value,
    ) -> cloudspan_driver::Result<Accepted> {
        Ok(self.mutate(Method::PUT, path, api_version, Some(body)).await?)
    }

    async fn post(&self, path: &str, api_version: &str) -> cloudspan_driver::Result<Accepted> {
        Ok(self.mutate(Method::POST, path, api_version, None).await?)
    }

    async fn delete(&self, path: &str, api_version: &str) -> cloudspan_driver::Result<Accepted> {
        Ok(self.mutate(Method::DELETE, path, api_version, None).await?)
    }

    async fn operation_status(&self, url: &str) -> cloudspan_driver::Result<OperationStatus> {
        let (status, _, body) = self.send(Method::GET, url, None).await?;
        Ok(parse_operation_status(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> AzureClient {
        AzureClient::new(AzureConfig {
            tenant_id: "tenant-1".into(),
            client_id: "app".into(),
            client_secret: "secret".into(),
        })
    }

    #[test]
    fn test_url_appends_api_version() {
        let c = client();
        assert_eq!(
            c.url("/subscriptions/s/providers/Microsoft.Compute/virtualMachines", "2024-03-01"),
            "https://management.azure.com/subscriptions/s/providers/Microsoft.Compute/virtualMachines?api-version=2024-03-01"
        );
        assert!(
            c.url("/vms?statusOnly=true", "2024-03-01")
                .ends_with("?statusOnly=true&api-version=2024-03-01")
        );
        assert_eq!(
            c.token_url(),
            "https://login.microsoftonline.com/tenant-1/oauth2/v2.0/token"
        );
    }

    #[test]
    fn test_error_detail() {
        let (code, message) = error_detail(
            r#"{"error":{"code":"ResourceNotFound","message":"The Resource 'x' was not found."}}"#,
        );
        assert_eq!(code, "ResourceNotFound");
        assert_eq!(message, "The Resource 'x' was not found.");

        let (code, message) = error_detail("Bad Gateway");
        assert!(code.is_empty());
        assert_eq!(message, "Bad Gateway");
    }

    #[test]
    fn test_operation_status_parsing() {
        assert_eq!(
            parse_operation_status(StatusCode::OK, &json!({ "status": "InProgress" })),
            OperationStatus::InProgress
        );
        assert_eq!(
            parse_operation_status(StatusCode::OK, &json!({ "status": "Succeeded" })),
            OperationStatus::Succeeded
        );
        assert_eq!(
            parse_operation_status(
                StatusCode::OK,
                &json!({ "status": "Failed", "error": { "message": "disk quota" } })
            ),
            OperationStatus::Failed("disk quota".into())
        );
        assert_eq!(
            parse_operation_status(StatusCode::ACCEPTED, &Value::Null),
            OperationStatus::InProgress
        );
        assert_eq!(
            parse_operation_status(StatusCode::NO_CONTENT, &Value::Null),
            OperationStatus::Succeeded
        );
    }
}
