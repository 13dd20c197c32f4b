//! Compute Engine REST client
//!
//! Authenticates with a service-account key: a signed JWT assertion is
//! exchanged for an OAuth2 access token, cached until shortly before expiry.

use crate::api::{GcpApi, Operation};
use crate::error::{GcpError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

pub const COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com/compute/v1";
const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const COMPUTE_SCOPE: &str = "https://www.googleapis.com/auth/compute";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for the JWT assertion
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const TOKEN_REFRESH_MARGIN_SECS: i64 = 120;

/// Service-account credentials
#[derive(Debug, Clone)]
pub struct GcpConfig {
    pub client_email: String,
    /// PEM-encoded RSA private key
    pub private_key: String,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
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

pub struct GcpClient {
    http: reqwest::Client,
    config: GcpConfig,
    endpoint: String,
    token: RwLock<Option<AccessToken>>,
}

impl GcpClient {
    pub fn new(config: GcpConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            endpoint: COMPUTE_ENDPOINT.to_string(),
            token: RwLock::new(None),
        }
    }

    fn assertion(&self, now: DateTime<Utc>) -> Result<String> {
        // keys pasted into YAML often carry literal "\n" sequences
        let pem = self.config.private_key.replace("\\n", "\n");
        let key = EncodingKey::from_rsa_pem(pem.as_bytes())?;
        let claims = Claims {
            iss: &self.config.client_email,
            scope: COMPUTE_SCOPE,
            aud: TOKEN_ENDPOINT,
            iat: now.timestamp(),
            exp: now.timestamp() + ASSERTION_LIFETIME_SECS,
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &key,
        )?)
    }

    async fn request_token(&self) -> Result<AccessToken> {
        tracing::debug!(client_email = %self.config.client_email, "requesting service account token");
        let assertion = self.assertion(Utc::now())?;
        let response = self
            .http
            .post(TOKEN_ENDPOINT)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(GcpError::Authentication(format!("{status}: {text}")));
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

    fn url(&self, path: &str) -> String {
        if path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
        }
    }

    async fn send(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Value> {
        let token = self.bearer().await?;
        tracing::debug!(%method, %url, "Compute Engine request");

        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let (reason, message) = error_detail(&text);
            return Err(GcpError::Http {
                status: status.as_u16(),
                reason,
                message,
            });
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn operation_call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Operation> {
        let url = self.url(path);
        Ok(serde_json::from_value(self.send(method, &url, body).await?)?)
    }
}

/// Appends a `pageToken` query parameter.
fn page_url(url: &str, token: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{url}{separator}pageToken={}",
        utf8_percent_encode(token, NON_ALPHANUMERIC)
    )
}

/// `{"error": {"message": ..., "errors": [{"reason": ...}]}}`, or the raw text.
fn error_detail(text: &str) -> (String, String) {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return (String::new(), text.to_string());
    };
    let error = &value["error"];
    (
        error["errors"][0]["reason"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        error["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| text.to_string()),
    )
}

#[async_trait]
impl GcpApi for GcpClient {
    async fn get(&self, path: &str) -> cloudspan_driver::Result<Value> {
        let url = self.url(path);
        Ok(self.send(Method::GET, &url, None).await?)
    }

    async fn list(&self, path: &str) -> cloudspan_driver::Result<Vec<Value>> {
        let base = self.url(path);
        let mut items = Vec::new();
        let mut url = base.clone();

        loop {
            let mut page = self.send(Method::GET, &url, None).await?;
            if let Value::Array(batch) = page["items"].take() {
                items.extend(batch);
            }
            match page.get("nextPageToken").and_then(Value::as_str) {
                Some(token) => url = page_url(&base, token),
                None => return Ok(items),
            }
        }
    }

    async fn post(&self, path: &str, body: &Value) -> cloudspan_driver::Result<Operation> {
        Ok(self.operation_call(Method::POST, path, Some(body)).await?)
    }

    async fn delete(&self, path: &str) -> cloudspan_driver::Result<Operation> {
        Ok(self.operation_call(Method::DELETE, path, None).await?)
    }

    async fn operation(&self, self_link: &str) -> cloudspan_driver::Result<Operation> {
        Ok(self.operation_call(Method::GET, self_link, None).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GcpClient {
        GcpClient::new(GcpConfig {
            client_email: "sa@proj-1.iam.gserviceaccount.com".into(),
            private_key: "not a key".into(),
        })
    }

    #[test]
    fn test_url_joins_relative_paths() {
        let c = client();
        assert_eq!(
            c.url("projects/p/zones/z/instances"),
            "https://compute.googleapis.com/compute/v1/projects/p/zones/z/instances"
        );
        let link = "https://www.googleapis.com/compute/v1/projects/p/zones/z/operations/op-1";
        assert_eq!(c.url(link), link);
    }

    #[test]
    fn test_page_url() {
        assert_eq!(page_url("https://x/items", "a+b"), "https://x/items?pageToken=a%2Bb");
        assert_eq!(
            page_url("https://x/items?filter=y", "t"),
            "https://x/items?filter=y&pageToken=t"
        );
    }

    #[test]
    fn test_error_detail() {
        let (reason, message) = error_detail(
            r#"{"error":{"code":404,"message":"The resource 'x' was not found","errors":[{"reason":"notFound"}]}}"#,
        );
        assert_eq!(reason, "notFound");
        assert_eq!(message, "The resource 'x' was not found");

        let (reason, message) = error_detail("upstream connect error");
        assert!(reason.is_empty());
        assert_eq!(message, "upstream connect error");
    }

    #[test]
    fn test_invalid_private_key_is_rejected() {
        let err = client().assertion(Utc::now()).unwrap_err();
        assert!(matches!(err, GcpError::Jwt(_)));
    }
}
