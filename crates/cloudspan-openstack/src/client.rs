//! OpenStack REST client
//!
//! Authenticates against Keystone v3 with a project-scoped password token,
//! resolves service endpoints from the token's catalog, and talks to Nova,
//! Neutron and Glance over plain JSON. The token is acquired on first use
//! and refreshed shortly before it expires.

use crate::api::OpenStackApi;
use crate::error::{OpenStackError, Result};
use crate::model::*;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::RwLock;

/// Nova microversion requested on every compute call
const COMPUTE_MICROVERSION: &str = "2.45";

/// Refresh the token this long before Keystone says it expires
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Compute,
    Network,
    Image,
}

impl Service {
    fn catalog_type(&self) -> &'static str {
        match self {
            Service::Compute => "compute",
            Service::Network => "network",
            Service::Image => "image",
        }
    }

    /// Version suffix the catalog URL does not carry
    fn version_path(&self) -> &'static str {
        match self {
            Service::Compute => "",
            Service::Network => "/v2.0",
            Service::Image => "/v2",
        }
    }
}

/// Keystone password credentials
#[derive(Debug, Clone)]
pub struct OpenStackConfig {
    pub identity_endpoint: String,
    pub username: String,
    pub password: String,
    pub domain_name: String,
    pub project_id: String,
    pub region: String,
}

#[derive(Debug, Clone)]
struct Session {
    token: String,
    expires_at: DateTime<Utc>,
    compute: String,
    network: String,
    image: String,
}

impl Session {
    fn endpoint(&self, service: Service) -> &str {
        match service {
            Service::Compute => &self.compute,
            Service::Network => &self.network,
            Service::Image => &self.image,
        }
    }

    fn is_fresh(&self) -> bool {
        self.expires_at - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) > Utc::now()
    }
}

pub struct OpenStackClient {
    http: reqwest::Client,
    config: OpenStackConfig,
    session: RwLock<Option<Session>>,
}

impl OpenStackClient {
    pub fn new(config: OpenStackConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            session: RwLock::new(None),
        }
    }

    fn auth_url(&self) -> String {
        let base = self.config.identity_endpoint.trim_end_matches('/');
        if base.ends_with("/v3") {
            format!("{}/auth/tokens", base)
        } else {
            format!("{}/v3/auth/tokens", base)
        }
    }

    async fn authenticate(&self) -> Result<Session> {
        let body = json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": self.config.username,
                            "domain": { "name": self.config.domain_name },
                            "password": self.config.password,
                        }
                    }
                },
                "scope": { "project": { "id": self.config.project_id } }
            }
        });

        tracing::debug!(url = %self.auth_url(), "requesting Keystone token");
        let response = self.http.post(self.auth_url()).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(OpenStackError::AuthenticationFailed(format!("{status}: {text}")));
        }

        let token = response
            .headers()
            .get("X-Subject-Token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                OpenStackError::AuthenticationFailed("missing X-Subject-Token header".into())
            })?;

        let body: TokenResponse = response.json().await?;
        let region = self.config.region.as_str();

        Ok(Session {
            token,
            expires_at: body.token.expires_at,
            compute: body.token.endpoint(Service::Compute, region)?,
            network: body.token.endpoint(Service::Network, region)?,
            image: body.token.endpoint(Service::Image, region)?,
        })
    }

    async fn session(&self) -> Result<Session> {
        {
            let guard = self.session.read().await;
            if let Some(session) = guard.as_ref().filter(|s| s.is_fresh()) {
                return Ok(session.clone());
            }
        }

        let mut guard = self.session.write().await;
        if let Some(session) = guard.as_ref().filter(|s| s.is_fresh()) {
            return Ok(session.clone());
        }
        let session = self.authenticate().await?;
        *guard = Some(session.clone());
        Ok(session)
    }

    /// Sends one request and returns the parsed body (`Null` for empty bodies).
    async fn send(
        &self,
        service: Service,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value> {
        let session = self.session().await?;
        let url = format!("{}{}", session.endpoint(service), path);
        tracing::debug!(%method, %url, "OpenStack request");

        let mut request = self
            .http
            .request(method, &url)
            .header("X-Auth-Token", &session.token);
        if service == Service::Compute {
            request = request.header(
                "OpenStack-API-Version",
                format!("compute {COMPUTE_MICROVERSION}"),
            );
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(OpenStackError::Http {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        if text.is_empty() || status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn get<T: DeserializeOwned>(&self, service: Service, path: &str, key: &str) -> Result<T> {
        let mut value = self.send(service, Method::GET, path, None).await?;
        Ok(serde_json::from_value(value[key].take())?)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        service: Service,
        path: &str,
        body: Value,
        key: &str,
    ) -> Result<T> {
        let mut value = self.send(service, Method::POST, path, Some(body)).await?;
        Ok(serde_json::from_value(value[key].take())?)
    }

    async fn delete(&self, service: Service, path: &str) -> Result<()> {
        self.send(service, Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Follows `*_links` / `next` pagination and concatenates every page.
    async fn get_all<T: DeserializeOwned>(
        &self,
        service: Service,
        path: &str,
        key: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(path.to_string());

        while let Some(page_path) = next.take() {
            let mut page = self.send(service, Method::GET, &page_path, None).await?;
            let batch: Vec<T> = serde_json::from_value(page[key].take())?;
            items.extend(batch);
            next = next_page(&page, key, service);
        }
        Ok(items)
    }
}

/// Relative path of the next page, if the response advertises one.
fn next_page(page: &Value, key: &str, service: Service) -> Option<String> {
    // Glance: {"next": "/v2/images?marker=..."}
    if let Some(next) = page.get("next").and_then(Value::as_str) {
        return Some(next.trim_start_matches(service.version_path()).to_string());
    }

    // Nova / Neutron: {"servers_links": [{"rel": "next", "href": "http://.../servers?marker=..."}]}
    let links = page.get(format!("{key}_links")).and_then(Value::as_array);
    let href = links
        .into_iter()
        .flatten()
        .find(|l| l.get("rel").and_then(Value::as_str) == Some("next"))
        .and_then(|l| l.get("href").and_then(Value::as_str));

    href.and_then(|h| {
        let start = h.find(&format!("/{key}"))?;
        Some(h[start..].to_string())
    })
}

/// Pulls the human-readable message out of the assorted OpenStack error bodies.
fn error_message(text: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return text.to_string();
    };
    // {"itemNotFound": {"message": ...}}, {"NeutronError": {"message": ...}}, {"message": ...}
    value
        .get("message")
        .or_else(|| {
            value
                .as_object()
                .and_then(|o| o.values().find_map(|v| v.get("message")))
        })
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| text.to_string())
}

// ============ Keystone Types ============

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: TokenBody,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    expires_at: DateTime<Utc>,
    #[serde(default)]
    catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<CatalogEndpoint>,
}

#[derive(Debug, Deserialize)]
struct CatalogEndpoint {
    interface: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    region_id: String,
    url: String,
}

impl TokenBody {
    fn endpoint(&self, service: Service, region: &str) -> Result<String> {
        self.catalog
            .iter()
            .filter(|entry| entry.service_type == service.catalog_type())
            .flat_map(|entry| entry.endpoints.iter())
            .find(|ep| {
                ep.interface == "public"
                    && (region.is_empty() || ep.region == region || ep.region_id == region)
            })
            .map(|ep| {
                let base = ep.url.trim_end_matches('/');
                if base.ends_with(service.version_path()) {
                    base.to_string()
                } else {
                    format!("{}{}", base, service.version_path())
                }
            })
            .ok_or(OpenStackError::EndpointNotFound(service.catalog_type()))
    }
}

// ============ OpenStackApi over REST ============

#[async_trait]
impl OpenStackApi for OpenStackClient {
    async fn list_servers(&self) -> cloudspan_driver::Result<Vec<Server>> {
        Ok(self.get_all(Service::Compute, "/servers/detail", "servers").await?)
    }

    async fn get_server(&self, id: &str) -> cloudspan_driver::Result<Server> {
        Ok(self.get(Service::Compute, &format!("/servers/{id}"), "server").await?)
    }

    async fn create_server(&self, req: &CreateServer) -> cloudspan_driver::Result<String> {
        let body = json!({ "server": req });
        let created: IdRef = self.post(Service::Compute, "/servers", body, "server").await?;
        Ok(created.id)
    }

    async fn server_action(&self, id: &str, action: ServerAction) -> cloudspan_driver::Result<()> {
        let path = format!("/servers/{id}/action");
        self.send(Service::Compute, Method::POST, &path, Some(action.body()))
            .await?;
        Ok(())
    }

    async fn delete_server(&self, id: &str) -> cloudspan_driver::Result<()> {
        Ok(self.delete(Service::Compute, &format!("/servers/{id}")).await?)
    }

    async fn create_server_image(
        &self,
        server_id: &str,
        name: &str,
    ) -> cloudspan_driver::Result<String> {
        let path = format!("/servers/{server_id}/action");
        let body = json!({ "createImage": { "name": name } });
        Ok(self.post(Service::Compute, &path, body, "image_id").await?)
    }

    async fn list_flavors(&self) -> cloudspan_driver::Result<Vec<Flavor>> {
        Ok(self.get_all(Service::Compute, "/flavors/detail", "flavors").await?)
    }

    async fn list_keypairs(&self) -> cloudspan_driver::Result<Vec<Keypair>> {
        #[derive(Deserialize)]
        struct Wrapped {
            keypair: Keypair,
        }
        let wrapped: Vec<Wrapped> = self.get(Service::Compute, "/os-keypairs", "keypairs").await?;
        Ok(wrapped.into_iter().map(|w| w.keypair).collect())
    }

    async fn get_keypair(&self, name: &str) -> cloudspan_driver::Result<Keypair> {
        Ok(self
            .get(Service::Compute, &format!("/os-keypairs/{name}"), "keypair")
            .await?)
    }

    async fn create_keypair(
        &self,
        name: &str,
        public_key: Option<&str>,
    ) -> cloudspan_driver::Result<Keypair> {
        let mut keypair = json!({ "name": name });
        if let Some(public_key) = public_key {
            keypair["public_key"] = json!(public_key);
        }
        Ok(self
            .post(Service::Compute, "/os-keypairs", json!({ "keypair": keypair }), "keypair")
            .await?)
    }

    async fn delete_keypair(&self, name: &str) -> cloudspan_driver::Result<()> {
        Ok(self
            .delete(Service::Compute, &format!("/os-keypairs/{name}"))
            .await?)
    }

    async fn list_images(&self) -> cloudspan_driver::Result<Vec<Image>> {
        Ok(self.get_all(Service::Image, "/images", "images").await?)
    }

    async fn get_image(&self, id: &str) -> cloudspan_driver::Result<Image> {
        // Glance returns the image document unwrapped
        let value = self
            .send(Service::Image, Method::GET, &format!("/images/{id}"), None)
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn delete_image(&self, id: &str) -> cloudspan_driver::Result<()> {
        Ok(self.delete(Service::Image, &format!("/images/{id}")).await?)
    }

    async fn list_networks(&self) -> cloudspan_driver::Result<Vec<Network>> {
        Ok(self.get_all(Service::Network, "/networks", "networks").await?)
    }

    async fn create_network(&self, name: &str) -> cloudspan_driver::Result<Network> {
        let body = json!({ "network": { "name": name, "admin_state_up": true } });
        Ok(self.post(Service::Network, "/networks", body, "network").await?)
    }

    async fn list_subnets(&self, network_id: &str) -> cloudspan_driver::Result<Vec<Subnet>> {
        let path = format!("/subnets?network_id={network_id}");
        Ok(self.get_all(Service::Network, &path, "subnets").await?)
    }

    async fn get_subnet(&self, id: &str) -> cloudspan_driver::Result<Subnet> {
        Ok(self
            .get(Service::Network, &format!("/subnets/{id}"), "subnet")
            .await?)
    }

    async fn create_subnet(&self, req: &CreateSubnet) -> cloudspan_driver::Result<Subnet> {
        let body = json!({ "subnet": req });
        Ok(self.post(Service::Network, "/subnets", body, "subnet").await?)
    }

    async fn delete_subnet(&self, id: &str) -> cloudspan_driver::Result<()> {
        Ok(self.delete(Service::Network, &format!("/subnets/{id}")).await?)
    }

    async fn list_routers(&self) -> cloudspan_driver::Result<Vec<Router>> {
        Ok(self.get_all(Service::Network, "/routers", "routers").await?)
    }

    async fn create_router(
        &self,
        name: &str,
        external_network_id: &str,
    ) -> cloudspan_driver::Result<Router> {
        let body = json!({
            "router": {
                "name": name,
                "admin_state_up": true,
                "external_gateway_info": { "network_id": external_network_id },
            }
        });
        Ok(self.post(Service::Network, "/routers", body, "router").await?)
    }

    async fn add_router_interface(
        &self,
        router_id: &str,
        subnet_id: &str,
    ) -> cloudspan_driver::Result<()> {
        let path = format!("/routers/{router_id}/add_router_interface");
        self.send(
            Service::Network,
            Method::PUT,
            &path,
            Some(json!({ "subnet_id": subnet_id })),
        )
        .await?;
        Ok(())
    }

    async fn remove_router_interface(
        &self,
        router_id: &str,
        subnet_id: &str,
    ) -> cloudspan_driver::Result<()> {
        let path = format!("/routers/{router_id}/remove_router_interface");
        self.send(
            Service::Network,
            Method::PUT,
            &path,
            Some(json!({ "subnet_id": subnet_id })),
        )
        .await?;
        Ok(())
    }

    async fn list_security_groups(&self) -> cloudspan_driver::Result<Vec<SecurityGroup>> {
        Ok(self
            .get_all(Service::Network, "/security-groups", "security_groups")
            .await?)
    }

    async fn get_security_group(&self, id: &str) -> cloudspan_driver::Result<SecurityGroup> {
        Ok(self
            .get(
                Service::Network,
                &format!("/security-groups/{id}"),
                "security_group",
            )
            .await?)
    }

    async fn create_security_group(
        &self,
        name: &str,
        description: &str,
    ) -> cloudspan_driver::Result<SecurityGroup> {
        let body = json!({ "security_group": { "name": name, "description": description } });
        Ok(self
            .post(Service::Network, "/security-groups", body, "security_group")
            .await?)
    }

    async fn create_security_group_rule(
        &self,
        req: &CreateSecurityGroupRule,
    ) -> cloudspan_driver::Result<SecurityGroupRule> {
        let body = json!({ "security_group_rule": req });
        Ok(self
            .post(
                Service::Network,
                "/security-group-rules",
                body,
                "security_group_rule",
            )
            .await?)
    }

    async fn delete_security_group(&self, id: &str) -> cloudspan_driver::Result<()> {
        Ok(self
            .delete(Service::Network, &format!("/security-groups/{id}"))
            .await?)
    }

    async fn list_ports(&self) -> cloudspan_driver::Result<Vec<Port>> {
        Ok(self.get_all(Service::Network, "/ports", "ports").await?)
    }

    async fn get_port(&self, id: &str) -> cloudspan_driver::Result<Port> {
        Ok(self.get(Service::Network, &format!("/ports/{id}"), "port").await?)
    }

    async fn create_port(&self, req: &CreatePort) -> cloudspan_driver::Result<Port> {
        let body = json!({ "port": req });
        Ok(self.post(Service::Network, "/ports", body, "port").await?)
    }

    async fn delete_port(&self, id: &str) -> cloudspan_driver::Result<()> {
        Ok(self.delete(Service::Network, &format!("/ports/{id}")).await?)
    }

    async fn list_floating_ips(&self) -> cloudspan_driver::Result<Vec<FloatingIp>> {
        Ok(self
            .get_all(Service::Network, "/floatingips", "floatingips")
            .await?)
    }

    async fn get_floating_ip(&self, id: &str) -> cloudspan_driver::Result<FloatingIp> {
        Ok(self
            .get(Service::Network, &format!("/floatingips/{id}"), "floatingip")
            .await?)
    }

    async fn create_floating_ip(
        &self,
        floating_network_id: &str,
        description: &str,
    ) -> cloudspan_driver::Result<FloatingIp> {
        let body = json!({
            "floatingip": {
                "floating_network_id": floating_network_id,
                "description": description,
            }
        });
        Ok(self
            .post(Service::Network, "/floatingips", body, "floatingip")
            .await?)
    }

    async fn update_floating_ip_port(
        &self,
        id: &str,
        port_id: Option<&str>,
    ) -> cloudspan_driver::Result<FloatingIp> {
        let path = format!("/floatingips/{id}");
        let body = json!({ "floatingip": { "port_id": port_id } });
        let mut value = self
            .send(Service::Network, Method::PUT, &path, Some(body))
            .await?;
        Ok(serde_json::from_value(value["floatingip"].take())?)
    }

    async fn delete_floating_ip(&self, id: &str) -> cloudspan_driver::Result<()> {
        Ok(self
            .delete(Service::Network, &format!("/floatingips/{id}"))
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str) -> OpenStackConfig {
        OpenStackConfig {
            identity_endpoint: endpoint.into(),
            username: "demo".into(),
            password: "pw".into(),
            domain_name: "Default".into(),
            project_id: "p1".into(),
            region: "RegionOne".into(),
        }
    }

    #[test]
    fn test_auth_url_normalization() {
        let client = OpenStackClient::new(config("https://keystone:5000/v3/"));
        assert_eq!(client.auth_url(), "https://keystone:5000/v3/auth/tokens");

        let client = OpenStackClient::new(config("https://keystone:5000"));
        assert_eq!(client.auth_url(), "https://keystone:5000/v3/auth/tokens");
    }

    #[test]
    fn test_catalog_endpoint_resolution() {
        let body: TokenBody = serde_json::from_value(json!({
            "expires_at": "2030-01-01T00:00:00.000000Z",
            "catalog": [
                {"type": "network", "endpoints": [
                    {"interface": "internal", "region": "RegionOne", "url": "http://10.0.0.1:9696"},
                    {"interface": "public", "region": "RegionTwo", "url": "http://other:9696"},
                    {"interface": "public", "region": "RegionOne", "url": "http://net:9696/"}
                ]},
                {"type": "image", "endpoints": [
                    {"interface": "public", "region_id": "RegionOne", "url": "http://glance:9292/v2"}
                ]}
            ]
        }))
        .unwrap();

        assert_eq!(
            body.endpoint(Service::Network, "RegionOne").unwrap(),
            "http://net:9696/v2.0"
        );
        assert_eq!(
            body.endpoint(Service::Image, "RegionOne").unwrap(),
            "http://glance:9292/v2"
        );
        assert!(matches!(
            body.endpoint(Service::Compute, "RegionOne"),
            Err(OpenStackError::EndpointNotFound("compute"))
        ));
    }

    #[test]
    fn test_next_page_links() {
        let nova = json!({
            "servers": [],
            "servers_links": [{"rel": "next", "href": "http://nova:8774/v2.1/servers/detail?marker=abc"}]
        });
        assert_eq!(
            next_page(&nova, "servers", Service::Compute).as_deref(),
            Some("/servers/detail?marker=abc")
        );

        let glance = json!({"images": [], "next": "/v2/images?marker=xyz"});
        assert_eq!(
            next_page(&glance, "images", Service::Image).as_deref(),
            Some("/images?marker=xyz")
        );

        let last = json!({"ports": []});
        assert!(next_page(&last, "ports", Service::Network).is_none());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"itemNotFound": {"message": "Instance x could not be found.", "code": 404}}"#),
            "Instance x could not be found."
        );
        assert_eq!(
            error_message(r#"{"NeutronError": {"type": "SubnetNotFound", "message": "Subnet y could not be found."}}"#),
            "Subnet y could not be found."
        );
        assert_eq!(error_message("plain text"), "plain text");
    }
}
