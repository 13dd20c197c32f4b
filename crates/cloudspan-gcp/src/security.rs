//! Firewall rules as security groups
//!
//! A Compute Engine firewall has one direction and applies to instances
//! carrying its target tag. The firewall is tagged with its own name, and
//! the VM handler tags instances with their security group names.

use crate::api::{GcpApi, ProjectScope, resource_name};
use crate::model::{Firewall, FirewallAllowed};
use crate::poll::{complete, fetch, fetch_all};
use crate::vnetwork::{base_network_name, base_network_path};
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, Result, SecurityHandler, SecurityInfo, SecurityReqInfo,
    SecurityRuleInfo,
};
use serde_json::json;
use std::sync::Arc;

const OPEN_RANGE: &str = "0.0.0.0/0";

pub struct GcpSecurityHandler {
    api: Arc<dyn GcpApi>,
    scope: ProjectScope,
    ctx: HandlerContext,
}

impl GcpSecurityHandler {
    pub fn new(api: Arc<dyn GcpApi>, scope: ProjectScope, ctx: HandlerContext) -> Self {
        Self { api, scope, ctx }
    }

    fn path(&self, name: &str) -> String {
        format!("{}/{}", self.scope.global("firewalls"), resource_name(name))
    }
}

#[async_trait]
impl SecurityHandler for GcpSecurityHandler {
    async fn create_security(&self, req: SecurityReqInfo) -> Result<SecurityInfo> {
        if found(self.api.get(&self.path(&req.name)).await)?.is_some() {
            return Err(CloudError::already_exists("SecurityGroup", &req.name));
        }

        let direction = firewall_direction(&req.security_rules)?;
        let allowed = allowed_entries(&req.security_rules)?;
        let ranges = if direction == "INGRESS" {
            "sourceRanges"
        } else {
            "destinationRanges"
        };

        tracing::info!(parent: &self.ctx.span, name = %req.name, direction, "creating firewall");
        let op = self
            .api
            .post(
                &self.scope.global("firewalls"),
                &json!({
                    "name": req.name,
                    "network": base_network_path(&self.scope),
                    "direction": direction,
                    "allowed": allowed,
                    ranges: [OPEN_RANGE],
                    "targetTags": [req.name]
                }),
            )
            .await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("create firewall {}", req.name),
            op,
        )
        .await?;

        self.get_security(&req.name).await
    }

    async fn list_security(&self) -> Result<Vec<SecurityInfo>> {
        let base = base_network_name();
        Ok(
            fetch_all::<Firewall>(self.api.as_ref(), &self.scope.global("firewalls"))
                .await?
                .iter()
                .filter(|f| resource_name(&f.network) == base)
                .map(map_firewall)
                .collect(),
        )
    }

    async fn get_security(&self, security_id: &str) -> Result<SecurityInfo> {
        let firewall: Firewall = fetch(self.api.as_ref(), &self.path(security_id)).await?;
        Ok(map_firewall(&firewall))
    }

    async fn delete_security(&self, security_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, security_id, "deleting firewall");
        let op = self.api.delete(&self.path(security_id)).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("delete firewall {security_id}"),
            op,
        )
        .await?;
        Ok(true)
    }
}

/// The single direction shared by every rule; defaults to ingress.
fn firewall_direction(rules: &[SecurityRuleInfo]) -> Result<&'static str> {
    let mut direction = None;
    for rule in rules {
        let current = match rule.direction.to_ascii_lowercase().as_str() {
            "inbound" | "ingress" => "INGRESS",
            "outbound" | "egress" => "EGRESS",
            other => {
                return Err(CloudError::InvalidRequest(format!(
                    "unknown rule direction {other}"
                )));
            }
        };
        match direction {
            Some(d) if d != current => {
                return Err(CloudError::InvalidRequest(
                    "a firewall holds rules of one direction only".into(),
                ));
            }
            _ => direction = Some(current),
        }
    }
    Ok(direction.unwrap_or("INGRESS"))
}

/// Groups rules by protocol into `allowed` entries.
fn allowed_entries(rules: &[SecurityRuleInfo]) -> Result<Vec<FirewallAllowed>> {
    if rules.is_empty() {
        return Err(CloudError::InvalidRequest(
            "at least one security rule is required".into(),
        ));
    }

    let mut allowed: Vec<FirewallAllowed> = Vec::new();
    for rule in rules {
        let protocol = match rule.ip_protocol.to_ascii_lowercase().as_str() {
            "" | "*" | "any" | "all" => "all".to_string(),
            p => p.to_string(),
        };
        let port = match rule.port_range().as_str() {
            "" | "-1" | "*" => None,
            range => Some(range.to_string()),
        };

        let index = match allowed.iter().position(|a| a.ip_protocol == protocol) {
            Some(index) => index,
            None => {
                allowed.push(FirewallAllowed {
                    ip_protocol: protocol.clone(),
                    ports: Vec::new(),
                });
                allowed.len() - 1
            }
        };
        if let Some(port) = port.filter(|_| protocol == "tcp" || protocol == "udp") {
            allowed[index].ports.push(port);
        }
    }
    Ok(allowed)
}

fn map_rules(firewall: &Firewall) -> Vec<SecurityRuleInfo> {
    let direction = firewall.direction.to_ascii_lowercase();
    let mut rules = Vec::new();
    for allowed in &firewall.allowed {
        if allowed.ports.is_empty() {
            rules.push(SecurityRuleInfo::new(
                "-1",
                "-1",
                &allowed.ip_protocol,
                &direction,
            ));
        }
        for range in &allowed.ports {
            let range = range.as_str();
            let (from, to) = range.split_once('-').unwrap_or((range, range));
            rules.push(SecurityRuleInfo::new(
                from,
                to,
                &allowed.ip_protocol,
                &direction,
            ));
        }
    }
    rules
}

pub fn map_firewall(firewall: &Firewall) -> SecurityInfo {
    SecurityInfo {
        id: firewall.name.clone(),
        name: firewall.name.clone(),
        security_rules: map_rules(firewall),
        key_value_list: vec![
            KeyValue::new("Network", resource_name(&firewall.network)),
            KeyValue::new("Direction", &firewall.direction),
            KeyValue::new("TargetTags", firewall.target_tags.join(",")),
            KeyValue::new("SelfLink", &firewall.self_link),
        ],
    }
}
