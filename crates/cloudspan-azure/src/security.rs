//! Network security groups

use crate::api::{AzureApi, NETWORK, NETWORK_API_VERSION, ResourceScope, resource_name};
use crate::model::{NetworkSecurityGroup, SecurityRule};
use crate::poll::{complete, fetch, fetch_all};
use async_trait::async_trait;
use cloudspan_driver::error::found;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, Result, SecurityHandler, SecurityInfo, SecurityReqInfo,
    SecurityRuleInfo,
};
use serde_json::{Value, json};
use std::sync::Arc;

const FIRST_RULE_PRIORITY: u32 = 300;
const RULE_PRIORITY_STEP: u32 = 100;

pub struct AzureSecurityHandler {
    api: Arc<dyn AzureApi>,
    scope: ResourceScope,
    ctx: HandlerContext,
}

impl AzureSecurityHandler {
    pub fn new(api: Arc<dyn AzureApi>, scope: ResourceScope, ctx: HandlerContext) -> Self {
        Self { api, scope, ctx }
    }

    fn path(&self, id_or_name: &str) -> String {
        self.scope
            .path(NETWORK, "networkSecurityGroups", resource_name(id_or_name))
    }
}

#[async_trait]
impl SecurityHandler for AzureSecurityHandler {
    async fn create_security(&self, req: SecurityReqInfo) -> Result<SecurityInfo> {
        let path = self.path(&req.name);
        if found(self.api.get(&path, NETWORK_API_VERSION).await)?.is_some() {
            return Err(CloudError::already_exists("SecurityGroup", &req.name));
        }

        let rules = req
            .security_rules
            .iter()
            .enumerate()
            .map(|(idx, rule)| to_security_rule(&req.name, idx, rule))
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(parent: &self.ctx.span, name = %req.name, rules = rules.len(), "creating network security group");
        let body = json!({
            "location": self.scope.location,
            "properties": { "securityRules": rules }
        });
        let accepted = self.api.put(&path, NETWORK_API_VERSION, &body).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("create security group {}", req.name),
            accepted,
        )
        .await?;

        self.get_security(&req.name).await
    }

    async fn list_security(&self) -> Result<Vec<SecurityInfo>> {
        let groups: Vec<NetworkSecurityGroup> = fetch_all(
            self.api.as_ref(),
            &self.scope.collection(NETWORK, "networkSecurityGroups"),
            NETWORK_API_VERSION,
        )
        .await?;
        Ok(groups.iter().map(map_security_group).collect())
    }

    async fn get_security(&self, security_id: &str) -> Result<SecurityInfo> {
        let group: NetworkSecurityGroup =
            fetch(self.api.as_ref(), &self.path(security_id), NETWORK_API_VERSION).await?;
        Ok(map_security_group(&group))
    }

    async fn delete_security(&self, security_id: &str) -> Result<bool> {
        let path = self.path(security_id);
        self.api.get(&path, NETWORK_API_VERSION).await?;

        tracing::info!(parent: &self.ctx.span, security_id, "deleting network security group");
        let accepted = self.api.delete(&path, NETWORK_API_VERSION).await?;
        complete(
            self.api.as_ref(),
            &self.ctx,
            &format!("delete security group {security_id}"),
            accepted,
        )
        .await?;
        Ok(true)
    }
}

fn azure_direction(direction: &str) -> Result<&'static str> {
    match direction.to_ascii_lowercase().as_str() {
        "inbound" | "ingress" => Ok("Inbound"),
        "outbound" | "egress" => Ok("Outbound"),
        other => Err(CloudError::InvalidRequest(format!(
            "unknown rule direction {other}"
        ))),
    }
}

fn azure_protocol(protocol: &str) -> Result<&'static str> {
    match protocol.to_ascii_lowercase().as_str() {
        "tcp" => Ok("Tcp"),
        "udp" => Ok("Udp"),
        "icmp" => Ok("Icmp"),
        "" | "*" | "all" | "any" => Ok("*"),
        other => Err(CloudError::InvalidRequest(format!(
            "unsupported protocol {other}"
        ))),
    }
}

/// Rules are named `{group}-rules-{n}` and get priorities 300, 400, ...
fn to_security_rule(group: &str, idx: usize, rule: &SecurityRuleInfo) -> Result<Value> {
    let ports = match rule.port_range().as_str() {
        "" | "-1" | "*" => "*".to_string(),
        range => range.to_string(),
    };
    Ok(json!({
        "name": format!("{group}-rules-{}", idx + 1),
        "properties": {
            "protocol": azure_protocol(&rule.ip_protocol)?,
            "sourcePortRange": "*",
            "destinationPortRange": ports,
            "sourceAddressPrefix": "*",
            "destinationAddressPrefix": "*",
            "access": "Allow",
            "priority": FIRST_RULE_PRIORITY + idx as u32 * RULE_PRIORITY_STEP,
            "direction": azure_direction(&rule.direction)?,
        }
    }))
}

fn map_rule(rule: &SecurityRule) -> SecurityRuleInfo {
    let range = rule.properties.destination_port_range.as_str();
    let (from, to) = range.split_once('-').unwrap_or((range, range));
    SecurityRuleInfo::new(
        from,
        to,
        rule.properties.protocol.to_ascii_lowercase(),
        rule.properties.direction.to_ascii_lowercase(),
    )
}

pub fn map_security_group(group: &NetworkSecurityGroup) -> SecurityInfo {
    SecurityInfo {
        id: group.id.clone(),
        name: group.name.clone(),
        security_rules: group
            .properties
            .security_rules
            .iter()
            .map(map_rule)
            .collect(),
        key_value_list: vec![
            KeyValue::new("Location", &group.location),
            KeyValue::new("ProvisioningState", &group.properties.provisioning_state),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_names_and_priorities() {
        let ssh = SecurityRuleInfo::new("22", "22", "tcp", "inbound");
        let web = SecurityRuleInfo::new("80", "443", "TCP", "ingress");

        let first = to_security_rule("web-sg", 0, &ssh).unwrap();
        let second = to_security_rule("web-sg", 1, &web).unwrap();
        assert_eq!(first["name"], "web-sg-rules-1");
        assert_eq!(first["properties"]["priority"], 300);
        assert_eq!(first["properties"]["destinationPortRange"], "22");
        assert_eq!(second["name"], "web-sg-rules-2");
        assert_eq!(second["properties"]["priority"], 400);
        assert_eq!(second["properties"]["destinationPortRange"], "80-443");
        assert_eq!(second["properties"]["direction"], "Inbound");
    }

    #[test]
    fn test_any_port_and_protocol() {
        let rule = SecurityRuleInfo::new("-1", "-1", "all", "outbound");
        let value = to_security_rule("sg", 0, &rule).unwrap();
        assert_eq!(value["properties"]["protocol"], "*");
        assert_eq!(value["properties"]["destinationPortRange"], "*");
        assert_eq!(value["properties"]["direction"], "Outbound");
    }

    #[test]
    fn test_map_rule_splits_range() {
        let rule: SecurityRule = serde_json::from_value(json!({
            "name": "sg-rules-1",
            "properties": {
                "protocol": "Tcp",
                "destinationPortRange": "8000-8080",
                "direction": "Inbound"
            }
        }))
        .unwrap();
        let info = map_rule(&rule);
        assert_eq!(info.from_port, "8000");
        assert_eq!(info.to_port, "8080");
        assert_eq!(info.ip_protocol, "tcp");
        assert_eq!(info.direction, "inbound");
    }
}
