//! Neutron security groups

use crate::api::OpenStackApi;
use crate::model::{CreateSecurityGroupRule, SecurityGroup, SecurityGroupRule};
use async_trait::async_trait;
use cloudspan_driver::{
    CloudError, HandlerContext, KeyValue, Result, SecurityHandler, SecurityInfo, SecurityReqInfo,
    SecurityRuleInfo,
};
use std::sync::Arc;

pub struct OpenStackSecurityHandler {
    api: Arc<dyn OpenStackApi>,
    ctx: HandlerContext,
}

impl OpenStackSecurityHandler {
    pub fn new(api: Arc<dyn OpenStackApi>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }
}

#[async_trait]
impl SecurityHandler for OpenStackSecurityHandler {
    async fn create_security(&self, req: SecurityReqInfo) -> Result<SecurityInfo> {
        if self
            .api
            .list_security_groups()
            .await?
            .iter()
            .any(|sg| sg.name == req.name)
        {
            return Err(CloudError::already_exists("SecurityGroup", &req.name));
        }

        let rules = req
            .security_rules
            .iter()
            .map(to_rule_request)
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(parent: &self.ctx.span, name = %req.name, rules = rules.len(), "creating security group");
        let group = self.api.create_security_group(&req.name, "").await?;
        for mut rule in rules {
            rule.security_group_id = group.id.clone();
            self.api.create_security_group_rule(&rule).await?;
        }

        self.get_security(&group.id).await
    }

    async fn list_security(&self) -> Result<Vec<SecurityInfo>> {
        Ok(self
            .api
            .list_security_groups()
            .await?
            .iter()
            .map(map_security_group)
            .collect())
    }

    async fn get_security(&self, security_id: &str) -> Result<SecurityInfo> {
        Ok(map_security_group(
            &self.api.get_security_group(security_id).await?,
        ))
    }

    async fn delete_security(&self, security_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, security_id, "deleting security group");
        self.api.delete_security_group(security_id).await?;
        Ok(true)
    }
}

/// Accepts Neutron's `ingress`/`egress` as well as `inbound`/`outbound`.
fn neutron_direction(direction: &str) -> Result<&'static str> {
    match direction.to_ascii_lowercase().as_str() {
        "ingress" | "inbound" => Ok("ingress"),
        "egress" | "outbound" => Ok("egress"),
        other => Err(CloudError::InvalidRequest(format!(
            "unknown rule direction {other}"
        ))),
    }
}

/// Empty and `*` mean "any".
fn parse_port(port: &str) -> Result<Option<u16>> {
    match port.trim() {
        "" | "*" | "-1" => Ok(None),
        p => p
            .parse()
            .map(Some)
            .map_err(|_| CloudError::InvalidRequest(format!("invalid port {p}"))),
    }
}

fn to_rule_request(rule: &SecurityRuleInfo) -> Result<CreateSecurityGroupRule> {
    let protocol = match rule.ip_protocol.to_ascii_lowercase().as_str() {
        "" | "*" | "all" | "any" => None,
        p => Some(p.to_string()),
    };
    let (min, max) = if protocol.is_some() {
        (parse_port(&rule.from_port)?, parse_port(&rule.to_port)?)
    } else {
        (None, None)
    };

    Ok(CreateSecurityGroupRule {
        security_group_id: String::new(),
        direction: neutron_direction(&rule.direction)?.to_string(),
        ethertype: "IPv4".into(),
        protocol,
        port_range_min: min,
        port_range_max: max.or(min),
        remote_ip_prefix: Some("0.0.0.0/0".into()),
    })
}

fn map_rule(rule: &SecurityGroupRule) -> SecurityRuleInfo {
    let port = |p: Option<u16>| p.map(|p| p.to_string()).unwrap_or_default();
    SecurityRuleInfo::new(
        port(rule.port_range_min),
        port(rule.port_range_max),
        rule.protocol.clone().unwrap_or_default(),
        &rule.direction,
    )
}

pub fn map_security_group(group: &SecurityGroup) -> SecurityInfo {
    SecurityInfo {
        id: group.id.clone(),
        name: group.name.clone(),
        security_rules: group.security_group_rules.iter().map(map_rule).collect(),
        key_value_list: vec![KeyValue::new("Description", &group.description)],
    }
}
