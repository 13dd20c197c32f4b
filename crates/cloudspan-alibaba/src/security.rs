//! ECS security groups in the base VPC
//!
//! Every rule opens the port range to `0.0.0.0/0`; ingress rules set the
//! source CIDR and egress rules the destination.

use crate::api::{AlibabaApi, Service, describe_all, params, required_str};
use crate::model::{Permission, SecurityGroup, SecurityGroupAttribute};
use crate::vnetwork::base_vpc;
use async_trait::async_trait;
use cloudspan_driver::{
    BASE_VNETWORK_NAME, CloudError, HandlerContext, KeyValue, Result, SecurityHandler,
    SecurityInfo, SecurityReqInfo, SecurityRuleInfo,
};
use std::sync::Arc;

const OPEN_CIDR: &str = "0.0.0.0/0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    pub action: &'static str,
    pub ip_protocol: String,
    pub port_range: String,
}

pub struct AlibabaSecurityHandler {
    api: Arc<dyn AlibabaApi>,
    ctx: HandlerContext,
}

impl AlibabaSecurityHandler {
    pub fn new(api: Arc<dyn AlibabaApi>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }

    async fn attribute(&self, security_id: &str) -> Result<SecurityGroupAttribute> {
        let response = self
            .api
            .call(
                Service::Ecs,
                "DescribeSecurityGroupAttribute",
                params([("SecurityGroupId", security_id), ("Direction", "all")]),
            )
            .await?;
        Ok(serde_json::from_value(response)?)
    }
}

#[async_trait]
impl SecurityHandler for AlibabaSecurityHandler {
    async fn create_security(&self, req: SecurityReqInfo) -> Result<SecurityInfo> {
        let vpc = base_vpc(self.api.as_ref()).await?.ok_or_else(|| {
            CloudError::InvalidRequest(format!(
                "base VPC {BASE_VNETWORK_NAME} does not exist; create a vnetwork first"
            ))
        })?;
        let groups: Vec<SecurityGroup> = describe_all(
            self.api.as_ref(),
            Service::Ecs,
            "DescribeSecurityGroups",
            params([("VpcId", vpc.vpc_id.as_str())]),
            "/SecurityGroups/SecurityGroup",
        )
        .await?;
        if groups.iter().any(|g| g.security_group_name == req.name) {
            return Err(CloudError::already_exists("SecurityGroup", &req.name));
        }

        let authorizations = req
            .security_rules
            .iter()
            .map(authorization)
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(parent: &self.ctx.span, name = %req.name, vpc = %vpc.vpc_id, "creating security group");
        let response = self
            .api
            .call(
                Service::Ecs,
                "CreateSecurityGroup",
                params([
                    ("VpcId", vpc.vpc_id.as_str()),
                    ("SecurityGroupName", req.name.as_str()),
                    ("Description", req.name.as_str()),
                ]),
            )
            .await?;
        let group_id = required_str(&response, "SecurityGroupId")?;

        for auth in &authorizations {
            let cidr_key = if auth.action == "AuthorizeSecurityGroup" {
                "SourceCidrIp"
            } else {
                "DestCidrIp"
            };
            self.api
                .call(
                    Service::Ecs,
                    auth.action,
                    params([
                        ("SecurityGroupId", group_id.as_str()),
                        ("IpProtocol", auth.ip_protocol.as_str()),
                        ("PortRange", auth.port_range.as_str()),
                        (cidr_key, OPEN_CIDR),
                    ]),
                )
                .await?;
        }

        self.get_security(&group_id).await
    }

    async fn list_security(&self) -> Result<Vec<SecurityInfo>> {
        let Some(vpc) = base_vpc(self.api.as_ref()).await? else {
            return Ok(Vec::new());
        };
        let groups: Vec<SecurityGroup> = describe_all(
            self.api.as_ref(),
            Service::Ecs,
            "DescribeSecurityGroups",
            params([("VpcId", vpc.vpc_id.as_str())]),
            "/SecurityGroups/SecurityGroup",
        )
        .await?;

        let mut out = Vec::with_capacity(groups.len());
        for group in &groups {
            out.push(map_attribute(&self.attribute(&group.security_group_id).await?));
        }
        Ok(out)
    }

    async fn get_security(&self, security_id: &str) -> Result<SecurityInfo> {
        Ok(map_attribute(&self.attribute(security_id).await?))
    }

    async fn delete_security(&self, security_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, security_id, "deleting security group");
        self.api
            .call(
                Service::Ecs,
                "DeleteSecurityGroup",
                params([("SecurityGroupId", security_id)]),
            )
            .await?;
        Ok(true)
    }
}

fn port(value: &str) -> Option<&str> {
    match value.trim() {
        "" | "*" | "-1" => None,
        p => Some(p),
    }
}

/// Authorize call for one rule.
pub fn authorization(rule: &SecurityRuleInfo) -> Result<Authorization> {
    let action = match rule.direction.to_ascii_lowercase().as_str() {
        "inbound" | "ingress" => "AuthorizeSecurityGroup",
        "outbound" | "egress" => "AuthorizeSecurityGroupEgress",
        other => {
            return Err(CloudError::InvalidRequest(format!(
                "unknown rule direction {other}"
            )));
        }
    };
    let ip_protocol = match rule.ip_protocol.to_ascii_lowercase().as_str() {
        "" | "*" | "all" | "any" | "-1" => "all".to_string(),
        p => p.to_string(),
    };
    let port_range = match ip_protocol.as_str() {
        "tcp" | "udp" => {
            let from = port(&rule.from_port);
            let to = port(&rule.to_port).or(from);
            for p in [from, to].into_iter().flatten() {
                if p.parse::<u16>().is_err() {
                    return Err(CloudError::InvalidRequest(format!("invalid port {p}")));
                }
            }
            format!("{}/{}", from.unwrap_or("1"), to.unwrap_or("65535"))
        }
        _ => "-1/-1".to_string(),
    };

    Ok(Authorization {
        action,
        ip_protocol,
        port_range,
    })
}

pub fn map_permission(permission: &Permission) -> SecurityRuleInfo {
    let (from, to) = permission
        .port_range
        .split_once('/')
        .unwrap_or((permission.port_range.as_str(), permission.port_range.as_str()));
    let direction = match permission.direction.as_str() {
        "egress" => "outbound",
        _ => "inbound",
    };
    SecurityRuleInfo::new(from, to, permission.ip_protocol.to_ascii_lowercase(), direction)
}

pub fn map_attribute(attribute: &SecurityGroupAttribute) -> SecurityInfo {
    SecurityInfo {
        id: attribute.security_group_id.clone(),
        name: attribute.security_group_name.clone(),
        security_rules: attribute
            .permissions
            .permission
            .iter()
            .map(map_permission)
            .collect(),
        key_value_list: vec![
            KeyValue::new("VpcId", &attribute.vpc_id),
            KeyValue::new("Description", &attribute.description),
        ],
    }
}
