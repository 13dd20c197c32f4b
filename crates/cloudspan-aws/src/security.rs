//! VPC security groups

use crate::api::Ec2Api;
use crate::model::{IpPermission, SecurityGroup};
use crate::vnetwork::base_vpc;
use async_trait::async_trait;
use cloudspan_driver::{
    BASE_VNETWORK_NAME, CloudError, HandlerContext, KeyValue, Result, SecurityHandler,
    SecurityInfo, SecurityReqInfo, SecurityRuleInfo,
};
use std::sync::Arc;

const OPEN_CIDR: &str = "0.0.0.0/0";

pub struct AwsSecurityHandler {
    api: Arc<dyn Ec2Api>,
    ctx: HandlerContext,
}

impl AwsSecurityHandler {
    pub fn new(api: Arc<dyn Ec2Api>, ctx: HandlerContext) -> Self {
        Self { api, ctx }
    }
}

#[async_trait]
impl SecurityHandler for AwsSecurityHandler {
    async fn create_security(&self, req: SecurityReqInfo) -> Result<SecurityInfo> {
        let vpc = base_vpc(self.api.as_ref()).await?.ok_or_else(|| {
            CloudError::InvalidRequest(format!(
                "base VPC {BASE_VNETWORK_NAME} does not exist; create a vnetwork first"
            ))
        })?;
        if self
            .api
            .describe_security_groups()
            .await?
            .iter()
            .any(|g| g.group_name == req.name && g.vpc_id == vpc.vpc_id)
        {
            return Err(CloudError::already_exists("SecurityGroup", &req.name));
        }

        let mut ingress = Vec::new();
        let mut egress = Vec::new();
        for rule in &req.security_rules {
            let permission = to_permission(rule)?;
            match rule.direction.to_ascii_lowercase().as_str() {
                "inbound" | "ingress" => ingress.push(permission),
                "outbound" | "egress" => egress.push(permission),
                other => {
                    return Err(CloudError::InvalidRequest(format!(
                        "unknown rule direction {other}"
                    )));
                }
            }
        }

        tracing::info!(parent: &self.ctx.span, name = %req.name, vpc = %vpc.vpc_id, "creating security group");
        let group_id = self
            .api
            .create_security_group(&req.name, &vpc.vpc_id)
            .await?;
        if !ingress.is_empty() {
            self.api.authorize_ingress(&group_id, &ingress).await?;
        }
        if !egress.is_empty() {
            self.api.authorize_egress(&group_id, &egress).await?;
        }

        self.get_security(&group_id).await
    }

    async fn list_security(&self) -> Result<Vec<SecurityInfo>> {
        Ok(self
            .api
            .describe_security_groups()
            .await?
            .iter()
            .map(map_security_group)
            .collect())
    }

    async fn get_security(&self, security_id: &str) -> Result<SecurityInfo> {
        Ok(map_security_group(
            &self.api.describe_security_group(security_id).await?,
        ))
    }

    async fn delete_security(&self, security_id: &str) -> Result<bool> {
        tracing::info!(parent: &self.ctx.span, security_id, "deleting security group");
        self.api.delete_security_group(security_id).await?;
        Ok(true)
    }
}

fn parse_port(port: &str) -> Result<Option<i32>> {
    match port.trim() {
        "" | "*" | "-1" => Ok(None),
        p => p
            .parse()
            .map(Some)
            .map_err(|_| CloudError::InvalidRequest(format!("invalid port {p}"))),
    }
}

fn to_permission(rule: &SecurityRuleInfo) -> Result<IpPermission> {
    let protocol = match rule.ip_protocol.to_ascii_lowercase().as_str() {
        "" | "*" | "all" | "any" | "-1" => "-1".to_string(),
        p => p.to_string(),
    };
    let (from_port, to_port) = if protocol == "-1" {
        (None, None)
    } else if protocol == "icmp" {
        // ICMP type/code, -1 for all
        (
            Some(parse_port(&rule.from_port)?.unwrap_or(-1)),
            Some(parse_port(&rule.to_port)?.unwrap_or(-1)),
        )
    } else {
        let from = parse_port(&rule.from_port)?;
        let to = parse_port(&rule.to_port)?.or(from);
        (Some(from.unwrap_or(0)), Some(to.unwrap_or(65535)))
    };

    Ok(IpPermission {
        ip_protocol: protocol,
        from_port,
        to_port,
        cidr: OPEN_CIDR.to_string(),
    })
}

fn map_permission(permission: &IpPermission, direction: &str) -> SecurityRuleInfo {
    let port = |p: Option<i32>| p.map(|p| p.to_string()).unwrap_or_else(|| "-1".into());
    SecurityRuleInfo::new(
        port(permission.from_port),
        port(permission.to_port),
        &permission.ip_protocol,
        direction,
    )
}

pub fn map_security_group(group: &SecurityGroup) -> SecurityInfo {
    let security_rules = group
        .ingress
        .iter()
        .map(|p| map_permission(p, "inbound"))
        .chain(group.egress.iter().map(|p| map_permission(p, "outbound")))
        .collect();

    SecurityInfo {
        id: group.group_id.clone(),
        name: group.group_name.clone(),
        security_rules,
        key_value_list: vec![
            KeyValue::new("VpcId", &group.vpc_id),
            KeyValue::new("Description", &group.description),
        ],
    }
}
