use super::pick_name;
use crate::output;
use clap::Subcommand;
use cloudspan_config::ProviderSection;
use cloudspan_driver::{SecurityHandler, SecurityReqInfo, SecurityRuleInfo};

#[derive(Subcommand, Debug)]
pub enum SecurityAction {
    Create {
        #[arg(long)]
        name: Option<String>,
        /// Network the group belongs to, where the provider needs one
        #[arg(long)]
        vnetwork: Option<String>,
        /// `PROTOCOL:PORTS[:DIRECTION]`, e.g. `tcp:22`, `tcp:8000-8080:outbound`, `icmp:-1`
        #[arg(long = "rule", value_parser = parse_rule)]
        rules: Vec<SecurityRuleInfo>,
    },
    List,
    Get { id: String },
    Delete { id: String },
}

/// Parses `PROTOCOL:PORTS[:DIRECTION]`; direction defaults to `inbound`.
pub fn parse_rule(s: &str) -> Result<SecurityRuleInfo, String> {
    let mut parts = s.split(':');
    let protocol = parts.next().unwrap_or_default();
    let ports = parts
        .next()
        .ok_or_else(|| format!("rule `{s}` has no port range"))?;
    let direction = parts.next().unwrap_or("inbound");
    if protocol.is_empty() || parts.next().is_some() {
        return Err(format!("rule `{s}` is not PROTOCOL:PORTS[:DIRECTION]"));
    }

    let (from, to) = match ports.split_once('-') {
        Some((from, to)) if !from.is_empty() => (from, to),
        _ => (ports, ports),
    };
    Ok(SecurityRuleInfo::new(from, to, protocol, direction))
}

pub async fn handle(
    handler: &dyn SecurityHandler,
    section: &ProviderSection,
    action: SecurityAction,
) -> anyhow::Result<()> {
    match action {
        SecurityAction::Create {
            name,
            vnetwork,
            rules,
        } => {
            let req = SecurityReqInfo {
                name: pick_name(name, section, "sg")?,
                vnetwork_id: vnetwork.unwrap_or_else(|| section.defaults.vnetwork_id.clone()),
                security_rules: rules,
            };
            output::step("Creating security group", &req.name);
            output::print_json(&handler.create_security(req).await?)
        }
        SecurityAction::List => output::print_json(&handler.list_security().await?),
        SecurityAction::Get { id } => output::print_json(&handler.get_security(&id).await?),
        SecurityAction::Delete { id } => {
            output::step("Deleting security group", &id);
            output::deleted("security group", &id, handler.delete_security(&id).await?)
        }
    }
}
