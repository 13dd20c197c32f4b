use super::{pick_id, pick_name};
use crate::output;
use clap::Subcommand;
use cloudspan_config::ProviderSection;
use cloudspan_driver::{KeyValue, PublicIpHandler, PublicIpReqInfo};

#[derive(Subcommand, Debug)]
pub enum PublicIpAction {
    Create {
        #[arg(long)]
        name: Option<String>,
        /// Provider-specific allocation option, `KEY=VALUE`
        #[arg(long = "option", value_parser = parse_key_value)]
        options: Vec<KeyValue>,
    },
    List,
    Get { id: Option<String> },
    Delete { id: Option<String> },
}

pub fn parse_key_value(s: &str) -> Result<KeyValue, String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok(KeyValue::new(key, value)),
        _ => Err(format!("`{s}` is not KEY=VALUE")),
    }
}

pub async fn handle(
    handler: &dyn PublicIpHandler,
    section: &ProviderSection,
    action: PublicIpAction,
) -> anyhow::Result<()> {
    let public_ip_id =
        |id: Option<String>| pick_id(id, &section.defaults.public_ip_id, "public IP id");

    match action {
        PublicIpAction::Create { name, options } => {
            let req = PublicIpReqInfo {
                name: pick_name(name, section, "ip")?,
                key_value_list: options,
            };
            output::step("Allocating public IP", &req.name);
            output::print_json(&handler.create_public_ip(req).await?)
        }
        PublicIpAction::List => output::print_json(&handler.list_public_ip().await?),
        PublicIpAction::Get { id } => {
            output::print_json(&handler.get_public_ip(&public_ip_id(id)?).await?)
        }
        PublicIpAction::Delete { id } => {
            let id = public_ip_id(id)?;
            output::step("Releasing public IP", &id);
            output::deleted("public IP", &id, handler.delete_public_ip(&id).await?)
        }
    }
}
