use super::{pick_id, pick_list, pick_name};
use crate::output;
use clap::Subcommand;
use cloudspan_config::ProviderSection;
use cloudspan_driver::{VNicHandler, VNicReqInfo};

#[derive(Subcommand, Debug)]
pub enum VNicAction {
    Create {
        #[arg(long)]
        name: Option<String>,
        /// Subnet the interface lives in
        #[arg(long)]
        vnetwork: Option<String>,
        #[arg(long = "security-group", value_delimiter = ',')]
        security_groups: Vec<String>,
        /// Public IP to associate after creation
        #[arg(long)]
        public_ip: Option<String>,
    },
    List,
    Get { id: Option<String> },
    Delete { id: Option<String> },
}

pub async fn handle(
    handler: &dyn VNicHandler,
    section: &ProviderSection,
    action: VNicAction,
) -> anyhow::Result<()> {
    let defaults = &section.defaults;
    let vnic_id = |id: Option<String>| pick_id(id, &defaults.network_interface_id, "vnic id");

    match action {
        VNicAction::Create {
            name,
            vnetwork,
            security_groups,
            public_ip,
        } => {
            let req = VNicReqInfo {
                name: pick_name(name, section, "nic")?,
                vnetwork_id: pick_id(vnetwork, &defaults.subnet_id, "vnetwork")?,
                security_group_ids: pick_list(security_groups, &defaults.security_group_ids),
                public_ip_id: public_ip.unwrap_or_default(),
            };
            output::step("Creating vnic", &req.name);
            output::print_json(&handler.create_vnic(req).await?)
        }
        VNicAction::List => output::print_json(&handler.list_vnic().await?),
        VNicAction::Get { id } => output::print_json(&handler.get_vnic(&vnic_id(id)?).await?),
        VNicAction::Delete { id } => {
            let id = vnic_id(id)?;
            output::step("Deleting vnic", &id);
            output::deleted("vnic", &id, handler.delete_vnic(&id).await?)
        }
    }
}
