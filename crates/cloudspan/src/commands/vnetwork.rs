use super::{pick_id, pick_name};
use crate::output;
use clap::Subcommand;
use cloudspan_config::ProviderSection;
use cloudspan_driver::{VNetworkHandler, VNetworkReqInfo};

#[derive(Subcommand, Debug)]
pub enum VNetworkAction {
    /// Add a subnet to the base network, creating the base network on first use
    Create {
        #[arg(long)]
        name: Option<String>,
        /// Explicit CIDR, rejected by OpenStack; the next free /24 of the base network otherwise
        #[arg(long)]
        cidr: Option<String>,
    },
    List,
    Get { id: Option<String> },
    Delete { id: Option<String> },
}

pub async fn handle(
    handler: &dyn VNetworkHandler,
    section: &ProviderSection,
    action: VNetworkAction,
) -> anyhow::Result<()> {
    let vnetwork_id =
        |id: Option<String>| pick_id(id, &section.defaults.vnetwork_id, "vnetwork id");

    match action {
        VNetworkAction::Create { name, cidr } => {
            let req = VNetworkReqInfo {
                name: pick_name(name, section, "subnet")?,
                address_prefix: cidr,
            };
            output::step("Creating vnetwork", &req.name);
            output::print_json(&handler.create_vnetwork(req).await?)
        }
        VNetworkAction::List => output::print_json(&handler.list_vnetwork().await?),
        VNetworkAction::Get { id } => {
            output::print_json(&handler.get_vnetwork(&vnetwork_id(id)?).await?)
        }
        VNetworkAction::Delete { id } => {
            let id = vnetwork_id(id)?;
            output::step("Deleting vnetwork", &id);
            output::deleted("vnetwork", &id, handler.delete_vnetwork(&id).await?)
        }
    }
}
