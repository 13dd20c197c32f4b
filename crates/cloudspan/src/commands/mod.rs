pub mod drivers;
pub mod image;
pub mod keypair;
pub mod public_ip;
pub mod security;
pub mod vm;
pub mod vnetwork;
pub mod vnic;

use clap::Subcommand;
use cloudspan_config::ProviderSection;
use cloudspan_driver::CloudConnection;

#[derive(Subcommand, Debug)]
pub enum Resource {
    /// Virtual machines
    Vm {
        #[command(subcommand)]
        action: vm::VmAction,
    },
    /// Machine images
    Image {
        #[command(subcommand)]
        action: image::ImageAction,
    },
    /// Security groups
    Security {
        #[command(subcommand)]
        action: security::SecurityAction,
    },
    /// Subnets of the shared base network
    #[command(name = "vnetwork", alias = "vnet")]
    VNetwork {
        #[command(subcommand)]
        action: vnetwork::VNetworkAction,
    },
    /// Network interfaces
    #[command(name = "vnic", alias = "nic")]
    VNic {
        #[command(subcommand)]
        action: vnic::VNicAction,
    },
    /// SSH key pairs
    #[command(name = "keypair", alias = "key")]
    KeyPair {
        #[command(subcommand)]
        action: keypair::KeyPairAction,
    },
    /// Public IP addresses
    #[command(name = "publicip", alias = "public-ip")]
    PublicIp {
        #[command(subcommand)]
        action: public_ip::PublicIpAction,
    },
}

/// Runs one resource command against a live connection.
pub async fn run(
    connection: &dyn CloudConnection,
    section: &ProviderSection,
    resource: Resource,
) -> anyhow::Result<()> {
    match resource {
        Resource::Vm { action } => {
            vm::handle(connection.create_vm_handler()?.as_ref(), section, action).await
        }
        Resource::Image { action } => {
            image::handle(connection.create_image_handler()?.as_ref(), section, action).await
        }
        Resource::Security { action } => {
            let handler = connection.create_security_handler()?;
            security::handle(handler.as_ref(), section, action).await
        }
        Resource::VNetwork { action } => {
            let handler = connection.create_vnetwork_handler()?;
            vnetwork::handle(handler.as_ref(), section, action).await
        }
        Resource::VNic { action } => {
            vnic::handle(connection.create_vnic_handler()?.as_ref(), section, action).await
        }
        Resource::KeyPair { action } => {
            let handler = connection.create_keypair_handler()?;
            keypair::handle(handler.as_ref(), section, action).await
        }
        Resource::PublicIp { action } => {
            let handler = connection.create_public_ip_handler()?;
            public_ip::handle(handler.as_ref(), section, action).await
        }
    }
}

/// The id given on the command line, else the configured default.
pub(crate) fn pick_id(flag: Option<String>, fallback: &str, what: &str) -> anyhow::Result<String> {
    match flag {
        Some(id) if !id.is_empty() => Ok(id),
        _ if !fallback.is_empty() => Ok(fallback.to_string()),
        _ => anyhow::bail!("no {what} given and none configured under `defaults`"),
    }
}

/// `--name`, else `<defaults.base_name>-<suffix>`.
pub(crate) fn pick_name(
    flag: Option<String>,
    section: &ProviderSection,
    suffix: &str,
) -> anyhow::Result<String> {
    match flag {
        Some(name) if !name.is_empty() => Ok(name),
        _ if !section.defaults.base_name.is_empty() => {
            Ok(format!("{}-{}", section.defaults.base_name, suffix))
        }
        _ => anyhow::bail!("--name is required when `defaults.base_name` is not configured"),
    }
}

/// Flag values, else the configured list.
pub(crate) fn pick_list(flag: Vec<String>, fallback: &[String]) -> Vec<String> {
    if flag.is_empty() {
        fallback.to_vec()
    } else {
        flag
    }
}
