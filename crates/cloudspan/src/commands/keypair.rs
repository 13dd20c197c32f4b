use super::{pick_id, pick_name};
use crate::output;
use anyhow::Context;
use clap::Subcommand;
use cloudspan_config::ProviderSection;
use cloudspan_driver::{KeyPairHandler, KeyPairReqInfo};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum KeyPairAction {
    /// Generate a key pair, or import an existing public key
    Create {
        #[arg(long)]
        name: Option<String>,
        /// OpenSSH public key file to import
        #[arg(long)]
        public_key_file: Option<PathBuf>,
    },
    List,
    Get { name: Option<String> },
    Delete { name: Option<String> },
}

pub async fn handle(
    handler: &dyn KeyPairHandler,
    section: &ProviderSection,
    action: KeyPairAction,
) -> anyhow::Result<()> {
    let key_name =
        |name: Option<String>| pick_id(name, &section.defaults.key_pair_name, "key pair name");

    match action {
        KeyPairAction::Create {
            name,
            public_key_file,
        } => {
            let public_key = match public_key_file {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("reading {}", path.display()))?
                        .trim()
                        .to_string(),
                ),
                None => None,
            };
            let req = KeyPairReqInfo {
                name: pick_name(name, section, "key")?,
                public_key,
            };
            output::step("Creating key pair", &req.name);
            output::print_json(&handler.create_key(req).await?)
        }
        KeyPairAction::List => output::print_json(&handler.list_key().await?),
        KeyPairAction::Get { name } => output::print_json(&handler.get_key(&key_name(name)?).await?),
        KeyPairAction::Delete { name } => {
            let name = key_name(name)?;
            output::step("Deleting key pair", &name);
            output::deleted("key pair", &name, handler.delete_key(&name).await?)
        }
    }
}
