use super::{pick_id, pick_name};
use crate::output;
use clap::Subcommand;
use cloudspan_config::ProviderSection;
use cloudspan_driver::{ImageHandler, ImageReqInfo};

#[derive(Subcommand, Debug)]
pub enum ImageAction {
    /// Capture an image from a VM or disk
    Create {
        #[arg(long)]
        name: Option<String>,
        /// VM or disk to capture; defaults to `defaults.vm_id`
        #[arg(long)]
        source: Option<String>,
    },
    List,
    Get { id: Option<String> },
    Delete { id: Option<String> },
}

pub async fn handle(
    handler: &dyn ImageHandler,
    section: &ProviderSection,
    action: ImageAction,
) -> anyhow::Result<()> {
    let image_id = |id: Option<String>| pick_id(id, &section.defaults.image_id, "image id");

    match action {
        ImageAction::Create { name, source } => {
            let req = ImageReqInfo {
                name: pick_name(name, section, "image")?,
                source_id: pick_id(source, &section.defaults.vm_id, "source VM")?,
                key_value_list: Vec::new(),
            };
            output::step("Creating image", &req.name);
            output::print_json(&handler.create_image(req).await?)
        }
        ImageAction::List => output::print_json(&handler.list_image().await?),
        ImageAction::Get { id } => output::print_json(&handler.get_image(&image_id(id)?).await?),
        ImageAction::Delete { id } => {
            let id = image_id(id)?;
            output::step("Deleting image", &id);
            output::deleted("image", &id, handler.delete_image(&id).await?)
        }
    }
}
