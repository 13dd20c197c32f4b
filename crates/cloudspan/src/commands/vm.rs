use super::{pick_id, pick_list, pick_name};
use crate::output;
use clap::{Args, Subcommand};
use cloudspan_config::ProviderSection;
use cloudspan_driver::{VmHandler, VmReqInfo, VmStatus};

#[derive(Subcommand, Debug)]
pub enum VmAction {
    /// Create and boot a VM, waiting until it runs
    #[command(alias = "create")]
    Start(StartArgs),
    /// Stop a running VM
    Suspend { id: Option<String> },
    /// Start a suspended VM
    Resume { id: Option<String> },
    Reboot { id: Option<String> },
    /// Delete a VM and wait until it is gone
    Terminate { id: Option<String> },
    /// Normalized status of one VM, or of every VM when no id is given
    Status { id: Option<String> },
    List,
    Get { id: Option<String> },
}

/// Start parameters; omitted flags fall back to the provider's `defaults`
#[derive(Args, Debug, Default)]
pub struct StartArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub image: Option<String>,
    #[arg(long = "spec")]
    pub vm_spec: Option<String>,
    #[arg(long)]
    pub vnetwork: Option<String>,
    #[arg(long)]
    pub subnet: Option<String>,
    /// Existing network interface to attach
    #[arg(long)]
    pub nic: Option<String>,
    #[arg(long)]
    pub public_ip: Option<String>,
    #[arg(long = "security-group", value_delimiter = ',')]
    pub security_groups: Vec<String>,
    #[arg(long)]
    pub key_pair: Option<String>,
    #[arg(long)]
    pub user: Option<String>,
    #[arg(long, env = "CLOUDSPAN_VM_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
    /// Idempotency token for vendors that deduplicate creates
    #[arg(long)]
    pub client_token: Option<String>,
}

impl StartArgs {
    pub fn into_request(self, section: &ProviderSection) -> anyhow::Result<VmReqInfo> {
        let defaults = &section.defaults;
        Ok(VmReqInfo {
            name: pick_name(self.name, section, "vm")?,
            image_id: self.image.unwrap_or_else(|| defaults.image_id.clone()),
            vm_spec_id: self.vm_spec.unwrap_or_else(|| defaults.vm_spec_id.clone()),
            vnetwork_id: self
                .vnetwork
                .unwrap_or_else(|| defaults.vnetwork_id.clone()),
            subnet_id: self.subnet.unwrap_or_else(|| defaults.subnet_id.clone()),
            network_interface_id: self
                .nic
                .unwrap_or_else(|| defaults.network_interface_id.clone()),
            public_ip_id: self
                .public_ip
                .unwrap_or_else(|| defaults.public_ip_id.clone()),
            security_group_ids: pick_list(self.security_groups, &defaults.security_group_ids),
            key_pair_name: self
                .key_pair
                .unwrap_or_else(|| defaults.key_pair_name.clone()),
            vm_user_id: self.user.unwrap_or_else(|| defaults.vm_user_id.clone()),
            vm_user_passwd: self
                .password
                .unwrap_or_else(|| defaults.vm_user_passwd.clone()),
            client_token: self.client_token,
        })
    }
}

fn print_status(vm_id: &str, status: VmStatus) -> anyhow::Result<()> {
    output::done(&format!("{vm_id} is {status}"));
    output::print_json(&serde_json::json!({ "vm_id": vm_id, "vm_status": status }))
}

pub async fn handle(
    handler: &dyn VmHandler,
    section: &ProviderSection,
    action: VmAction,
) -> anyhow::Result<()> {
    let vm_id = |id: Option<String>| pick_id(id, &section.defaults.vm_id, "VM id");

    match action {
        VmAction::Start(args) => {
            let req = args.into_request(section)?;
            output::step("Starting VM", &req.name);
            let vm = handler.start_vm(req).await?;
            output::done(&format!("{} running as {}", vm.name, vm.id));
            output::print_json(&vm)
        }
        VmAction::Suspend { id } => {
            let id = vm_id(id)?;
            output::step("Suspending VM", &id);
            print_status(&id, handler.suspend_vm(&id).await?)
        }
        VmAction::Resume { id } => {
            let id = vm_id(id)?;
            output::step("Resuming VM", &id);
            print_status(&id, handler.resume_vm(&id).await?)
        }
        VmAction::Reboot { id } => {
            let id = vm_id(id)?;
            output::step("Rebooting VM", &id);
            print_status(&id, handler.reboot_vm(&id).await?)
        }
        VmAction::Terminate { id } => {
            let id = vm_id(id)?;
            output::step("Terminating VM", &id);
            print_status(&id, handler.terminate_vm(&id).await?)
        }
        VmAction::Status { id: Some(id) } => output::print_json(&handler.get_vm_status(&id).await?),
        VmAction::Status { id: None } => output::print_json(&handler.list_vm_status().await?),
        VmAction::List => output::print_json(&handler.list_vm().await?),
        VmAction::Get { id } => output::print_json(&handler.get_vm(&vm_id(id)?).await?),
    }
}
