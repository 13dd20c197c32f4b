mod commands;
mod output;
mod registry;

use clap::{Parser, Subcommand};
use cloudspan_driver::ProviderKind;
use commands::Resource;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "cloudspan", version)]
#[command(about = "Drive VMs, networks and friends on five clouds through one interface", long_about = None)]
struct Cli {
    /// Config file. Without it the usual lookup applies
    /// ($CLOUDSPAN_PATH/config/config.yaml, ./config/config.yaml, ~/.config/cloudspan)
    #[arg(short, long, global = true, env = "CLOUDSPAN_CONFIG")]
    config: Option<PathBuf>,

    /// Log driver activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List registered drivers with their versions and capabilities
    Drivers {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Alibaba Cloud ECS / VPC
    #[command(alias = "aliyun")]
    Alibaba {
        #[command(subcommand)]
        resource: Resource,
    },
    /// Amazon EC2
    Aws {
        #[command(subcommand)]
        resource: Resource,
    },
    /// Azure Resource Manager
    Azure {
        #[command(subcommand)]
        resource: Resource,
    },
    /// Google Compute Engine
    #[command(alias = "gce")]
    Gcp {
        #[command(subcommand)]
        resource: Resource,
    },
    /// OpenStack Nova / Neutron / Glance
    #[command(name = "openstack")]
    OpenStack {
        #[command(subcommand)]
        resource: Resource,
    },
}

impl Commands {
    /// Provider and resource command, unless this is a local command
    fn into_target(self) -> Option<(ProviderKind, Resource)> {
        match self {
            Commands::Drivers { .. } => None,
            Commands::Alibaba { resource } => Some((ProviderKind::Alibaba, resource)),
            Commands::Aws { resource } => Some((ProviderKind::Aws, resource)),
            Commands::Azure { resource } => Some((ProviderKind::Azure, resource)),
            Commands::Gcp { resource } => Some((ProviderKind::Gcp, resource)),
            Commands::OpenStack { resource } => Some((ProviderKind::OpenStack, resource)),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,cloudspan=debug,cloudspan_driver=debug,cloudspan_aws=debug,cloudspan_azure=debug,\
         cloudspan_gcp=debug,cloudspan_openstack=debug,cloudspan_alibaba=debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<cloudspan_config::Config> {
    let config = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            cloudspan_config::load_from(path)?
        }
        None => cloudspan_config::load()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = registry::build();

    if let Commands::Drivers { json } = cli.command {
        return commands::drivers::handle(&registry, json);
    }
    let Some((kind, resource)) = cli.command.into_target() else {
        return Ok(());
    };

    let config = load_config(cli.config.as_deref())?;
    let section = config.section(kind)?;
    let connection = registry.connect(kind, section.connection_info()).await?;

    commands::run(connection.as_ref(), section, resource).await
}
