mod commands;
mod record;
mod session;
mod utils;
mod workflow;

use clap::{Parser, Subcommand};
use session::Session;
use std::path::PathBuf;
use vmflow_cloud::StateManager;

#[derive(Parser)]
#[command(name = "vmflow")]
#[command(about = "Provision, exercise and tear down Azure virtual machines", long_about = None)]
struct Cli {
    /// Azure region (overrides the config file)
    #[arg(long, global = true, env = "VMFLOW_LOCATION")]
    location: Option<String>,

    /// Resource group holding every sample resource (overrides the config file)
    #[arg(short = 'g', long, global = true, env = "VMFLOW_RESOURCE_GROUP")]
    resource_group: Option<String>,

    /// Path to a vmflow.yaml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole sample: provision, VM operations, list, teardown
    Run {
        /// Tear down without waiting for enter
        #[arg(short, long)]
        yes: bool,
    },
    /// Provision the shared resources and the VMs
    Up,
    /// Run the VM operation sequence on existing VMs
    Ops {
        /// VM name (repeatable; default is every configured machine)
        #[arg(long = "vm")]
        vms: Vec<String>,
    },
    /// List the VMs in the subscription
    List,
    /// Show the locally recorded resources
    Status {
        /// Also query Azure for the VMs in the resource group
        #[arg(long)]
        live: bool,
    },
    /// Delete the VMs and the resource group
    Down {
        /// Delete without waiting for enter
        #[arg(short, long)]
        yes: bool,
    },
    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays the sample's output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if matches!(cli.command, Commands::Version) {
        println!("vmflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = session::load_settings(
        cli.config.as_deref(),
        cli.location.clone(),
        cli.resource_group.clone(),
    )?;
    let manager = StateManager::new(std::env::current_dir()?);

    match cli.command {
        Commands::Status { live } => {
            let session = if live {
                Some(Session::connect(settings)?)
            } else {
                None
            };
            commands::status::handle(&manager, session.as_ref()).await?;
        }
        command => {
            let session = Session::connect(settings)?;
            match command {
                Commands::Run { yes } => commands::run::handle(&session, &manager, yes).await?,
                Commands::Up => commands::up::handle(&session, &manager).await?,
                Commands::Ops { vms } => commands::ops::handle(&session, &manager, vms).await?,
                Commands::List => commands::list::handle(&session).await?,
                Commands::Down { yes } => commands::down::handle(&session, &manager, yes).await?,
                Commands::Status { .. } | Commands::Version => {
                    unreachable!("handled before connecting")
                }
            }
        }
    }

    Ok(())
}
