use std::path::PathBuf;

use clap::{Parser, Subcommand};

use overlayctl::commands;
use overlayctl::DaemonConfig;

#[derive(Parser)]
#[command(
    name = "overlayctl",
    about = "Custom overlays for validator nodes",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to overlayd.toml (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Declare a custom overlay from a JSON file.
    ///
    /// The body maps hex ADNL addresses to
    /// {"msg_sender": bool, "msg_sender_priority": int}, or uses
    /// "@validators": true to follow the elected validator set.
    #[command(alias = "add_custom_overlay")]
    Add {
        /// Overlay name
        name: String,
        /// Path to the JSON body
        path: PathBuf,
    },
    /// Print declared custom overlays
    #[command(alias = "list_custom_overlays")]
    List,
    /// Remove a declared custom overlay
    #[command(alias = "delete_custom_overlay")]
    Delete {
        name: String,
    },
    /// Run one reconcile pass against the node
    #[command(alias = "deploy_custom_overlays")]
    Deploy {
        /// Print the commands instead of sending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Reconcile periodically until interrupted
    Run,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,overlayctl=debug"))?,
        )
        .init();

    let cli = Cli::parse();
    let config = DaemonConfig::load(cli.config.as_deref())?;
    let mut stdout = std::io::stdout();

    match cli.command {
        Commands::Add { name, path } => {
            let store = commands::deploy::open_store(&config)?;
            commands::overlays::add(&store, &name, &path)
        }
        Commands::List => {
            let store = commands::deploy::open_store(&config)?;
            commands::overlays::list(&store, &mut stdout)
        }
        Commands::Delete { name } => {
            let store = commands::deploy::open_store(&config)?;
            commands::overlays::delete(&store, &name)
        }
        Commands::Deploy { dry_run } => commands::deploy::deploy(&config, dry_run, &mut stdout),
        Commands::Run => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::deploy::run(&config))
        }
    }
}
