// CLI for operator tooling over the consent engine

use clap::{Parser, Subcommand};
use encore_core::EncoreConfig;
use encore_engine::EngineConfig;
use encore_ledger::RequesterType;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

const LOCAL_CONFIG: &str = ".encore/config.toml";

#[derive(Parser)]
#[command(name = "encore")]
#[command(about = "Encore - Catalog Consent Policy Engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path (defaults to .encore/config.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a bundle file
    Validate {
        /// Bundle file (.toml or .json)
        bundle: PathBuf,
    },

    /// Resolve a request against a bundle and record the decision
    Resolve {
        /// Bundle file (.toml or .json)
        #[arg(short, long)]
        bundle: PathBuf,

        /// Stable requester identifier
        #[arg(long)]
        requester_id: String,

        /// Requester display name
        #[arg(long)]
        requester_name: String,

        /// Requester type (ai_company, streaming_platform, distributor, label, publisher, creator, researcher, other)
        #[arg(long, default_value = "other")]
        requester_type: RequesterType,

        /// Permission type, e.g. VOICE_CLONING
        #[arg(short, long)]
        permission: String,

        /// Work the request concerns
        #[arg(long)]
        work_title: Option<String>,
    },

    /// Print recorded decisions as JSON lines
    Log {
        /// Only this permission type
        #[arg(short, long)]
        permission: Option<String>,

        /// Only this requester type
        #[arg(long)]
        requester_type: Option<RequesterType>,
    },

    /// Print the propagation graph as JSON
    Graph,
}

fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    let local = PathBuf::from(LOCAL_CONFIG);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join("encore").join("config.toml"))
        .unwrap_or(local)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let path = config_path(cli.config);
    let config = EngineConfig::load(Some(path.as_path()))?;

    // Initialize tracing
    let log_level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(log_level)?)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate { bundle } => {
            commands::validate::run(&bundle)?;
        }
        Commands::Resolve {
            bundle,
            requester_id,
            requester_name,
            requester_type,
            permission,
            work_title,
        } => {
            let args = commands::resolve::ResolveArgs {
                bundle,
                requester_id,
                requester_name,
                requester_type,
                permission,
                work_title,
            };
            commands::resolve::run(&config, args)?;
        }
        Commands::Log {
            permission,
            requester_type,
        } => {
            commands::log::run(&config, permission.as_deref(), requester_type)?;
        }
        Commands::Graph => {
            commands::graph::run(&config)?;
        }
    }

    Ok(())
}
