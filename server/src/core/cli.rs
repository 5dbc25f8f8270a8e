use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_CONFIG, ENV_DATA_DIR, ENV_DEBUG, ENV_EXPLAINER_URL, ENV_HOST, ENV_NO_SCHEDULER, ENV_PORT,
    ENV_SCHEDULER_INTERVAL_SECS,
};

#[derive(Parser)]
#[command(name = "workfuse")]
#[command(version, about = "Fusion intelligence scoring for workspace integrations", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Enable debug mode (verbose pipeline logging)
    #[arg(long, global = true, env = ENV_DEBUG)]
    pub debug: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Override data directory
    #[arg(long, global = true, env = ENV_DATA_DIR)]
    pub data_dir: Option<PathBuf>,

    /// Disable the scheduled recalibration loop
    #[arg(long, global = true, env = ENV_NO_SCHEDULER)]
    pub no_scheduler: bool,

    /// Scheduled recalibration interval in seconds
    #[arg(long, global = true, env = ENV_SCHEDULER_INTERVAL_SECS)]
    pub scheduler_interval: Option<u64>,

    /// External anomaly explainer URL (enables HTTP explanations)
    #[arg(long, global = true, env = ENV_EXPLAINER_URL)]
    pub explainer_url: Option<String>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// System maintenance commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SystemCommands {
    /// Delete local data directory (databases, caches). Requires confirmation.
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub no_scheduler: bool,
    pub scheduler_interval: Option<u64>,
    pub explainer_url: Option<String>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        debug: cli.debug,
        config: cli.config,
        data_dir: cli.data_dir,
        no_scheduler: cli.no_scheduler,
        scheduler_interval: cli.scheduler_interval,
        explainer_url: cli.explainer_url,
    };
    (config, cli.command)
}
