//! CLI module for Verdant
//!
//! Command-line interface definitions and handlers for the carbon-aware
//! task router.
//!
//! # Commands
//!
//! - `serve` - Start the router
//! - `endpoints` - List configured expert endpoints
//! - `carbon` - Fetch and rank current grid carbon intensity
//! - `classify` - Run the task classifier on a piece of text
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Start the router with default config
//! verdant serve
//!
//! # See where a task would be routed
//! verdant classify "fix my grammar: i are happy"
//!
//! # Rank regions by live carbon intensity
//! verdant carbon
//! ```

pub mod carbon;
pub mod classify;
pub mod endpoints;
pub mod output;
pub mod serve;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Verdant - carbon-aware task router
#[derive(Parser, Debug)]
#[command(
    name = "verdant",
    version,
    about = "Routes small language tasks to the greenest capable model deployment"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the router
    Serve(ServeArgs),
    /// List configured expert endpoints
    Endpoints(EndpointsArgs),
    /// Fetch current carbon intensity and rank regions
    Carbon(CarbonArgs),
    /// Classify task text without dispatching it
    Classify(ClassifyArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "verdant.toml")]
    pub config: PathBuf,

    /// Override server port
    #[arg(short, long, env = "VERDANT_PORT")]
    pub port: Option<u16>,

    /// Override server host
    #[arg(short = 'H', long, env = "VERDANT_HOST")]
    pub host: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "VERDANT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Disable recovery probes for unavailable endpoints
    #[arg(long)]
    pub no_probes: bool,
}

#[derive(Args, Debug)]
pub struct EndpointsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Filter by model class (e.g. grammar-100m)
    #[arg(long)]
    pub class: Option<String>,

    /// Path to configuration file
    #[arg(short, long, default_value = "verdant.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct CarbonArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Path to configuration file
    #[arg(short, long, default_value = "verdant.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Task text to classify
    pub text: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "verdant.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write an example configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Destination path
    #[arg(short, long, default_value = "verdant.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Handle `config init`: write the bundled example configuration.
pub fn handle_config_init(args: &ConfigInitArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.output.display()
        );
    }
    std::fs::write(&args.output, include_str!("../../verdant.example.toml"))
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!("Wrote example configuration to {}", args.output.display());
    Ok(())
}

/// Handle `completions`: print a completion script for the shell.
pub fn handle_completions(args: &CompletionsArgs) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, &mut cmd, name, &mut std::io::stdout());
}
