use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::paths::ENV_CONFIG;

#[derive(Parser)]
#[command(name = "choreo")]
#[command(version)]
#[command(about = "Converge resources with choreographies around every change", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Recipe to load (default: ~/.config/choreo/choreo.toml)
    #[arg(short, long, env = ENV_CONFIG, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Converge the recipe's resources, running bound choreographies
    Apply(ApplyArgs),

    /// Validate the recipe and show its bindings
    Check,

    /// List the primitives available to choreography steps
    Primitives,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Show what would change without changing anything
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Only converge these resources: a type (`file`) or type.name (`file./etc/app.conf`)
    pub target: Option<String>,
}
