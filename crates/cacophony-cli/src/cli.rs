//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// migrate - apply and revert Cacophony API schema migrations
#[derive(Parser, Debug)]
#[command(name = "migrate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to cacophony.yml (default: ./cacophony.yml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Named target from the config file
    #[arg(short, long, global = true, env = "CACOPHONY_TARGET")]
    pub target: Option<String>,

    /// Database path, overriding the config and target
    #[arg(short, long, global = true, env = "CACOPHONY_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending migrations in id order
    Up(UpArgs),

    /// Revert the most recently applied migrations
    Down(DownArgs),

    /// Show applied, pending and orphaned migrations
    Status(StatusArgs),

    /// Force-release the migration lock left by a crashed run
    Unlock,
}

/// Arguments for the up command
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Stop after applying this migration id
    #[arg(long)]
    pub to: Option<String>,

    /// Print the migrations that would be applied without running them
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the down command
#[derive(Args, Debug)]
pub struct DownArgs {
    /// Number of migrations to revert
    #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub count: u32,

    /// Print the migrations that would be reverted without running them
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Print the status report as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
