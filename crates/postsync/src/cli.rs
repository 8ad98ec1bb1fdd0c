//! CLI argument parsing with clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// postsync - enrich pending posts from a remote API and quarantine failures
#[derive(Parser, Debug)]
#[command(name = "postsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Path to a JSON config file
    #[arg(short, long, env = "POSTSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database path (overrides the config file)
    #[arg(long, env = "POSTSYNC_DATABASE", global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one reconciliation pass over all pending posts
    Run(RunArgs),

    /// Insert pending posts for an id range
    Seed(SeedArgs),

    /// List posts waiting in the reprocessing queue
    Quarantine,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Base URL of the post resource (overrides the config file)
    #[arg(long)]
    pub base_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct SeedArgs {
    /// First id to insert
    #[arg(long, default_value_t = 1)]
    pub from: i64,

    /// Last id to insert (inclusive)
    #[arg(long)]
    pub to: i64,
}
