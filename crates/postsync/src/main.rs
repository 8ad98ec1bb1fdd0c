//! postsync command-line entry point.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use postsync::config::{load_config, validate_config, Config};
use postsync::db::{default_database_path, post_repo, Database};
use postsync::error::ConfigError;
use postsync::{HttpRemote, Reconciler, SqliteStore};

use cli::{Cli, Commands, LogFormat, SeedArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose, cli.log_format) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting postsync v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Installs the tracing subscriber and routes `log` records into it.
/// `RUST_LOG` takes precedence over `-v`.
fn init_tracing(
    verbose: u8,
    format: LogFormat,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().with_target(false)))?
        }
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))?
        }
    }

    tracing_log::LogTracer::init()?;
    Ok(())
}

async fn run(cli: Cli) -> postsync::Result<()> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    if let Some(path) = cli.database {
        config.database.path = Some(path);
    }
    if let Commands::Run(args) = &cli.command {
        if let Some(base_url) = &args.base_url {
            config.remote.base_url = base_url.clone();
        }
    }
    validate_config(&config)?;

    let db_path = config
        .database
        .path
        .clone()
        .or_else(default_database_path)
        .ok_or(ConfigError::NoDatabasePath)?;
    let db = Database::open(&db_path)?;

    match cli.command {
        Commands::Run(_) => {
            let remote = HttpRemote::new(&config.remote)?;
            let reconciler = Reconciler::from_config(SqliteStore::new(db), remote, &config.retry);
            reconciler.process_pending().await?;
        }
        Commands::Seed(args) => seed(&db, &args)?,
        Commands::Quarantine => {
            let entries = post_repo::find_pending_reprocessing(&db)?;
            if entries.is_empty() {
                println!("Reprocessing queue is empty");
            }
            for entry in entries {
                println!(
                    "post {:>6}  failed at {}",
                    entry.failed_record_id, entry.attempted_at
                );
            }
        }
    }

    Ok(())
}

fn seed(db: &Database, args: &SeedArgs) -> postsync::Result<()> {
    if args.from > args.to {
        return Err(ConfigError::Validation {
            message: format!("--from ({}) must not exceed --to ({})", args.from, args.to),
        }
        .into());
    }

    let mut inserted = 0;
    for id in args.from..=args.to {
        if post_repo::insert(db, &post_repo::PostRow::pending(id))? {
            inserted += 1;
        }
    }

    info!(
        "Seeded {} pending posts ({} already present)",
        inserted,
        (args.to - args.from + 1) - inserted
    );
    Ok(())
}
