//! Rankr Import - bulk user import tool

use anyhow::{Context, Result};
use clap::Parser;
use rankr_common::logging::{init_logging, LogConfig, LogLevel};
use rankr_import::{
    DefaultValidator, ImportOptions, InMemoryUserRepository, PgUserRepository, UserRepository,
    UserService,
};
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "rankr-import")]
#[command(author, version, about = "Rankr user import tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Import users from a JSON file (array or concatenated objects)
    Import {
        /// Input file
        #[arg(short, long)]
        file: PathBuf,

        /// Import into memory only; nothing is written to the database
        #[arg(long)]
        dry_run: bool,

        /// Concurrent workers (1-10)
        #[arg(long, env = "IMPORT_MAX_WORKERS", default_value_t = 10)]
        max_workers: i64,

        /// Decoded records buffered ahead of the workers
        #[arg(long, env = "IMPORT_QUEUE_SIZE", default_value_t = 200)]
        queue_size: i64,
    },

    /// Print one stored user as JSON
    Get {
        /// User id
        #[arg(long)]
        id: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("rankr-import")
        .build()
        .merge_env()
        .context("Invalid logging configuration")?;

    let _log_guard = init_logging(&log_config)?;

    match cli.command {
        Command::Import {
            file,
            dry_run,
            max_workers,
            queue_size,
        } => {
            let repository: Arc<dyn UserRepository> = if dry_run {
                info!("Dry run: importing into memory");
                Arc::new(InMemoryUserRepository::new())
            } else {
                Arc::new(connect(cli.database_url.as_deref()).await?)
            };

            let options = ImportOptions::from_env()
                .with_max_workers(max_workers)
                .with_queue_size(queue_size);
            let service = UserService::new(repository, Arc::new(DefaultValidator::new()), options);

            let cancel = CancellationToken::new();
            tokio::spawn({
                let cancel = cancel.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupt received, cancelling import");
                        cancel.cancel();
                    }
                }
            });

            let outcome = service.import_file(&cancel, &file).await;
            println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
            outcome
                .into_result()
                .with_context(|| format!("Import of {} failed", file.display()))?;
            info!("Import complete");
        },
        Command::Get { id } => {
            let repository = connect(cli.database_url.as_deref()).await?;
            let service = UserService::new(
                Arc::new(repository),
                Arc::new(DefaultValidator::new()),
                ImportOptions::default(),
            );
            let response = service.get_user(id).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        },
    }

    Ok(())
}

async fn connect(database_url: Option<&str>) -> Result<PgUserRepository> {
    let url = database_url.context("DATABASE_URL is required unless --dry-run is set")?;
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("Failed to connect to database")?;
    Ok(PgUserRepository::new(pool))
}
