use atp_etl::config::Config;
use atp_etl::error::EtlError;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "atp-etl")]
#[command(about = "ATP Tour & Ergast F1 data ingestion pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load every resource once
    Run,
    /// Run incremental loader on an interval
    Incremental {
        /// Interval in seconds between runs (default: ETL_INTERVAL_SECONDS)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Reload ATP match files for a year range
    Backfill {
        /// First season (inclusive)
        #[arg(long)]
        year_from: i32,
        /// Last season (inclusive)
        #[arg(long)]
        year_to: i32,
        /// Number of parallel workers
        #[arg(long, default_value = "4")]
        workers: usize,
    },
    /// Check source and warehouse health
    Health,
    /// Print per-resource row counts and watermarks
    Report,
}

/// The CLI flag wins; otherwise the configured interval applies.
fn resolve_interval(flag: Option<u64>, config: &Config) -> u64 {
    flag.unwrap_or(config.etl.incremental_interval_seconds)
}

#[tokio::main]
async fn main() -> Result<(), EtlError> {
    dotenv::dotenv().ok();

    // Initialize logging - use try_init to avoid panics
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .try_init();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Run => {
            atp_etl::incremental::run_load(config).await?;
        }
        Commands::Incremental { interval } => {
            let interval = resolve_interval(interval, &config);
            atp_etl::incremental::run_incremental(config, interval).await?;
        }
        Commands::Backfill {
            year_from,
            year_to,
            workers,
        } => {
            atp_etl::backfill::run_backfill(config, year_from, year_to, workers).await?;
        }
        Commands::Health => {
            atp_etl::health::check_health(config).await?;
        }
        Commands::Report => {
            atp_etl::report::run_report(config).await?;
        }
    }

    Ok(())
}
