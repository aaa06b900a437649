//! PBP Ingest - NHL play-by-play ingestion tool

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pbp_common::logging::{init_logging, LogConfig, LogLevel};
use pbp_ingest::store::MongoStore;
use pbp_ingest::{IngestConfig, IngestPipeline};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pbp-ingest")]
#[command(author, version, about = "NHL play-by-play ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    target: StoreTarget,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct StoreTarget {
    /// MongoDB connection string
    #[arg(
        long,
        global = true,
        env = "MONGO_URI",
        default_value = "mongodb://localhost:27017"
    )]
    mongo_uri: String,

    /// Database holding the destination collections
    #[arg(long, global = true, default_value = "sports-ai")]
    database: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download game feeds into the raw, games, and play-by-play collections
    Ingest {
        /// First season to ingest (e.g. 2021)
        #[arg(long, default_value_t = 2021)]
        first_season: u32,

        /// Last season to ingest, inclusive; defaults to the first season
        #[arg(long)]
        last_season: Option<u32>,

        /// Skip games already stored (single season only)
        #[arg(long)]
        incremental: bool,

        /// Upper bound on game sequence numbers per season
        #[arg(long, default_value_t = 1500)]
        max_games: u32,

        /// Records buffered per collection before a bulk insert
        #[arg(long, default_value_t = 100)]
        batch_size: usize,
    },

    /// Log a small window of the games collection
    Sample,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    let log_config = LogConfig::new()
        .with_level(log_level)
        .with_file_prefix("pbp-ingest");

    // Environment variables take precedence when set
    let log_config = LogConfig::from_env().unwrap_or(log_config);
    init_logging(&log_config)?;

    match cli.command {
        Command::Ingest {
            first_season,
            last_season,
            incremental,
            max_games,
            batch_size,
        } => {
            let config = IngestConfig::default()
                .with_seasons(first_season..=last_season.unwrap_or(first_season))
                .with_max_games(max_games)
                .with_batch_size(batch_size)
                .with_mongo_target(&cli.target.mongo_uri, &cli.target.database);

            let store = MongoStore::connect(&config.mongo_uri, &config.database).await?;
            let pipeline = IngestPipeline::new(config, store)?;
            let report = pipeline.ingest(incremental).await?;

            info!(
                ingested = report.ingested,
                absent = report.absent,
                malformed = report.malformed,
                "ingestion finished"
            );
        }
        Command::Sample => {
            let config = IngestConfig::default()
                .with_mongo_target(&cli.target.mongo_uri, &cli.target.database);

            let store = MongoStore::connect(&config.mongo_uri, &config.database).await?;
            let pipeline = IngestPipeline::new(config, store)?;

            for doc in pipeline.sample().await? {
                info!(game = %doc, "sampled game");
            }
        }
    }

    Ok(())
}
