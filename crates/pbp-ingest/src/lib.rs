//! PBP Ingest Library
//!
//! Incremental ingestion of NHL play-by-play feeds into a document store.
//! One run walks a synthetic key space (season, regular-season
//! discriminator, zero-padded sequence number), fetches each game's live
//! feed, and writes three collections through size-bounded batches: the
//! unmodified raw payloads, one summary document per game, and one document
//! per play. Incremental mode skips games already stored, for a single
//! season at a time.
//!
//! # Example
//!
//! ```no_run
//! use pbp_ingest::store::MongoStore;
//! use pbp_ingest::{IngestConfig, IngestPipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = IngestConfig::default().with_seasons([2021]);
//!     let store = MongoStore::connect(&config.mongo_uri, &config.database).await?;
//!     let report = IngestPipeline::new(config, store)?.ingest(true).await?;
//!     println!("{} games ingested", report.ingested);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod client;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod store;

// Re-export commonly used types
pub use config::{CollectionNames, IngestConfig};
pub use error::{IngestError, Result};
pub use pipeline::{IngestPipeline, IngestReport};
