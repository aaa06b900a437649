//! Error types for the ingestion core

use thiserror::Error;

use crate::store::StoreError;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Errors raised by the ingestion pipeline
///
/// `MalformedRecord` is recovered locally (the record is dropped and
/// counted); everything else aborts the run and surfaces to the caller.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Incremental mode skips games already stored for one season; with
    /// several seasons configured "already ingested" would be ambiguous.
    #[error("incremental mode requires exactly one configured season, got {0}")]
    IncrementalSeasonConflict(usize),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed final record for game {game_pk}: {reason}")]
    MalformedRecord { game_pk: i64, reason: String },

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bson encoding failed: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),

    #[error("store write failed for collection '{collection}'")]
    Store {
        collection: String,
        #[source]
        source: StoreError,
    },
}

impl IngestError {
    /// Attach collection context to a store failure.
    pub(crate) fn store(collection: impl Into<String>, source: StoreError) -> Self {
        IngestError::Store {
            collection: collection.into(),
            source,
        }
    }
}
