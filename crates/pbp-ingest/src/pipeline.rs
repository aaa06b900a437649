//! Ingestion orchestration
//!
//! Drives one run end to end: per season, enumerate the key space, classify
//! each fetch, dedup-check in incremental mode, parse and extract new final
//! games, and feed the three destination buffers; at end of run, drain the
//! buffers and create the unique `gamePk` indexes on the raw and games
//! collections. A store failure at any point aborts the run; everything
//! recoverable is counted and reported instead.

use mongodb::bson::{self, Document};
use tracing::{info, warn};

use crate::batch::BatchWriter;
use crate::client::{FetchOutcome, NhlApiClient};
use crate::config::IngestConfig;
use crate::dedup::DedupIndex;
use crate::error::{IngestError, Result};
use crate::extract::{extract_plays, extract_summary};
use crate::models::{self, GameFeed, FINAL_STATE, GAME_KEY_FIELD};
use crate::store::DocumentStore;

/// End-of-run counters, also logged as the run progresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Final games extracted and written this run
    pub ingested: usize,
    /// Keys the source reported as absent
    pub absent: usize,
    /// Fetched games not yet in a final state
    pub not_final: usize,
    /// Transport failures skipped, kept distinct from absence
    pub transient: usize,
    /// Records dropped for missing required fields
    pub malformed: usize,
    /// Keys skipped because the dedup snapshot already held them
    pub already_present: usize,
    /// Per-season ingested counts, in configured order
    pub per_season: Vec<(u32, usize)>,
}

/// Orchestrates one ingestion run against a [`DocumentStore`]
pub struct IngestPipeline<S: DocumentStore> {
    config: IngestConfig,
    client: NhlApiClient,
    store: S,
}

impl<S: DocumentStore> IngestPipeline<S> {
    /// Create a pipeline from an injected configuration and store.
    pub fn new(config: IngestConfig, store: S) -> Result<Self> {
        config.validate()?;
        let client = NhlApiClient::new(&config)?;
        Ok(Self {
            config,
            client,
            store,
        })
    }

    /// Run the ingestion.
    ///
    /// With `incremental` set, games already present in the raw collection
    /// are skipped; that requires exactly one configured season and is
    /// otherwise rejected before any fetch happens.
    pub async fn ingest(&self, incremental: bool) -> Result<IngestReport> {
        if incremental && self.config.seasons.len() != 1 {
            return Err(IngestError::IncrementalSeasonConflict(
                self.config.seasons.len(),
            ));
        }

        info!(
            seasons = ?self.config.seasons,
            incremental,
            "starting to download games and store them"
        );

        let dedup = if incremental {
            Some(self.build_dedup_index().await?)
        } else {
            None
        };

        let collections = self.config.collections.clone();
        let mut writer = BatchWriter::new(&self.store, self.config.batch_size);
        let mut report = IngestReport::default();

        for &season in &self.config.seasons {
            let mut season_count = 0usize;
            let mut enumerator = self
                .client
                .enumerate_season(season, self.config.max_games);

            while let Some(outcome) = enumerator.next_outcome().await {
                let doc = match outcome {
                    FetchOutcome::Fetched(doc) => doc,
                    FetchOutcome::NotFound => {
                        report.absent += 1;
                        continue;
                    }
                    FetchOutcome::Transient(reason) => {
                        warn!(season, %reason, "transient fetch failure, skipping key");
                        report.transient += 1;
                        continue;
                    }
                };

                // Only concluded games are ingestable; in-progress and future
                // games are discarded before any schema checks.
                match models::detailed_state(&doc) {
                    Some(FINAL_STATE) => {}
                    Some(_) => {
                        report.not_final += 1;
                        continue;
                    }
                    None => {
                        warn!(season, "fetched record has no detailed state, dropping");
                        report.malformed += 1;
                        continue;
                    }
                }

                let Some(game_pk) = models::game_pk(&doc) else {
                    warn!(season, "final record has no game key, dropping");
                    report.malformed += 1;
                    continue;
                };

                if let Some(index) = &dedup {
                    if index.contains(game_pk) {
                        report.already_present += 1;
                        continue;
                    }
                }

                let feed = match GameFeed::from_document(&doc, game_pk) {
                    Ok(feed) => feed,
                    Err(e) => {
                        warn!(season, game_pk, error = %e, "malformed final record dropped");
                        report.malformed += 1;
                        continue;
                    }
                };

                let summary = extract_summary(&feed);
                let plays = extract_plays(&feed);

                writer.enqueue(&collections.raw, doc);
                writer.flush_if_full(&collections.raw).await?;

                writer.enqueue(&collections.games, bson::to_document(&summary)?);
                writer.flush_if_full(&collections.games).await?;

                for play in &plays {
                    writer.enqueue(&collections.plays, bson::to_document(play)?);
                    writer.flush_if_full(&collections.plays).await?;
                }

                report.ingested += 1;
                season_count += 1;
            }

            info!(season, games = season_count, "season downloaded and stored");
            report.per_season.push((season, season_count));
        }

        writer.drain_all().await?;
        self.finalize_indexes().await?;

        info!(
            ingested = report.ingested,
            absent = report.absent,
            not_final = report.not_final,
            transient = report.transient,
            malformed = report.malformed,
            already_present = report.already_present,
            "ingestion run complete"
        );

        Ok(report)
    }

    /// Read-only diagnostic: a small window of the games collection.
    pub async fn sample(&self) -> Result<Vec<Document>> {
        let games = &self.config.collections.games;
        let docs = self
            .store
            .sample(games, 5, 8)
            .await
            .map_err(|source| IngestError::store(games, source))?;
        info!(collection = %games, returned = docs.len(), "sample query");
        Ok(docs)
    }

    async fn build_dedup_index(&self) -> Result<DedupIndex> {
        let raw = &self.config.collections.raw;
        let keys = self
            .store
            .int_field_values(raw, GAME_KEY_FIELD)
            .await
            .map_err(|source| IngestError::store(raw, source))?;
        let index = DedupIndex::build(keys);
        info!(known_games = index.len(), "dedup snapshot built from raw collection");
        Ok(index)
    }

    /// Uniqueness of the game key is enforced only after ingestion; during
    /// a run the dedup check before enqueue is what prevents duplicates.
    async fn finalize_indexes(&self) -> Result<()> {
        let collections = &self.config.collections;
        for collection in [&collections.raw, &collections.games] {
            self.store
                .create_unique_index(collection, GAME_KEY_FIELD)
                .await
                .map_err(|source| IngestError::store(collection.as_str(), source))?;
        }
        Ok(())
    }
}
