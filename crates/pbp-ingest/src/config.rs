//! Ingestion configuration
//!
//! Everything the pipeline needs is carried by [`IngestConfig`] and injected
//! through the constructor; nothing is read from process-wide state, so
//! tests can point a pipeline at a mock server and an in-memory store.

use crate::error::{IngestError, Result};

/// Regular-season game-type discriminator in the NHL's synthetic game key
/// (`<season>02<sequence>`).
pub const GAME_TYPE_REGULAR_SEASON: &str = "02";

/// Names of the three destination collections
#[derive(Debug, Clone)]
pub struct CollectionNames {
    /// Unmodified live-feed payloads
    pub raw: String,
    /// One summary document per game
    pub games: String,
    /// One document per play
    pub plays: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            raw: "nhlfeed".to_string(),
            games: "games".to_string(),
            plays: "pbps".to_string(),
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Seasons to enumerate, in run order
    pub seasons: Vec<u32>,

    /// Upper bound on per-season game sequence numbers; enumeration always
    /// runs to this bound because the sequence may be sparse
    pub max_games: u32,

    /// URL template half before the game key
    pub url_prefix: String,

    /// URL template half after the game key
    pub url_suffix: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Records buffered per collection before a bulk insert
    pub batch_size: usize,

    /// MongoDB connection string
    pub mongo_uri: String,

    /// Database holding the destination collections
    pub database: String,

    /// Destination collection names
    pub collections: CollectionNames,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            seasons: vec![2021],
            max_games: 1500,
            url_prefix: "http://statsapi.web.nhl.com/api/v1/game/".to_string(),
            url_suffix: "/feed/live/".to_string(),
            timeout_secs: 30,
            batch_size: 100,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            database: "sports-ai".to_string(),
            collections: CollectionNames::default(),
        }
    }
}

impl IngestConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the seasons to enumerate
    pub fn with_seasons(mut self, seasons: impl IntoIterator<Item = u32>) -> Self {
        self.seasons = seasons.into_iter().collect();
        self
    }

    /// Set the per-season sequence upper bound
    pub fn with_max_games(mut self, max_games: u32) -> Self {
        self.max_games = max_games;
        self
    }

    /// Set the URL template halves around the game key
    pub fn with_base_url(mut self, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self.url_suffix = suffix.into();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// Set the batch flush threshold
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set the store connection target
    pub fn with_mongo_target(
        mut self,
        uri: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        self.mongo_uri = uri.into();
        self.database = database.into();
        self
    }

    /// Validate the configuration before a run
    pub fn validate(&self) -> Result<()> {
        if self.seasons.is_empty() {
            return Err(IngestError::Config("no seasons configured".to_string()));
        }
        if self.max_games == 0 {
            return Err(IngestError::Config("max_games must be positive".to_string()));
        }
        if self.batch_size == 0 {
            return Err(IngestError::Config("batch_size must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.seasons, vec![2021]);
        assert_eq!(config.max_games, 1500);
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.collections.raw, "nhlfeed");
        assert_eq!(config.collections.games, "games");
        assert_eq!(config.collections.plays, "pbps");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = IngestConfig::new()
            .with_seasons(2019..=2021)
            .with_max_games(50)
            .with_batch_size(10)
            .with_timeout(5)
            .with_base_url("http://localhost:8080/game/", "/feed/")
            .with_mongo_target("mongodb://db:27017", "hockey");

        assert_eq!(config.seasons, vec![2019, 2020, 2021]);
        assert_eq!(config.max_games, 50);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.url_prefix, "http://localhost:8080/game/");
        assert_eq!(config.url_suffix, "/feed/");
        assert_eq!(config.database, "hockey");
    }

    #[test]
    fn test_validate_rejects_empty_seasons() {
        let config = IngestConfig::new().with_seasons([]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let config = IngestConfig::new().with_batch_size(0);
        assert!(config.validate().is_err());
    }
}
