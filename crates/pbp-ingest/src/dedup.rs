//! Deduplication index for incremental runs
//!
//! A read-only snapshot of the game keys already present in the raw
//! collection, built once at run start. Keys ingested during the run are not
//! fed back in: each (season, sequence) pair is visited exactly once per
//! run, so a later re-collision is impossible by construction.

/// Sorted snapshot of previously ingested game keys
#[derive(Debug, Default)]
pub struct DedupIndex {
    keys: Vec<i64>,
}

impl DedupIndex {
    /// Sort and store the known keys.
    pub fn build(mut keys: Vec<i64>) -> Self {
        keys.sort_unstable();
        keys.dedup();
        Self { keys }
    }

    /// Direct membership test. Correct for any probe, including one below
    /// the smallest stored key.
    pub fn contains(&self, key: i64) -> bool {
        self.keys.binary_search(&key).is_ok()
    }

    /// Number of known keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no keys are known
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
