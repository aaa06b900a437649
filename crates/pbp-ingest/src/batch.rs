//! Size-bounded batching of store writes
//!
//! One append-only buffer per destination collection, flushed as a single
//! bulk insert once the configured threshold is reached and drained at end
//! of run. Buffers fill and flush independently of each other. A failed
//! flush is not retried; the error carries the collection name and aborts
//! the run.

use std::collections::HashMap;

use mongodb::bson::Document;

use crate::error::{IngestError, Result};
use crate::store::DocumentStore;

/// Per-collection write buffers in front of a [`DocumentStore`]
pub struct BatchWriter<'a, S: DocumentStore> {
    store: &'a S,
    flush_size: usize,
    buffers: HashMap<String, Vec<Document>>,
}

impl<'a, S: DocumentStore> BatchWriter<'a, S> {
    /// Create a writer with the given flush threshold, shared by every
    /// collection but applied per collection.
    pub fn new(store: &'a S, flush_size: usize) -> Self {
        Self {
            store,
            flush_size,
            buffers: HashMap::new(),
        }
    }

    /// Append one record to a collection's buffer.
    pub fn enqueue(&mut self, collection: &str, doc: Document) {
        self.buffers
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    /// Records currently buffered for a collection.
    pub fn buffered(&self, collection: &str) -> usize {
        self.buffers.get(collection).map_or(0, Vec::len)
    }

    /// Flush a collection's buffer if it has reached the threshold.
    pub async fn flush_if_full(&mut self, collection: &str) -> Result<()> {
        if self.buffered(collection) >= self.flush_size {
            self.flush(collection).await?;
        }
        Ok(())
    }

    /// Flush a collection's buffer regardless of size.
    pub async fn drain(&mut self, collection: &str) -> Result<()> {
        self.flush(collection).await
    }

    /// Flush every buffer; called once at end of run.
    pub async fn drain_all(&mut self) -> Result<()> {
        let collections: Vec<String> = self.buffers.keys().cloned().collect();
        for collection in collections {
            self.flush(&collection).await?;
        }
        Ok(())
    }

    async fn flush(&mut self, collection: &str) -> Result<()> {
        let Some(buffer) = self.buffers.get_mut(collection) else {
            return Ok(());
        };
        if buffer.is_empty() {
            return Ok(());
        }

        let batch = std::mem::take(buffer);
        self.store
            .insert_many(collection, batch)
            .await
            .map_err(|source| IngestError::store(collection, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use mongodb::bson::doc;

    async fn fill(writer: &mut BatchWriter<'_, MemoryStore>, collection: &str, count: i64) {
        for n in 0..count {
            writer.enqueue(collection, doc! {"n": n});
            writer.flush_if_full(collection).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_flush_count_is_ceil_of_records_over_batch() {
        let store = MemoryStore::new();
        let mut writer = BatchWriter::new(&store, 3);

        fill(&mut writer, "games", 7).await;
        writer.drain("games").await.unwrap();

        // ceil(7 / 3) = 3 insert calls summing to 7 records.
        assert_eq!(store.batch_sizes("games"), vec![3, 3, 1]);
        assert_eq!(store.documents("games").len(), 7);
    }

    #[tokio::test]
    async fn test_exact_multiple_leaves_nothing_to_drain() {
        let store = MemoryStore::new();
        let mut writer = BatchWriter::new(&store, 2);

        fill(&mut writer, "pbps", 4).await;
        assert_eq!(writer.buffered("pbps"), 0);

        // Draining an empty buffer issues no insert.
        writer.drain("pbps").await.unwrap();
        assert_eq!(store.batch_sizes("pbps"), vec![2, 2]);
    }

    #[tokio::test]
    async fn test_buffers_flush_independently() {
        let store = MemoryStore::new();
        let mut writer = BatchWriter::new(&store, 2);

        fill(&mut writer, "nhlfeed", 2).await;
        writer.enqueue("games", doc! {"n": 0});
        writer.flush_if_full("games").await.unwrap();

        // nhlfeed hit its threshold; games did not.
        assert_eq!(store.batch_sizes("nhlfeed"), vec![2]);
        assert!(store.batch_sizes("games").is_empty());
        assert_eq!(writer.buffered("games"), 1);

        writer.drain_all().await.unwrap();
        assert_eq!(store.batch_sizes("games"), vec![1]);
    }

    #[tokio::test]
    async fn test_drain_all_on_empty_writer() {
        let store = MemoryStore::new();
        let mut writer = BatchWriter::new(&store, 2);
        writer.drain_all().await.unwrap();
        assert!(store.batch_sizes("games").is_empty());
    }
}
