//! Document-store seam
//!
//! The pipeline talks to its destination through [`DocumentStore`], keyed by
//! collection name: bulk inserts, the key listing that seeds the dedup
//! snapshot, post-run unique indexes, and a small sampling query.
//! [`MongoStore`] is the production backend; [`MemoryStore`] records every
//! insert batch and backs the test suite.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use futures::TryStreamExt;
use mongodb::bson::{Bson, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};
use thiserror::Error;

/// Errors surfaced by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Mongo(#[from] mongodb::error::Error),

    #[error("{0}")]
    Backend(String),
}

/// Store surface the ingestion pipeline needs
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    /// Bulk-insert one batch of documents into a collection.
    async fn insert_many(&self, collection: &str, docs: Vec<Document>) -> Result<(), StoreError>;

    /// List the integer values of one field across a collection.
    async fn int_field_values(&self, collection: &str, field: &str)
        -> Result<Vec<i64>, StoreError>;

    /// Create a unique ascending index on a field.
    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError>;

    /// Read a skip/limit window of a collection.
    async fn sample(
        &self,
        collection: &str,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Document>, StoreError>;
}

impl<S: DocumentStore> DocumentStore for &S {
    async fn insert_many(&self, collection: &str, docs: Vec<Document>) -> Result<(), StoreError> {
        (**self).insert_many(collection, docs).await
    }

    async fn int_field_values(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<Vec<i64>, StoreError> {
        (**self).int_field_values(collection, field).await
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        (**self).create_unique_index(collection, field).await
    }

    async fn sample(
        &self,
        collection: &str,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Document>, StoreError> {
        (**self).sample(collection, skip, limit).await
    }
}

fn int_value(bson: Option<&Bson>) -> Option<i64> {
    match bson? {
        Bson::Int32(v) => Some(i64::from(*v)),
        Bson::Int64(v) => Some(*v),
        _ => None,
    }
}

// ============================================================================
// MongoDB backend
// ============================================================================

/// MongoDB-backed document store
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect to a MongoDB deployment and select the database.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self {
            db: client.database(database),
        })
    }
}

impl DocumentStore for MongoStore {
    async fn insert_many(&self, collection: &str, docs: Vec<Document>) -> Result<(), StoreError> {
        self.db
            .collection::<Document>(collection)
            .insert_many(docs)
            .await?;
        Ok(())
    }

    async fn int_field_values(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<Vec<i64>, StoreError> {
        let mut projection = Document::new();
        projection.insert(field, 1);
        projection.insert("_id", 0);

        let mut cursor = self
            .db
            .collection::<Document>(collection)
            .find(Document::new())
            .projection(projection)
            .await?;

        let mut values = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            if let Some(value) = int_value(doc.get(field)) {
                values.push(value);
            }
        }
        Ok(values)
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        let mut keys = Document::new();
        keys.insert(field, 1);

        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.db
            .collection::<Document>(collection)
            .create_index(index)
            .await?;
        Ok(())
    }

    async fn sample(
        &self,
        collection: &str,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Document>, StoreError> {
        let mut cursor = self
            .db
            .collection::<Document>(collection)
            .find(Document::new())
            .skip(skip)
            .limit(limit)
            .await?;

        let mut docs = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            docs.push(doc);
        }
        Ok(docs)
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

#[derive(Debug, Default)]
struct MemoryCollection {
    documents: Vec<Document>,
    batch_sizes: Vec<usize>,
    unique_indexes: Vec<String>,
}

/// In-memory store that records every insert batch
///
/// Backs the test suite and dry runs; data lives only as long as the value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, MemoryCollection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, MemoryCollection>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All documents inserted into a collection, in insert order.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .get(collection)
            .map(|c| c.documents.clone())
            .unwrap_or_default()
    }

    /// The size of every insert batch a collection received, in call order.
    pub fn batch_sizes(&self, collection: &str) -> Vec<usize> {
        self.lock()
            .get(collection)
            .map(|c| c.batch_sizes.clone())
            .unwrap_or_default()
    }

    /// Fields a unique index was requested for on a collection.
    pub fn unique_indexes(&self, collection: &str) -> Vec<String> {
        self.lock()
            .get(collection)
            .map(|c| c.unique_indexes.clone())
            .unwrap_or_default()
    }
}

impl DocumentStore for MemoryStore {
    async fn insert_many(&self, collection: &str, docs: Vec<Document>) -> Result<(), StoreError> {
        if docs.is_empty() {
            return Err(StoreError::Backend("empty insert batch".to_string()));
        }
        let mut inner = self.lock();
        let entry = inner.entry(collection.to_string()).or_default();
        entry.batch_sizes.push(docs.len());
        entry.documents.extend(docs);
        Ok(())
    }

    async fn int_field_values(
        &self,
        collection: &str,
        field: &str,
    ) -> Result<Vec<i64>, StoreError> {
        Ok(self
            .lock()
            .get(collection)
            .map(|c| {
                c.documents
                    .iter()
                    .filter_map(|doc| int_value(doc.get(field)))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_unique_index(&self, collection: &str, field: &str) -> Result<(), StoreError> {
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .unique_indexes
            .push(field.to_string());
        Ok(())
    }

    async fn sample(
        &self,
        collection: &str,
        skip: u64,
        limit: i64,
    ) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .lock()
            .get(collection)
            .map(|c| {
                c.documents
                    .iter()
                    .skip(skip as usize)
                    .take(limit.max(0) as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn test_memory_store_records_batches() {
        let store = MemoryStore::new();
        store
            .insert_many("games", vec![doc! {"gamePk": 1i64}, doc! {"gamePk": 2i64}])
            .await
            .unwrap();
        store
            .insert_many("games", vec![doc! {"gamePk": 3i64}])
            .await
            .unwrap();

        assert_eq!(store.batch_sizes("games"), vec![2, 1]);
        assert_eq!(store.documents("games").len(), 3);
        assert_eq!(
            store.int_field_values("games", "gamePk").await.unwrap(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_memory_store_sample_window() {
        let store = MemoryStore::new();
        let docs: Vec<Document> = (0..10i64).map(|n| doc! {"gamePk": n}).collect();
        store.insert_many("games", docs).await.unwrap();

        let window = store.sample("games", 5, 3).await.unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].get_i64("gamePk").unwrap(), 5);
    }

    #[tokio::test]
    async fn test_memory_store_unique_indexes() {
        let store = MemoryStore::new();
        store.create_unique_index("nhlfeed", "gamePk").await.unwrap();
        assert_eq!(store.unique_indexes("nhlfeed"), vec!["gamePk".to_string()]);
        assert!(store.unique_indexes("games").is_empty());
    }

    #[test]
    fn test_int_value_widths() {
        assert_eq!(int_value(Some(&Bson::Int32(4))), Some(4));
        assert_eq!(int_value(Some(&Bson::Int64(2021020001))), Some(2021020001));
        assert_eq!(int_value(Some(&Bson::String("4".to_string()))), None);
        assert_eq!(int_value(None), None);
    }
}
