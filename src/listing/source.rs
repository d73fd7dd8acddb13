//! # Record Sources
//!
//! The storage collaborator behind list queries. A source orders a named
//! collection by one of its indexed fields and reports collection sizes.
//! Ordering by a field without an index is refused with
//! [`StorageError::UnsortableField`] rather than falling back to a full sort.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::ops::Range;
use std::pin::Pin;
use std::sync::RwLock;

use serde_json::Value;

use super::errors::{StorageError, StorageResult};
use super::sorter::{RecordSorter, SortSpec};

/// Boxed future returned by record sources
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = StorageResult<T>> + Send + 'a>>;

/// Storage collaborator for list queries
pub trait RecordSource: Send + Sync {
    /// Fetch a collection ordered by `order`.
    ///
    /// With a `window`, only that slice of the ordered sequence is returned;
    /// out-of-range windows yield fewer (or zero) records.
    fn fetch_ordered<'a>(
        &'a self,
        collection: &'a str,
        order: &'a SortSpec,
        window: Option<Range<usize>>,
    ) -> StorageFuture<'a, Vec<Value>>;

    /// Total number of records in a collection
    fn count<'a>(&'a self, collection: &'a str) -> StorageFuture<'a, usize>;
}

#[derive(Debug, Default)]
struct Collection {
    primary_key: String,
    indexes: HashSet<String>,
    records: Vec<Value>,
}

/// In-memory record store with per-collection sort indexes
#[derive(Debug, Default)]
pub struct InMemoryRecordSource {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) a collection. The primary key is always sortable.
    pub fn create_collection(&self, name: &str, primary_key: &str, indexes: &[&str]) {
        let mut index_set: HashSet<String> = indexes.iter().map(|s| s.to_string()).collect();
        index_set.insert(primary_key.to_string());

        if let Ok(mut collections) = self.collections.write() {
            collections.insert(
                name.to_string(),
                Collection {
                    primary_key: primary_key.to_string(),
                    indexes: index_set,
                    records: Vec::new(),
                },
            );
        }
    }

    /// Builder-style variant of [`create_collection`](Self::create_collection)
    pub fn with_collection(self, name: &str, primary_key: &str, indexes: &[&str]) -> Self {
        self.create_collection(name, primary_key, indexes);
        self
    }

    /// Insert a record; its primary key must be a string or number and unique.
    pub fn insert(&self, collection: &str, record: Value) -> StorageResult<String> {
        let mut collections = self.write()?;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| StorageError::CollectionNotFound(collection.to_string()))?;

        let key = key_of(&record, &coll.primary_key).ok_or_else(|| {
            StorageError::InvalidRecord(format!("missing primary key '{}'", coll.primary_key))
        })?;

        if coll
            .records
            .iter()
            .any(|r| key_of(r, &coll.primary_key).as_deref() == Some(key.as_str()))
        {
            return Err(StorageError::DuplicateKey {
                collection: collection.to_string(),
                key,
            });
        }

        coll.records.push(record);
        Ok(key)
    }

    /// Insert or replace by primary key
    pub fn upsert(&self, collection: &str, record: Value) -> StorageResult<String> {
        let mut collections = self.write()?;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| StorageError::CollectionNotFound(collection.to_string()))?;

        let key = key_of(&record, &coll.primary_key).ok_or_else(|| {
            StorageError::InvalidRecord(format!("missing primary key '{}'", coll.primary_key))
        })?;

        let pk = coll.primary_key.clone();
        match coll
            .records
            .iter_mut()
            .find(|r| key_of(r, &pk).as_deref() == Some(key.as_str()))
        {
            Some(existing) => *existing = record,
            None => coll.records.push(record),
        }
        Ok(key)
    }

    /// Look up one record by primary key
    pub fn get(&self, collection: &str, key: &str) -> StorageResult<Option<Value>> {
        let collections = self.read()?;
        let coll = collections
            .get(collection)
            .ok_or_else(|| StorageError::CollectionNotFound(collection.to_string()))?;

        Ok(coll
            .records
            .iter()
            .find(|r| key_of(r, &coll.primary_key).as_deref() == Some(key))
            .cloned())
    }

    /// Every record of a collection for which `keep` holds, in insertion order
    pub fn scan<F>(&self, collection: &str, keep: F) -> StorageResult<Vec<Value>>
    where
        F: Fn(&Value) -> bool,
    {
        let collections = self.read()?;
        let coll = collections
            .get(collection)
            .ok_or_else(|| StorageError::CollectionNotFound(collection.to_string()))?;

        Ok(coll.records.iter().filter(|r| keep(r)).cloned().collect())
    }

    /// Delete one record by primary key, returning it if it existed
    pub fn delete(&self, collection: &str, key: &str) -> StorageResult<Option<Value>> {
        let mut collections = self.write()?;
        let coll = collections
            .get_mut(collection)
            .ok_or_else(|| StorageError::CollectionNotFound(collection.to_string()))?;

        let pk = coll.primary_key.clone();
        let position = coll
            .records
            .iter()
            .position(|r| key_of(r, &pk).as_deref() == Some(key));

        Ok(position.map(|i| coll.records.remove(i)))
    }

    fn fetch_ordered_sync(
        &self,
        collection: &str,
        order: &SortSpec,
        window: Option<Range<usize>>,
    ) -> StorageResult<Vec<Value>> {
        let collections = self.read()?;
        let coll = collections
            .get(collection)
            .ok_or_else(|| StorageError::CollectionNotFound(collection.to_string()))?;

        if !coll.indexes.contains(&order.field) {
            return Err(StorageError::UnsortableField(order.field.clone()));
        }

        let mut records = coll.records.clone();
        RecordSorter::sort(&mut records, order);

        Ok(match window {
            Some(range) => records
                .into_iter()
                .skip(range.start)
                .take(range.end.saturating_sub(range.start))
                .collect(),
            None => records,
        })
    }

    fn count_sync(&self, collection: &str) -> StorageResult<usize> {
        let collections = self.read()?;
        collections
            .get(collection)
            .map(|c| c.records.len())
            .ok_or_else(|| StorageError::CollectionNotFound(collection.to_string()))
    }

    fn read(
        &self,
    ) -> StorageResult<std::sync::RwLockReadGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .read()
            .map_err(|_| StorageError::Unavailable("Lock poisoned".to_string()))
    }

    fn write(
        &self,
    ) -> StorageResult<std::sync::RwLockWriteGuard<'_, HashMap<String, Collection>>> {
        self.collections
            .write()
            .map_err(|_| StorageError::Unavailable("Lock poisoned".to_string()))
    }
}

impl RecordSource for InMemoryRecordSource {
    fn fetch_ordered<'a>(
        &'a self,
        collection: &'a str,
        order: &'a SortSpec,
        window: Option<Range<usize>>,
    ) -> StorageFuture<'a, Vec<Value>> {
        let result = self.fetch_ordered_sync(collection, order, window);
        Box::pin(std::future::ready(result))
    }

    fn count<'a>(&'a self, collection: &'a str) -> StorageFuture<'a, usize> {
        let result = self.count_sync(collection);
        Box::pin(std::future::ready(result))
    }
}

/// Primary key value as a string
fn key_of(record: &Value, primary_key: &str) -> Option<String> {
    match record.get(primary_key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> InMemoryRecordSource {
        let source = InMemoryRecordSource::new().with_collection("tasks", "id", &["time"]);
        for (id, time) in [("a", 3), ("b", 1), ("c", 2)] {
            source.insert("tasks", json!({"id": id, "time": time})).unwrap();
        }
        source
    }

    #[tokio::test]
    async fn test_fetch_ordered_with_window() {
        let source = source();
        let order = SortSpec::desc("time");

        let page = source.fetch_ordered("tasks", &order, Some(1..3)).await.unwrap();
        let ids: Vec<_> = page.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["c", "b"]);

        let beyond = source.fetch_ordered("tasks", &order, Some(10..12)).await.unwrap();
        assert!(beyond.is_empty());
    }

    #[tokio::test]
    async fn test_unindexed_field_is_unsortable() {
        let source = source();
        let err = source
            .fetch_ordered("tasks", &SortSpec::asc("status"), None)
            .await
            .unwrap_err();
        assert_eq!(err, StorageError::UnsortableField("status".to_string()));
    }

    #[tokio::test]
    async fn test_count_and_missing_collection() {
        let source = source();
        assert_eq!(source.count("tasks").await.unwrap(), 3);
        assert!(matches!(
            source.count("nope").await,
            Err(StorageError::CollectionNotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let source = source();
        let err = source.insert("tasks", json!({"id": "a", "time": 9})).unwrap_err();
        assert!(matches!(err, StorageError::DuplicateKey { .. }));
    }

    #[test]
    fn test_get_upsert_delete() {
        let source = source();
        source.upsert("tasks", json!({"id": "a", "time": 10})).unwrap();
        assert_eq!(source.get("tasks", "a").unwrap().unwrap()["time"], 10);

        assert!(source.delete("tasks", "a").unwrap().is_some());
        assert!(source.get("tasks", "a").unwrap().is_none());
        assert!(source.delete("tasks", "a").unwrap().is_none());
    }

    #[test]
    fn test_scan_filters_in_insertion_order() {
        let source = source();
        let late = source
            .scan("tasks", |r| r["time"].as_i64().unwrap_or(0) >= 2)
            .unwrap();
        let ids: Vec<_> = late.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        assert!(source.scan("missing", |_| true).is_err());
    }
}
