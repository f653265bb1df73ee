//! In-memory document store.
//!
//! This module provides a thread-safe in-memory implementation of the
//! [`DocumentStore`] trait using a `HashMap` of collections behind a `RwLock`.
//! It is designed for testing, development, and embedding where persistence is
//! not required.
//!
//! # Features
//!
//! * Thread-safe shared access; clones share the same data
//! * Insertion-ordered collections
//! * Projection applied on read, `$set`/`$unset` updates, upserts
//! * Installed validators are recorded and can be inspected, but not enforced
//!
//! # Performance Characteristics
//!
//! * INSERT: O(n) for the duplicate `_id` check
//! * FIND/COUNT/UPDATE/REMOVE: O(n) scan of the collection
//!
//! # Example Usage
//!
//! ```rust
//! use document_odm::storage::{DocumentStore, Filter, InMemoryStore, Update};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryStore::new();
//! let doc = json!({"_id": "u1", "username": "bert"}).as_object().cloned().unwrap();
//! store.insert("users", doc)?;
//!
//! let update = Update::new().set("username", json!("henk"));
//! store.update_one("users", &Filter::by_id("u1"), &update, false)?;
//!
//! let found = store.find_one("users", &Filter::by_id("u1"), None)?.unwrap();
//! assert_eq!(found["username"], json!("henk"));
//! # Ok(())
//! # }
//! ```

use crate::document::{Document, ID_FIELD, Projection};
use crate::storage::{DocumentStore, Filter, StorageError, Update, UpdateOutcome};
use log::trace;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Collections = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory document store.
///
/// Structure: `collection` → documents in insertion order.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<Collections>>,
    validators: Arc<RwLock<HashMap<String, Value>>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get storage statistics for debugging and monitoring.
    pub fn stats(&self) -> Result<InMemoryStoreStats, StorageError> {
        let data = self.read()?;
        Ok(InMemoryStoreStats {
            collection_count: data.values().filter(|docs| !docs.is_empty()).count(),
            total_documents: data.values().map(Vec::len).sum(),
        })
    }

    /// Clear all data (useful for testing).
    pub fn clear(&self) -> Result<(), StorageError> {
        self.write()?.clear();
        Ok(())
    }

    /// Names of the collections that hold at least one document, sorted.
    pub fn list_collections(&self) -> Result<Vec<String>, StorageError> {
        let data = self.read()?;
        let mut names: Vec<String> = data
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    /// The validator expression installed on a collection, if any.
    pub fn validator(&self, collection: &str) -> Result<Option<Value>, StorageError> {
        let validators = self
            .validators
            .read()
            .map_err(|_| StorageError::internal("validator lock poisoned"))?;
        Ok(validators.get(collection).cloned())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, StorageError> {
        self.data
            .read()
            .map_err(|_| StorageError::internal("storage lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, StorageError> {
        self.data
            .write()
            .map_err(|_| StorageError::internal("storage lock poisoned"))
    }

    fn project(document: &Document, projection: Option<&Projection>) -> Document {
        match projection {
            Some(projection) => projection.apply(document),
            None => document.clone(),
        }
    }
}

impl DocumentStore for InMemoryStore {
    fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<Document>, StorageError> {
        let data = self.read()?;
        let found = data
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)))
            .map(|doc| Self::project(doc, projection));

        trace!(
            "find_one in '{}' matched: {}",
            collection,
            found.is_some()
        );
        Ok(found)
    }

    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Document>, StorageError> {
        let data = self.read()?;
        let found = data
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(doc))
                    .map(|doc| Self::project(doc, projection))
                    .collect()
            })
            .unwrap_or_default();

        Ok(found)
    }

    fn count(&self, collection: &str, filter: &Filter) -> Result<usize, StorageError> {
        let data = self.read()?;
        let count = data
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).count())
            .unwrap_or(0);

        Ok(count)
    }

    fn insert(&self, collection: &str, document: Document) -> Result<(), StorageError> {
        let mut data = self.write()?;
        let docs = data.entry(collection.to_string()).or_default();

        if let Some(id) = document.get(ID_FIELD) {
            if docs.iter().any(|doc| doc.get(ID_FIELD) == Some(id)) {
                return Err(StorageError::duplicate_key(collection, id));
            }
        }

        docs.push(document);
        Ok(())
    }

    fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
        upsert: bool,
    ) -> Result<UpdateOutcome, StorageError> {
        let mut data = self.write()?;
        let docs = data.entry(collection.to_string()).or_default();

        if let Some(existing) = docs.iter_mut().find(|doc| filter.matches(doc)) {
            // The stored identifier survives a replacement
            let mut replacement = document;
            if let Some(id) = existing.get(ID_FIELD) {
                replacement.insert(ID_FIELD.to_string(), id.clone());
            }
            *existing = replacement;
            return Ok(UpdateOutcome {
                matched: 1,
                upserted: false,
            });
        }

        if !upsert {
            return Ok(UpdateOutcome::default());
        }

        let mut inserted = filter.to_seed_document();
        inserted.extend(document);
        docs.push(inserted);
        Ok(UpdateOutcome {
            matched: 0,
            upserted: true,
        })
    }

    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome, StorageError> {
        if update
            .set_fields()
            .keys()
            .chain(update.unset_fields())
            .any(|path| path == ID_FIELD)
        {
            return Err(StorageError::invalid_data("the _id field cannot be updated"));
        }

        let mut data = self.write()?;
        let docs = data.entry(collection.to_string()).or_default();

        if let Some(existing) = docs.iter_mut().find(|doc| filter.matches(doc)) {
            update.apply(existing);
            return Ok(UpdateOutcome {
                matched: 1,
                upserted: false,
            });
        }

        if !upsert {
            return Ok(UpdateOutcome::default());
        }

        let mut inserted = filter.to_seed_document();
        update.apply(&mut inserted);
        docs.push(inserted);
        Ok(UpdateOutcome {
            matched: 0,
            upserted: true,
        })
    }

    fn remove(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<usize, StorageError> {
        let mut data = self.write()?;
        let Some(docs) = data.get_mut(collection) else {
            return Ok(0);
        };

        let mut removed = 0;
        docs.retain(|doc| {
            if (limit == 0 || removed < limit) && filter.matches(doc) {
                removed += 1;
                false
            } else {
                true
            }
        });

        Ok(removed)
    }

    fn install_validator(&self, collection: &str, validator: &Value) -> Result<(), StorageError> {
        let mut validators = self
            .validators
            .write()
            .map_err(|_| StorageError::internal("validator lock poisoned"))?;
        validators.insert(collection.to_string(), validator.clone());
        Ok(())
    }
}

/// Statistics about the current state of in-memory storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryStoreStats {
    /// Number of collections with data
    pub collection_count: usize,
    /// Total number of documents
    pub total_documents: usize,
}
