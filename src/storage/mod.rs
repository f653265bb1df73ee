//! Storage abstraction layer for documents.
//!
//! This module is the boundary to the document database. The [`DocumentStore`]
//! trait lists the primitives the ODM layer relies on (point and filtered finds
//! with optional projection, counts, inserts, replace-upserts, `$set`/`$unset`
//! updates, removal, validator installation) and treats the backend as a black
//! box. Connection handling, pooling and timeouts belong to the implementation.
//!
//! The storage layer is NOT responsible for:
//! - Schema validation
//! - Reference resolution
//! - Identifier generation
//!
//! # Example Usage
//!
//! ```rust
//! use document_odm::storage::{Database, Filter, InMemoryStore};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("app", InMemoryStore::new());
//! let groups = db.collection("groups");
//!
//! groups.insert(json!({"_id": "g1", "name": "admins"}).as_object().cloned().unwrap())?;
//! assert_eq!(groups.count(&Filter::by_id("g1"))?, 1);
//!
//! let found = groups.find_one(&Filter::by_id("g1"), None)?;
//! assert_eq!(found.and_then(|d| d.get("name").cloned()), Some(json!("admins")));
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;
pub mod query;


pub use errors::StorageError;
pub use in_memory::{InMemoryStore, InMemoryStoreStats};
pub use query::{Filter, Update};

use crate::document::{Document, Projection};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Counts reported by replace and update operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// Documents that matched the filter
    pub matched: usize,
    /// Whether a new document was inserted because nothing matched
    pub upserted: bool,
}

/// Primitives a document database must offer.
///
/// Every call is a blocking round trip that returns before control continues.
/// Implementations must be safe to share between threads.
pub trait DocumentStore: Send + Sync {
    /// Return the first document matching `filter`, restricted to `projection`
    /// (plus `_id`) when one is given.
    fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<Document>, StorageError>;

    /// Return every document matching `filter` in storage order.
    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Document>, StorageError>;

    /// Count the documents matching `filter`.
    fn count(&self, collection: &str, filter: &Filter) -> Result<usize, StorageError>;

    /// Insert a new document.
    ///
    /// Fails with [`StorageError::DuplicateKey`] when the `_id` is taken.
    fn insert(&self, collection: &str, document: Document) -> Result<(), StorageError>;

    /// Replace the first document matching `filter` wholesale, inserting it
    /// when nothing matches and `upsert` is set.
    fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
        upsert: bool,
    ) -> Result<UpdateOutcome, StorageError>;

    /// Apply a partial update to the first document matching `filter`.
    ///
    /// With `upsert`, a missing document is created from the filter's equality
    /// conditions with the update applied on top.
    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome, StorageError>;

    /// Remove up to `limit` matching documents (`0` removes all of them).
    /// Returns how many were removed.
    fn remove(&self, collection: &str, filter: &Filter, limit: usize)
    -> Result<usize, StorageError>;

    /// Install a server-side validator expression on a collection.
    fn install_validator(&self, collection: &str, validator: &Value) -> Result<(), StorageError>;
}

/// A named database backed by a shared store.
///
/// Cheap to clone; every clone talks to the same store.
#[derive(Clone)]
pub struct Database {
    name: String,
    store: Arc<dyn DocumentStore>,
}

impl Database {
    /// Create a database handle over a store.
    pub fn new(name: impl Into<String>, store: impl DocumentStore + 'static) -> Self {
        Self::from_shared(name, Arc::new(store))
    }

    /// Create a database handle over an already shared store.
    pub fn from_shared(name: impl Into<String>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handle to a collection in this database.
    pub fn collection(&self, name: impl Into<String>) -> Collection {
        Collection {
            name: name.into(),
            database: self.clone(),
        }
    }

    pub(crate) fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database").field("name", &self.name).finish()
    }
}

/// A collection inside a [`Database`].
#[derive(Clone, Debug)]
pub struct Collection {
    name: String,
    database: Database,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn find_one(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<Document>, StorageError> {
        self.database.store().find_one(&self.name, filter, projection)
    }

    pub fn find(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Document>, StorageError> {
        self.database.store().find(&self.name, filter, projection)
    }

    pub fn count(&self, filter: &Filter) -> Result<usize, StorageError> {
        self.database.store().count(&self.name, filter)
    }

    pub fn insert(&self, document: Document) -> Result<(), StorageError> {
        self.database.store().insert(&self.name, document)
    }

    pub fn replace_one(
        &self,
        filter: &Filter,
        document: Document,
        upsert: bool,
    ) -> Result<UpdateOutcome, StorageError> {
        self.database
            .store()
            .replace_one(&self.name, filter, document, upsert)
    }

    pub fn update_one(
        &self,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome, StorageError> {
        self.database
            .store()
            .update_one(&self.name, filter, update, upsert)
    }

    pub fn remove(&self, filter: &Filter, limit: usize) -> Result<usize, StorageError> {
        self.database.store().remove(&self.name, filter, limit)
    }

    pub fn install_validator(&self, validator: &Value) -> Result<(), StorageError> {
        self.database.store().install_validator(&self.name, validator)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database.name, self.name)
    }
}
