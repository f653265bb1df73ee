//! Common fixtures for the integration tests.

use document_odm::document::{Document, Projection};
use document_odm::schema::{FieldRequirement, Schema};
use document_odm::storage::{
    Database, DocumentStore, Filter, InMemoryStore, StorageError, Update, UpdateOutcome,
};
use document_odm::{Instance, Odm};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub mod fixtures;

/// An ODM with `group` and `user` models over a fresh in-memory store.
pub struct TestContext {
    pub odm: Odm,
    pub store: InMemoryStore,
    pub db: Database,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_odm(Odm::new())
    }

    pub fn with_odm(odm: Odm) -> Self {
        let store = InMemoryStore::new();
        let db = Database::new("app", store.clone());
        odm.register("group", group_schema(), &db).unwrap();
        odm.register("user", user_schema(), &db).unwrap();
        Self { odm, store, db }
    }

    /// Write a document straight into the store, bypassing the ODM.
    pub fn seed(&self, collection: &str, value: Value) {
        self.store.insert(collection, doc(value)).unwrap();
    }

    /// The document as currently stored.
    pub fn stored(&self, collection: &str, id: Value) -> Option<Document> {
        self.store
            .find_one(collection, &Filter::by_id(id), None)
            .unwrap()
    }

    pub fn group(&self, name: &str) -> Instance {
        let mut group = Instance::new(&self.odm, "group", json!({"name": name})).unwrap();
        group.store().unwrap();
        group
    }
}

pub fn group_schema() -> Schema {
    Schema::new().required("name", FieldRequirement::NonEmptyString)
}

pub fn user_schema() -> Schema {
    Schema::new()
        .required("username", FieldRequirement::NonEmptyString)
        .optional("age", FieldRequirement::Number)
        .required("group", FieldRequirement::reference("group"))
        .optional(
            "address",
            FieldRequirement::object(
                Schema::new()
                    .required("city", FieldRequirement::String)
                    .optional("street", FieldRequirement::String),
            ),
        )
        .optional("tags", FieldRequirement::array_of(FieldRequirement::String))
}

pub fn doc(value: Value) -> Document {
    value.as_object().cloned().expect("fixture is a document")
}

/// Store wrapper whose writes fail while `failing` is set.
#[derive(Clone)]
pub struct FlakyStore {
    inner: InMemoryStore,
    failing: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::unavailable("store is offline"))
        } else {
            Ok(())
        }
    }
}

impl DocumentStore for FlakyStore {
    fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Option<Document>, StorageError> {
        self.inner.find_one(collection, filter, projection)
    }

    fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Document>, StorageError> {
        self.inner.find(collection, filter, projection)
    }

    fn count(&self, collection: &str, filter: &Filter) -> Result<usize, StorageError> {
        self.inner.count(collection, filter)
    }

    fn insert(&self, collection: &str, document: Document) -> Result<(), StorageError> {
        self.check()?;
        self.inner.insert(collection, document)
    }

    fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        document: Document,
        upsert: bool,
    ) -> Result<UpdateOutcome, StorageError> {
        self.check()?;
        self.inner.replace_one(collection, filter, document, upsert)
    }

    fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        upsert: bool,
    ) -> Result<UpdateOutcome, StorageError> {
        self.check()?;
        self.inner.update_one(collection, filter, update, upsert)
    }

    fn remove(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<usize, StorageError> {
        self.check()?;
        self.inner.remove(collection, filter, limit)
    }

    fn install_validator(&self, collection: &str, validator: &Value) -> Result<(), StorageError> {
        self.check()?;
        self.inner.install_validator(collection, validator)
    }
}
