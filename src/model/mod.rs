//! Models: the binding of a name, a collection and a schema.
//!
//! A [`Model`] is created once through [`Odm::register`](crate::Odm::register)
//! and is immutable afterwards. Every [`Instance`](crate::Instance) holds a
//! shared handle to the model it was built for, and the model's schema is
//! authoritative for it.
//!
//! # Key Types
//!
//! - [`ModelName`] - Singular and plural name; the plural names the collection
//! - [`Model`] - A registered model
//! - [`ModelRegistry`] - Concurrency-safe lookup by name and by entity type
//! - [`Entity`] - Typed wrapper around an instance of one model

pub mod entity;
pub mod registry;

pub use entity::Entity;
pub use registry::{DuplicatePolicy, ModelRegistry};

use crate::document::Document;
use crate::error::ValidationResult;
use crate::schema::{FieldScope, ReferenceLookup, Schema};
use crate::storage::{Collection, Database};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// The singular and plural name of a model.
///
/// Lookups accept either form. The plural form is also the collection name.
///
/// # Examples
///
/// ```rust
/// use document_odm::model::ModelName;
///
/// let name = ModelName::from("group");
/// assert_eq!(name.plural(), "groups");
///
/// let name = ModelName::new("person", "people");
/// assert!(name.matches("people"));
/// assert!(name.matches("person"));
/// assert!(!name.matches("persons"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelName {
    singular: String,
    plural: String,
}

impl ModelName {
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
        }
    }

    pub fn singular(&self) -> &str {
        &self.singular
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    /// Whether `name` is either form of this name.
    pub fn matches(&self, name: &str) -> bool {
        self.singular == name || self.plural == name
    }

    /// Whether the two names share a form, so they cannot both be registered.
    pub fn overlaps(&self, other: &ModelName) -> bool {
        self.matches(&other.singular) || self.matches(&other.plural)
    }
}

impl From<&str> for ModelName {
    /// Plural is formed by appending `s`.
    fn from(singular: &str) -> Self {
        Self::new(singular, format!("{}s", singular))
    }
}

impl From<(&str, &str)> for ModelName {
    fn from((singular, plural): (&str, &str)) -> Self {
        Self::new(singular, plural)
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.singular)
    }
}

/// Static type registered as the instance type of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EntityType {
    pub(crate) id: TypeId,
    pub(crate) name: &'static str,
}

impl EntityType {
    pub(crate) fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

/// A registered model.
#[derive(Debug, Clone)]
pub struct Model {
    name: ModelName,
    collection: Collection,
    schema: Arc<Schema>,
    entity_type: Option<EntityType>,
}

impl Model {
    pub(crate) fn new(
        name: ModelName,
        schema: Schema,
        database: &Database,
        entity_type: Option<EntityType>,
    ) -> Self {
        let collection = database.collection(name.plural());
        Self {
            name,
            collection,
            schema: Arc::new(schema),
            entity_type,
        }
    }

    pub fn name(&self) -> &ModelName {
        &self.name
    }

    /// The collection instances of this model live in.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn database(&self) -> &Database {
        self.collection.database()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Name of the Rust type registered for this model, if any.
    pub fn entity_type_name(&self) -> Option<&'static str> {
        self.entity_type.map(|t| t.name)
    }

    pub(crate) fn entity_type(&self) -> Option<EntityType> {
        self.entity_type
    }

    /// Validate a document against this model's schema.
    pub fn validate(
        &self,
        document: &Document,
        scope: FieldScope<'_>,
        lookup: &dyn ReferenceLookup,
    ) -> ValidationResult<()> {
        self.schema.validate(document, scope, lookup)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.collection)
    }
}
