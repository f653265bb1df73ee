//! References between documents.
//!
//! A [`DbRef`] points at one document by collection name and identifier, with an
//! optional database name. Its stored form is the sub-document
//! `{"$ref": <collection>, "$id": <identifier>}` plus `"$db"` when the database is
//! known. A reference never implies that its target exists: resolving it runs a
//! fresh point query every time and reports a missing target as `None`.
//!
//! # Examples
//!
//! ```rust
//! use document_odm::DbRef;
//! use serde_json::json;
//!
//! let reference = DbRef::new("groups", json!(42));
//! assert_eq!(reference.to_value(), json!({"$ref": "groups", "$id": 42}));
//!
//! let parsed = DbRef::from_value(&json!({"$ref": "groups", "$id": 42})).unwrap();
//! assert_eq!(parsed, reference);
//! assert!(DbRef::from_value(&json!({"$ref": "groups"})).is_none());
//! ```

use crate::document::{Document, ID_FIELD, Projection};
use crate::error::{OdmError, OdmResult};
use crate::instance::{Instance, LoadState};
use crate::model::Model;
use crate::odm::Odm;
use crate::storage::{Collection, Filter};
use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub(crate) const REF_KEY: &str = "$ref";
pub(crate) const ID_KEY: &str = "$id";
pub(crate) const DB_KEY: &str = "$db";

/// Pointer to a document in some collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbRef {
    #[serde(rename = "$ref")]
    collection: String,
    #[serde(rename = "$id")]
    id: Value,
    #[serde(rename = "$db", default, skip_serializing_if = "Option::is_none")]
    database: Option<String>,
}

impl DbRef {
    pub fn new(collection: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            database: None,
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Reference to a stored instance, in its model's collection and database.
    ///
    /// # Errors
    ///
    /// [`OdmError::MissingIdentifier`] if the instance has no `_id` yet.
    pub fn for_instance(instance: &Instance) -> OdmResult<Self> {
        let id = instance
            .identifier()
            .cloned()
            .ok_or(OdmError::MissingIdentifier)?;
        let collection = instance.model().collection();

        Ok(Self::new(collection.name(), id).with_database(collection.database().name()))
    }

    /// Parse a stored reference payload. Returns `None` unless `$ref` is a
    /// string, `$id` is present and non-null, and `$db` (if present) is a string.
    pub fn from_document(document: &Document) -> Option<Self> {
        let collection = document.get(REF_KEY)?.as_str()?;
        let id = document.get(ID_KEY).filter(|id| !id.is_null())?;
        let database = match document.get(DB_KEY) {
            None => None,
            Some(Value::String(db)) => Some(db.clone()),
            Some(_) => return None,
        };

        Some(Self {
            collection: collection.to_string(),
            id: id.clone(),
            database,
        })
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        Self::from_document(value.as_object()?)
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// The referenced identifier value.
    pub fn id(&self) -> &Value {
        &self.id
    }

    /// Whether this reference points into `collection`. A `$db`, when present,
    /// must name the database the collection lives in.
    pub fn targets(&self, collection: &Collection) -> bool {
        self.collection == collection.name()
            && self
                .database
                .as_deref()
                .is_none_or(|db| db == collection.database().name())
    }

    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert(REF_KEY.to_string(), Value::String(self.collection.clone()));
        document.insert(ID_KEY.to_string(), self.id.clone());
        if let Some(database) = &self.database {
            document.insert(DB_KEY.to_string(), Value::String(database.clone()));
        }
        document
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_document())
    }

    /// Fetch the referenced document and build an instance of the model that
    /// owns the collection.
    ///
    /// References are resolved only within the database the owning model is
    /// registered in.
    ///
    /// # Errors
    ///
    /// - [`OdmError::InvalidInstanceType`] if no model is registered for the
    ///   collection
    /// - [`OdmError::ForeignDatabase`] if `$db` names another database
    /// - storage and validation failures of the target
    pub fn resolve(&self, odm: &Odm) -> OdmResult<Option<Instance>> {
        self.fetch(odm, None)
    }

    /// Like [`resolve`](Self::resolve), but a missing target is an error.
    ///
    /// # Errors
    ///
    /// [`OdmError::ReferenceNotFound`] when no document matches.
    pub fn resolve_existing(&self, odm: &Odm) -> OdmResult<Instance> {
        self.resolve(odm)?
            .ok_or_else(|| OdmError::reference_not_found(&self.collection, &self.id))
    }

    /// Like [`resolve`](Self::resolve), but load only the projected fields.
    pub fn resolve_projected(
        &self,
        odm: &Odm,
        projection: &Projection,
    ) -> OdmResult<Option<Instance>> {
        self.fetch(odm, Some(projection))
    }

    /// Whether the referenced document currently exists.
    pub fn exists(&self, odm: &Odm) -> OdmResult<bool> {
        let model = self.owning_model(odm)?;
        Ok(model.collection().count(&self.filter())? == 1)
    }

    fn owning_model(&self, odm: &Odm) -> OdmResult<Arc<Model>> {
        let model = odm.model(&self.collection)?;
        let registered = model.collection().database().name();
        match self.database.as_deref() {
            Some(db) if db != registered => Err(OdmError::ForeignDatabase {
                reference: self.to_string(),
                collection: model.collection().name().to_string(),
                registered: registered.to_string(),
            }),
            _ => Ok(model),
        }
    }

    fn fetch(&self, odm: &Odm, projection: Option<&Projection>) -> OdmResult<Option<Instance>> {
        let model = self.owning_model(odm)?;
        trace!("Resolving {} in {}", self, model.collection());

        let Some(document) = model.collection().find_one(&self.filter(), projection)? else {
            return Ok(None);
        };

        let state = match projection {
            Some(projection) => LoadState::Partial(projection.clone()),
            None => LoadState::Whole,
        };
        Instance::from_stored(odm, model, document, state).map(Some)
    }

    fn filter(&self) -> Filter {
        Filter::new().eq(ID_FIELD, self.id.clone())
    }
}

impl fmt::Display for DbRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.database {
            Some(db) => write!(f, "{}.{}/{}", db, self.collection, self.id),
            None => write!(f, "{}/{}", self.collection, self.id),
        }
    }
}
