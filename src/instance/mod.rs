//! Instances: schema-validated documents bound to a model.
//!
//! An [`Instance`] owns one document and tracks two things about it:
//!
//! - whether it is **new** (never stored, or removed since) or **existing**;
//! - whether it was loaded **whole** or **partially** through a projection.
//!
//! A partial instance validates and persists only the fields inside its
//! projection. Field writes are recorded as dirty paths, and storing an existing
//! instance sends only those paths as a `$set`/`$unset` update keyed by the
//! instance's `_id`. The `_id` is assigned on first store when absent and can
//! not be changed once present.
//!
//! # Examples
//!
//! ```rust
//! use document_odm::schema::{FieldRequirement, Schema};
//! use document_odm::storage::{Database, InMemoryStore};
//! use document_odm::{Instance, Odm};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let odm = Odm::new();
//! let db = Database::new("app", InMemoryStore::new());
//! let schema = Schema::new()
//!     .required("username", FieldRequirement::NonEmptyString)
//!     .optional("age", FieldRequirement::Number);
//! odm.register("user", schema, &db)?;
//!
//! let mut user = Instance::new(&odm, "user", json!({"username": "Bert"}))?;
//! assert!(user.is_new());
//! user.store()?;
//!
//! user.set("age", 30)?;
//! assert_eq!(user.dirty_fields().collect::<Vec<_>>(), vec!["age"]);
//! user.store()?;
//! assert!(!user.is_dirty());
//!
//! assert!(Instance::new(&odm, "user", json!({"username": ""})).is_err());
//! # Ok(())
//! # }
//! ```

mod persistence;
mod relations;
mod scoped;

pub use scoped::ScopedInstance;

use crate::document::{Document, ID_FIELD, Projection, get_path, remove_path, set_path};
use crate::error::{OdmError, OdmResult, ValidationError, ValidationResult};
use crate::model::Model;
use crate::odm::Odm;
use crate::schema::FieldScope;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::mem;
use std::sync::Arc;

/// How much of the stored document an instance holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// The full document
    Whole,
    /// Only the projected fields (plus `_id`)
    Partial(Projection),
}

impl LoadState {
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial(_))
    }

    pub fn projection(&self) -> Option<&Projection> {
        match self {
            Self::Whole => None,
            Self::Partial(projection) => Some(projection),
        }
    }

    /// The validation scope matching this load state.
    pub fn scope(&self) -> FieldScope<'_> {
        match self {
            Self::Whole => FieldScope::All,
            Self::Partial(projection) => FieldScope::Only(projection),
        }
    }
}

/// A document bound to a registered model.
#[derive(Clone)]
pub struct Instance {
    odm: Odm,
    model: Arc<Model>,
    document: Document,
    state: LoadState,
    is_new: bool,
    dirty: BTreeSet<String>,
    removed: bool,
}

impl Instance {
    /// Build a new instance of the model registered as `model` from a document,
    /// validating it against the model's schema.
    ///
    /// # Errors
    ///
    /// - [`OdmError::InvalidInstanceType`] if no such model is registered
    /// - [`OdmError::InvalidInstanceDocument`] if `document` is not a document
    ///   or fails validation
    pub fn new(odm: &Odm, model: &str, document: Value) -> OdmResult<Self> {
        let Value::Object(document) = document else {
            return Err(ValidationError::NotADocument.into());
        };
        Self::from_document(odm, model, document)
    }

    /// Like [`new`](Self::new), taking the document map directly.
    pub fn from_document(odm: &Odm, model: &str, document: Document) -> OdmResult<Self> {
        Self::for_model(odm, odm.model(model)?, document, true)
    }

    /// Build a new instance without validating the document.
    pub fn new_unvalidated(odm: &Odm, model: &str, document: Document) -> OdmResult<Self> {
        Self::for_model(odm, odm.model(model)?, document, false)
    }

    /// A new instance with an empty document. Not validated.
    pub fn empty(odm: &Odm, model: &str) -> OdmResult<Self> {
        Self::new_unvalidated(odm, model, Document::new())
    }

    pub(crate) fn for_model(
        odm: &Odm,
        model: Arc<Model>,
        document: Document,
        validate: bool,
    ) -> OdmResult<Self> {
        let instance = Self {
            odm: odm.clone(),
            model,
            document,
            state: LoadState::Whole,
            is_new: true,
            dirty: BTreeSet::new(),
            removed: false,
        };
        if validate {
            instance.validate()?;
        }
        Ok(instance)
    }

    /// Build an existing instance from a document read from storage.
    pub(crate) fn from_stored(
        odm: &Odm,
        model: Arc<Model>,
        document: Document,
        state: LoadState,
    ) -> OdmResult<Self> {
        let instance = Self {
            odm: odm.clone(),
            model,
            document,
            state,
            is_new: false,
            dirty: BTreeSet::new(),
            removed: false,
        };
        if odm.config().validate_on_load {
            instance.validate()?;
        }
        Ok(instance)
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn odm(&self) -> &Odm {
        &self.odm
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn load_state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_partial(&self) -> bool {
        self.state.is_partial()
    }

    /// Whether the next store inserts rather than updates.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Whether [`remove`](Self::remove) was called.
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// The `_id` value, once assigned.
    pub fn identifier(&self) -> Option<&Value> {
        self.document.get(ID_FIELD)
    }

    /// Paths written since the last store, in sorted order.
    pub fn dirty_fields(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Read the value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        get_path(&self.document, path)
    }

    /// Write the value at a dotted path, creating intermediate sub-documents.
    ///
    /// On a partial instance, writing outside the projection adds the path to
    /// the projection.
    ///
    /// # Errors
    ///
    /// [`OdmError::ImmutableIdentifier`] when writing `_id` (or below it) after
    /// an identifier was assigned.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> OdmResult<()> {
        self.guard_identifier(path)?;
        set_path(&mut self.document, path, value.into());
        self.touch(path);
        Ok(())
    }

    /// Remove the value at a dotted path, returning it.
    pub fn unset(&mut self, path: &str) -> OdmResult<Option<Value>> {
        self.guard_identifier(path)?;
        let removed = remove_path(&mut self.document, path);
        self.touch(path);
        Ok(removed)
    }

    /// Validate the current document under the instance's load scope.
    pub fn validate(&self) -> ValidationResult<()> {
        self.model
            .validate(&self.document, self.state.scope(), &self.odm)
    }

    /// Wrap this instance in a guard that stores it at end of scope.
    pub fn scoped(self) -> ScopedInstance {
        ScopedInstance::new(self)
    }

    /// Move the document and tracking state out, leaving an empty husk that
    /// shares only the context and model handles.
    pub(crate) fn take(&mut self) -> Instance {
        Self {
            odm: self.odm.clone(),
            model: Arc::clone(&self.model),
            document: mem::take(&mut self.document),
            state: mem::replace(&mut self.state, LoadState::Whole),
            is_new: self.is_new,
            dirty: mem::take(&mut self.dirty),
            removed: self.removed,
        }
    }

    fn guard_identifier(&self, path: &str) -> OdmResult<()> {
        let targets_id = path == ID_FIELD
            || path
                .strip_prefix(ID_FIELD)
                .is_some_and(|rest| rest.starts_with('.'));

        if targets_id && self.identifier().is_some() {
            return Err(OdmError::ImmutableIdentifier);
        }
        Ok(())
    }

    fn touch(&mut self, path: &str) {
        if let LoadState::Partial(projection) = &mut self.state {
            if !projection.includes(path) {
                projection.push(path);
            }
        }

        if path == ID_FIELD {
            return;
        }

        // A dirty parent already covers the path
        if self.dirty.iter().any(|dirty| is_within(path, dirty)) {
            return;
        }
        self.dirty.retain(|dirty| !is_within(dirty, path));
        self.dirty.insert(path.to_string());
    }
}

/// Whether `path` equals `ancestor` or lies below it.
fn is_within(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('.'))
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("model", &self.model.name().singular())
            .field("document", &self.document)
            .field("state", &self.state)
            .field("is_new", &self.is_new)
            .field("dirty", &self.dirty)
            .field("removed", &self.removed)
            .finish()
    }
}
