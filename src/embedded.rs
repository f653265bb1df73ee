//! Embedded snapshots of referenced documents.
//!
//! An [`EmbeddedInstance`] stores a projection of another document inline, next
//! to the [`DbRef`] needed to reach the authoritative copy. The stored form is
//!
//! ```text
//! {"embedded": {...}, "reference": {"$ref": ..., "$id": ...}, "projection": {"field": 1, ...}}
//! ```
//!
//! The snapshot is a read optimization and may be stale. Resolving always goes
//! through the reference, never through the snapshot.

use crate::document::{Document, Projection, as_document};
use crate::error::OdmResult;
use crate::instance::Instance;
use crate::odm::Odm;
use crate::reference::DbRef;
use serde_json::Value;

const EMBEDDED_KEY: &str = "embedded";
const REFERENCE_KEY: &str = "reference";
const PROJECTION_KEY: &str = "projection";

/// A reference plus a cached projection of the referenced document.
///
/// A value read from storage carries its snapshot; one built in memory
/// resolves the reference until it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedInstance {
    reference: DbRef,
    projection: Projection,
    embedded: Option<Document>,
}

impl EmbeddedInstance {
    /// An embedded value with no snapshot yet. The snapshot is resolved on
    /// every read until the value is stored.
    pub fn new(reference: DbRef, projection: Projection) -> Self {
        Self {
            reference,
            projection,
            embedded: None,
        }
    }

    /// Point at a live instance.
    ///
    /// Only the reference and projection are captured. The snapshot is
    /// materialized from the stored document when it is first read or
    /// serialized, so unsaved changes on `instance` never leak into it.
    ///
    /// # Errors
    ///
    /// [`OdmError::MissingIdentifier`](crate::error::OdmError::MissingIdentifier)
    /// if the instance has not been assigned an `_id`.
    pub fn from_instance(instance: &Instance, projection: Projection) -> OdmResult<Self> {
        Ok(Self::new(instance.make_reference()?, projection))
    }

    /// Read the stored form.
    ///
    /// Returns `None` unless all three keys hold sub-documents, the reference
    /// parses, and the projection lists fields with boolean or numeric flags.
    pub fn from_document(document: &Document) -> Option<Self> {
        let embedded = as_document(document.get(EMBEDDED_KEY)?)?;
        let reference = as_document(document.get(REFERENCE_KEY)?)?;
        let projection = as_document(document.get(PROJECTION_KEY)?)?;

        Some(Self {
            reference: DbRef::from_document(reference)?,
            projection: Projection::from_document(projection)?,
            embedded: Some(embedded.clone()),
        })
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        Self::from_document(as_document(value)?)
    }

    pub fn reference(&self) -> &DbRef {
        &self.reference
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Name of the collection the referenced document lives in.
    pub fn collection(&self) -> &str {
        self.reference.collection()
    }

    pub fn referenced_identifier(&self) -> &Value {
        self.reference.id()
    }

    /// The cached snapshot, if one was captured or loaded.
    pub fn cached(&self) -> Option<&Document> {
        self.embedded.as_ref()
    }

    /// The snapshot, resolving the reference when nothing is cached.
    ///
    /// A resolved snapshot is not cached. A missing target yields an empty
    /// document.
    pub fn embedded_document(&self, odm: &Odm) -> OdmResult<Document> {
        if let Some(embedded) = &self.embedded {
            return Ok(embedded.clone());
        }

        Ok(self
            .reference
            .resolve(odm)?
            .map(|instance| self.projection.apply(instance.document()))
            .unwrap_or_default())
    }

    /// Fetch the authoritative instance through the reference.
    pub fn resolve_reference(&self, odm: &Odm) -> OdmResult<Option<Instance>> {
        self.reference.resolve(odm)
    }

    /// The stored form, with all three keys.
    pub fn to_document(&self, odm: &Odm) -> OdmResult<Document> {
        let mut document = Document::new();
        document.insert(
            EMBEDDED_KEY.to_string(),
            Value::Object(self.embedded_document(odm)?),
        );
        document.insert(REFERENCE_KEY.to_string(), self.reference.to_value());
        document.insert(
            PROJECTION_KEY.to_string(),
            Value::Object(self.projection.to_document()),
        );
        Ok(document)
    }

    pub fn to_value(&self, odm: &Odm) -> OdmResult<Value> {
        self.to_document(odm).map(Value::Object)
    }
}
