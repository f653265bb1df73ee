//! Mapping typed records to and from documents.
//!
//! Any `serde` record that serializes to a JSON object can back an instance.
//! The mapping is a plain serialization step: validation still happens against
//! the model's schema when the instance is built. [`ObjectId`](crate::document::ObjectId)
//! and [`DbRef`](crate::DbRef) fields serialize to their stored forms, and
//! `chrono` timestamps can use [`date`] with `#[serde(with = ...)]`.
//!
//! # Examples
//!
//! ```rust
//! use document_odm::document::ObjectId;
//! use document_odm::schema::{FieldRequirement, Schema};
//! use document_odm::storage::{Database, InMemoryStore};
//! use document_odm::{Instance, Odm};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Group {
//!     #[serde(rename = "_id")]
//!     id: ObjectId,
//!     name: String,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let odm = Odm::new();
//! let db = Database::new("app", InMemoryStore::new());
//! odm.register("group", Schema::new().required("name", FieldRequirement::String), &db)?;
//!
//! let group = Group { id: ObjectId::new(), name: "admins".to_string() };
//! Instance::from_record(&odm, "group", &group)?.store()?;
//!
//! let found: Option<Group> = odm.find_record_by_id("group", group.id)?;
//! assert_eq!(found, Some(group));
//! # Ok(())
//! # }
//! ```

use crate::document::{Document, ID_FIELD};
use crate::error::{OdmResult, ValidationError};
use crate::instance::Instance;
use crate::odm::Odm;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Serialize a record into a document.
///
/// # Errors
///
/// [`ValidationError::NotADocument`] (as an `InvalidInstanceDocument`) when
/// the record does not serialize to an object.
pub fn to_document<T: Serialize + ?Sized>(record: &T) -> OdmResult<Document> {
    match serde_json::to_value(record)? {
        Value::Object(document) => Ok(document),
        _ => Err(ValidationError::NotADocument.into()),
    }
}

/// Deserialize a record from a document.
pub fn from_document<T: DeserializeOwned>(document: &Document) -> OdmResult<T> {
    Ok(serde_json::from_value(Value::Object(document.clone()))?)
}

impl Instance {
    /// Build a new, validated instance from a record.
    pub fn from_record<T: Serialize + ?Sized>(odm: &Odm, model: &str, record: &T) -> OdmResult<Self> {
        Self::from_document(odm, model, to_document(record)?)
    }

    /// Read the instance's document as a record.
    pub fn to_record<T: DeserializeOwned>(&self) -> OdmResult<T> {
        from_document(self.document())
    }

    /// Bring the document in line with a record, marking only the top-level
    /// fields that changed as dirty. Fields the record lacks are unset; `_id`
    /// is left alone when the record has none.
    pub fn update_from_record<T: Serialize + ?Sized>(&mut self, record: &T) -> OdmResult<()> {
        let updated = to_document(record)?;

        let removed: Vec<String> = self
            .document()
            .keys()
            .filter(|key| key.as_str() != ID_FIELD && !updated.contains_key(key.as_str()))
            .cloned()
            .collect();
        for key in removed {
            self.unset(&key)?;
        }

        for (key, value) in updated {
            if self.get(&key) != Some(&value) {
                self.set(&key, value)?;
            }
        }
        Ok(())
    }
}

impl Odm {
    /// Load the document with this `_id` as a record.
    pub fn find_record_by_id<T: DeserializeOwned>(
        &self,
        model: &str,
        id: impl Into<Value>,
    ) -> OdmResult<Option<T>> {
        self.find_by_id(model, id, None)?
            .map(|instance| instance.to_record())
            .transpose()
    }
}

/// `serde` adapter storing a `DateTime<Utc>` as `{"$date": "<RFC 3339>"}`.
///
/// ```rust
/// use chrono::{DateTime, Utc};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Event {
///     #[serde(with = "document_odm::mapping::date")]
///     at: DateTime<Utc>,
/// }
/// ```
pub mod date {
    use crate::document::{as_date, date_value};
    use chrono::{DateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        date_value(*at).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        as_date(&value)
            .map(|at| at.with_timezone(&Utc))
            .ok_or_else(|| D::Error::custom("expected a {\"$date\": \"<RFC 3339>\"} value"))
    }
}
