//! Document and value model shared by every other module.
//!
//! Documents are ordered JSON objects. Scalar kinds JSON has no literal for use the
//! Extended JSON single-key wrappers:
//!
//! | Kind | Stored form |
//! |---|---|
//! | unique id | `{"$oid": "<32 hex chars>"}` |
//! | timestamp | `{"$date": "<RFC 3339>"}` |
//! | binary | `{"$binary": "<base64>"}` |
//!
//! # Examples
//!
//! ```rust
//! use document_odm::document::{ObjectId, ValueKind};
//! use serde_json::json;
//!
//! let id = ObjectId::new();
//! assert_eq!(ValueKind::of(&id.to_value()), ValueKind::ObjectId);
//! assert_eq!(ValueKind::of(&json!(3)), ValueKind::Int32);
//! assert_eq!(ValueKind::of(&json!({"name": "bob"})), ValueKind::Document);
//! ```

pub mod object_id;
pub mod path;
pub mod projection;

pub use object_id::{ObjectId, ParseObjectIdError};
pub use path::{get_path, remove_path, set_path};
pub use projection::Projection;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use std::fmt;

/// An ordered mapping of field names to values.
pub type Document = Map<String, Value>;

/// Key of the identifier field every stored document carries.
pub const ID_FIELD: &str = "_id";

pub(crate) const OID_KEY: &str = "$oid";
pub(crate) const DATE_KEY: &str = "$date";
pub(crate) const BINARY_KEY: &str = "$binary";

/// Runtime kind of a stored value.
///
/// Classification never coerces: a numeric string is a `String`, and an
/// Extended JSON wrapper whose payload does not parse is an ordinary `Document`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int32,
    Int64,
    Double,
    String,
    Date,
    Binary,
    ObjectId,
    Document,
    Array,
}

impl ValueKind {
    /// Classify a value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(n) => match n.as_i64() {
                Some(i) if i32::try_from(i).is_ok() => Self::Int32,
                Some(_) => Self::Int64,
                None if n.is_u64() => Self::Int64,
                None => Self::Double,
            },
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(map) => Self::of_object(map),
        }
    }

    fn of_object(map: &Document) -> Self {
        if map.len() != 1 {
            return Self::Document;
        }

        match map.iter().next() {
            Some((key, Value::String(s))) if key == OID_KEY && s.parse::<ObjectId>().is_ok() => {
                Self::ObjectId
            }
            Some((key, Value::String(s)))
                if key == DATE_KEY && DateTime::parse_from_rfc3339(s).is_ok() =>
            {
                Self::Date
            }
            Some((key, Value::String(s))) if key == BINARY_KEY && STANDARD.decode(s).is_ok() => {
                Self::Binary
            }
            _ => Self::Document,
        }
    }

    /// Whether this is one of the numeric kinds.
    pub fn is_number(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64 | Self::Double)
    }

    /// Name used in diagnostics and validator expressions.
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int32 => "int",
            Self::Int64 => "long",
            Self::Double => "double",
            Self::String => "string",
            Self::Date => "date",
            Self::Binary => "binData",
            Self::ObjectId => "objectId",
            Self::Document => "object",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wrap a timestamp in its stored form.
pub fn date_value(at: DateTime<Utc>) -> Value {
    json!({ DATE_KEY: at.to_rfc3339_opts(SecondsFormat::Millis, true) })
}

/// Read a stored timestamp.
pub fn as_date(value: &Value) -> Option<DateTime<FixedOffset>> {
    let raw = value.as_object()?.get(DATE_KEY)?.as_str()?;
    DateTime::parse_from_rfc3339(raw).ok()
}

/// Wrap raw bytes in their stored form.
pub fn binary_value(bytes: &[u8]) -> Value {
    json!({ BINARY_KEY: STANDARD.encode(bytes) })
}

/// Read stored binary data.
pub fn as_binary(value: &Value) -> Option<Vec<u8>> {
    let raw = value.as_object()?.get(BINARY_KEY)?.as_str()?;
    STANDARD.decode(raw).ok()
}

/// Borrow a value as a document, excluding Extended JSON scalars.
pub fn as_document(value: &Value) -> Option<&Document> {
    match value {
        Value::Object(map) if ValueKind::of_object(map) == ValueKind::Document => Some(map),
        _ => None,
    }
}
