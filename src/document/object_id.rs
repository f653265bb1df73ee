//! Opaque unique identifiers.

use super::OID_KEY;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// An opaque, randomly generated unique identifier.
///
/// Stored as `{"$oid": "<32 lowercase hex chars>"}`. Serde round-trips use the
/// same wrapper, so typed records can carry an `ObjectId` field directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(Uuid);

impl ObjectId {
    /// Generate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The stored form of this identifier.
    pub fn to_value(&self) -> Value {
        json!({ OID_KEY: self.to_string() })
    }

    /// Read an identifier from its stored form.
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        if map.len() != 1 {
            return None;
        }
        map.get(OID_KEY)?.as_str()?.parse().ok()
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Returned when a string is not a 32-char hex identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid object id '{0}'")]
pub struct ParseObjectIdError(String);

impl FromStr for ObjectId {
    type Err = ParseObjectIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the simple form is accepted
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseObjectIdError(s.to_string()));
        }
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ParseObjectIdError(s.to_string()))
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        id.to_value()
    }
}

#[derive(Serialize, Deserialize)]
struct Wrapped {
    #[serde(rename = "$oid")]
    oid: String,
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Wrapped {
            oid: self.to_string(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wrapped = Wrapped::deserialize(deserializer)?;
        wrapped.oid.parse().map_err(serde::de::Error::custom)
    }
}
