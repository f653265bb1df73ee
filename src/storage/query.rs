//! Filters and partial updates understood by every [`DocumentStore`](super::DocumentStore).
//!
//! The query language is deliberately small: a filter is a conjunction of
//! field-path equality tests, and an update is a set of `$set` assignments plus
//! a set of `$unset` paths.

use crate::document::{Document, ID_FIELD, get_path, remove_path, set_path};
use serde_json::{Map, Value, json};

/// A conjunction of field-path equality conditions.
///
/// An empty filter matches every document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    /// A filter matching every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// A point query on the identifier field.
    pub fn by_id(id: impl Into<Value>) -> Self {
        Self::new().eq(ID_FIELD, id)
    }

    /// Add an equality condition.
    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((path.into(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, Value)] {
        &self.conditions
    }

    /// Whether a document satisfies every condition.
    ///
    /// Comparison is exact value equality: `1` and `1.0` are different values.
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(path, expected)| get_path(document, path) == Some(expected))
    }

    /// Seed document for an upsert: every condition becomes a field.
    pub fn to_seed_document(&self) -> Document {
        let mut seed = Document::new();
        for (path, value) in &self.conditions {
            set_path(&mut seed, path, value.clone());
        }
        seed
    }

    /// Render as a query document, `{"path": value, ...}`.
    pub fn to_document(&self) -> Document {
        self.conditions.iter().cloned().collect()
    }
}

impl From<Document> for Filter {
    fn from(document: Document) -> Self {
        Self {
            conditions: document.into_iter().collect(),
        }
    }
}

/// A partial update: fields to assign and fields to remove.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Update {
    set: Document,
    unset: Vec<String>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign `value` at `path`.
    pub fn set(mut self, path: impl Into<String>, value: Value) -> Self {
        self.set.insert(path.into(), value);
        self
    }

    /// Remove the field at `path`.
    pub fn unset(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !self.unset.contains(&path) {
            self.unset.push(path);
        }
        self
    }

    pub fn set_fields(&self) -> &Document {
        &self.set
    }

    pub fn unset_fields(&self) -> &[String] {
        &self.unset
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty()
    }

    /// Apply to a document in place.
    pub fn apply(&self, document: &mut Document) {
        for (path, value) in &self.set {
            set_path(document, path, value.clone());
        }
        for path in &self.unset {
            remove_path(document, path);
        }
    }

    /// Render as `{"$set": {...}, "$unset": {...}}`, omitting empty parts.
    pub fn to_document(&self) -> Document {
        let mut rendered = Document::new();
        if !self.set.is_empty() {
            rendered.insert("$set".to_string(), Value::Object(self.set.clone()));
        }
        if !self.unset.is_empty() {
            let unset: Map<String, Value> = self
                .unset
                .iter()
                .map(|path| (path.clone(), json!("")))
                .collect();
            rendered.insert("$unset".to_string(), Value::Object(unset));
        }
        rendered
    }
}
