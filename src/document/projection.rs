//! Field subsets for partial loads and scoped validation.

use super::{Document, ID_FIELD, get_path, set_path};
use serde_json::{Value, json};

/// A set of field paths a load, validation or snapshot is restricted to.
///
/// Field order is the order fields were first listed in; duplicates are dropped.
///
/// # Examples
///
/// ```rust
/// use document_odm::document::Projection;
///
/// let projection = Projection::from(["username", "group"]);
/// assert!(projection.includes("username"));
/// assert!(!projection.includes("age"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    /// Create a projection over the given field paths.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut projection = Self::default();
        for field in fields {
            projection.push(field);
        }
        projection
    }

    /// Add a field path.
    pub fn push(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
    }

    /// The projected field paths in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `path` lies inside the projection.
    ///
    /// A path is included when it is projected itself, when it is nested in a
    /// projected field, or when a projected field is nested in it.
    pub fn includes(&self, path: &str) -> bool {
        self.fields
            .iter()
            .any(|field| field == path || is_nested(path, field) || is_nested(field, path))
    }

    /// Copy only the projected fields (and `_id`) out of a document.
    pub fn apply(&self, document: &Document) -> Document {
        let mut projected = Document::new();
        if let Some(id) = document.get(ID_FIELD) {
            projected.insert(ID_FIELD.to_string(), id.clone());
        }
        for field in &self.fields {
            if let Some(value) = get_path(document, field) {
                set_path(&mut projected, field, value.clone());
            }
        }
        projected
    }

    /// Render as a projection document, `{"field": 1, ...}`.
    pub fn to_document(&self) -> Document {
        self.fields
            .iter()
            .map(|field| (field.clone(), json!(1)))
            .collect()
    }

    /// Parse a projection document. Fields mapped to `0`/`false` are skipped.
    pub fn from_document(document: &Document) -> Option<Self> {
        let mut projection = Self::default();
        for (field, flag) in document {
            let enabled = match flag {
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
                _ => return None,
            };
            if enabled {
                projection.push(field.clone());
            }
        }
        Some(projection)
    }
}

fn is_nested(inner: &str, outer: &str) -> bool {
    inner
        .strip_prefix(outer)
        .is_some_and(|rest| rest.starts_with('.'))
}

impl<S: Into<String>, const N: usize> From<[S; N]> for Projection {
    fn from(fields: [S; N]) -> Self {
        Self::new(fields)
    }
}

impl From<Vec<String>> for Projection {
    fn from(fields: Vec<String>) -> Self {
        Self::new(fields)
    }
}
