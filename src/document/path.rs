//! Dotted field paths into nested documents.
//!
//! `"address.city"` addresses the `city` field of the `address` sub-document.
//! Reads additionally accept numeric segments as array indices
//! (`"emails.0.value"`); writes only create and traverse documents.

use super::Document;
use serde_json::{Map, Value};

/// Look up a value by dotted path.
pub fn get_path<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Set a value by dotted path, creating intermediate documents as needed.
///
/// An intermediate value that is not a document is replaced by one.
pub fn set_path(document: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            document.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = document
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(map) = child {
                set_path(map, rest, value);
            }
        }
    }
}

/// Remove a value by dotted path, returning it if it was present.
pub fn remove_path(document: &mut Document, path: &str) -> Option<Value> {
    match path.split_once('.') {
        None => document.shift_remove(path),
        Some((head, rest)) => match document.get_mut(head)? {
            Value::Object(map) => remove_path(map, rest),
            _ => None,
        },
    }
}
