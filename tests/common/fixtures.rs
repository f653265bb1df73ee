//! Documents shared by several tests.

use document_odm::document::ObjectId;
use serde_json::{Value, json};

/// A valid user document pointing at the group with `group_id`.
pub fn user(username: &str, group_id: &Value) -> Value {
    json!({
        "username": username,
        "age": 33,
        "group": group_id,
        "address": {"city": "Utrecht", "street": "Oudegracht"},
        "tags": ["ops", "oncall"]
    })
}

/// An identifier no stored document carries.
pub fn dangling_id() -> Value {
    ObjectId::new().to_value()
}
