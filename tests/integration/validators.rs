//! Validator expressions installed on collections at registration.

use crate::common::{FlakyStore, TestContext, user_schema};
use document_odm::Odm;
use document_odm::schema::{FieldRequirement, Schema};
use document_odm::storage::{Database, InMemoryStore};
use serde_json::json;

#[test]
fn test_registration_installs_schema_validator() {
    let ctx = TestContext::new();

    let installed = ctx.store.validator("users").unwrap().unwrap();
    assert_eq!(installed, user_schema().to_validator());
    assert_eq!(
        ctx.store.validator("groups").unwrap(),
        Some(json!({"$and": [{"name": {"$type": "string", "$ne": ""}}]}))
    );
}

#[test]
fn test_push_down_can_be_disabled() {
    let ctx = TestContext::with_odm(Odm::builder().with_validator_push_down(false).build());
    assert_eq!(ctx.store.validator("users").unwrap(), None);
}

#[test]
fn test_failed_install_does_not_block_registration() {
    let _ = env_logger::builder().is_test(true).try_init();
    let inner = InMemoryStore::new();
    let store = FlakyStore::new(inner.clone());
    store.fail_writes(true);

    let odm = Odm::new();
    let db = Database::new("app", store);
    let model = odm
        .register(
            "tag",
            Schema::new().required("label", FieldRequirement::String),
            &db,
        )
        .unwrap();

    assert_eq!(model.collection().name(), "tags");
    assert_eq!(inner.validator("tags").unwrap(), None);
    assert!(odm.registry().contains("tag"));
}

#[test]
fn test_optional_and_nested_fields_render() {
    let schema = Schema::new()
        .optional("age", FieldRequirement::Number)
        .required(
            "address",
            FieldRequirement::object(Schema::new().required("city", FieldRequirement::String)),
        );

    assert_eq!(
        schema.to_validator(),
        json!({"$and": [
            {"$or": [
                {"age": {"$type": ["double", "int", "long"]}},
                {"age": {"$exists": false}}
            ]},
            {"$and": [
                {"address": {"$type": "object"}},
                {"address.city": {"$type": "string"}}
            ]}
        ]})
    );
}
