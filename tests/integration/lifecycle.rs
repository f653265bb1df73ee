//! Instance lifecycle: creation, diff updates, partial loads and removal.

use crate::common::fixtures::{dangling_id, user};
use crate::common::{TestContext, user_schema};
use document_odm::document::Projection;
use document_odm::error::ValidationError;
use document_odm::schema::FieldScope;
use document_odm::storage::{DocumentStore, Filter, Update};
use document_odm::{Instance, OdmError};
use serde_json::json;

#[test]
fn test_groups_and_users_scenario() {
    let ctx = TestContext::new();

    assert!(Instance::new(&ctx.odm, "group", json!({"name": "bob"})).is_ok());
    let err = Instance::new(&ctx.odm, "group", json!({"bob": true})).unwrap_err();
    assert!(err.to_string().contains("name"));

    let err = Instance::new(
        &ctx.odm,
        "user",
        json!({"username": "Bert", "age": false, "group": dangling_id()}),
    )
    .unwrap_err();
    match err {
        OdmError::InvalidInstanceDocument(e) => assert_eq!(e.field(), Some("age")),
        other => panic!("expected a validation failure, got {other:?}"),
    }

    let group = ctx.group("admins");
    let group_id = group.identifier().cloned().unwrap();
    let mut bert = Instance::new(
        &ctx.odm,
        "user",
        json!({"username": "Bert", "group": group_id, "age": 123}),
    )
    .unwrap();
    bert.store().unwrap();

    let id = bert.identifier().cloned().unwrap();
    let found = ctx.odm.find_by_id("users", id, None).unwrap().unwrap();
    assert_eq!(found.get("username"), Some(&json!("Bert")));
    assert_eq!(found.get("age"), Some(&json!(123)));
}

#[test]
fn test_identifier_assigned_first_and_immutable() {
    let ctx = TestContext::new();
    let mut group = Instance::new(&ctx.odm, "group", json!({"name": "ops"})).unwrap();
    assert!(group.identifier().is_none());

    group.store().unwrap();
    assert_eq!(group.document().keys().next().map(String::as_str), Some("_id"));
    assert!(matches!(
        group.set("_id", 5),
        Err(OdmError::ImmutableIdentifier)
    ));
    assert!(matches!(
        group.unset("_id"),
        Err(OdmError::ImmutableIdentifier)
    ));

    let id = group.identifier().cloned();
    group.set("name", "sre").unwrap();
    group.store().unwrap();
    group.store().unwrap();
    assert_eq!(group.identifier().cloned(), id);
    assert_eq!(ctx.odm.count("groups", &Filter::new()).unwrap(), 1);

    // A caller-chosen identifier is kept
    let mut named = Instance::new(&ctx.odm, "group", json!({"_id": "g-1", "name": "dev"})).unwrap();
    named.store().unwrap();
    assert!(ctx.stored("groups", json!("g-1")).is_some());
}

#[test]
fn test_existing_instance_sends_only_dirty_paths() {
    let ctx = TestContext::new();
    let group = ctx.group("admins");
    let group_id = group.identifier().cloned().unwrap();
    let mut bert = Instance::new(&ctx.odm, "user", user("Bert", &group_id)).unwrap();
    bert.store().unwrap();
    assert!(!bert.is_dirty());

    bert.set("address.city", "Amsterdam").unwrap();
    bert.unset("tags").unwrap();
    assert_eq!(
        bert.pending_update(),
        Update::new()
            .set("address.city", json!("Amsterdam"))
            .unset("tags")
    );

    // Someone else changes a field this instance did not touch
    let id = bert.identifier().cloned().unwrap();
    ctx.store
        .update_one(
            "users",
            &Filter::by_id(id.clone()),
            &Update::new().set("age", json!(34)),
            false,
        )
        .unwrap();

    bert.store().unwrap();
    let stored = ctx.stored("users", id).unwrap();
    assert_eq!(stored["address"], json!({"city": "Amsterdam", "street": "Oudegracht"}));
    assert_eq!(stored["age"], json!(34));
    assert!(!stored.contains_key("tags"));
}

#[test]
fn test_clean_store_is_a_no_op() {
    let ctx = TestContext::new();
    let mut group = ctx.group("admins");
    let id = group.identifier().cloned().unwrap();
    ctx.store.remove("groups", &Filter::by_id(id.clone()), 1).unwrap();

    group.store().unwrap();
    assert!(ctx.stored("groups", id).is_none());
}

#[test]
fn test_partial_instance_validates_projected_fields_only() {
    let ctx = TestContext::new();
    let group = ctx.group("admins");
    ctx.seed(
        "users",
        json!({"_id": 1, "username": "Bert", "age": "old", "group": group.identifier().unwrap()}),
    );

    assert!(matches!(
        ctx.odm.find_by_id("user", 1, None),
        Err(OdmError::InvalidInstanceDocument(ValidationError::InvalidType { .. }))
    ));

    let projection = Projection::from(["username"]);
    let partial = ctx
        .odm
        .find_by_id("user", 1, Some(&projection))
        .unwrap()
        .unwrap();
    assert!(partial.is_partial());
    assert!(partial.get("age").is_none());
    assert!(partial.validate().is_ok());
}

#[test]
fn test_partial_store_never_widens() {
    let ctx = TestContext::new();
    let group = ctx.group("admins");
    let group_id = group.identifier().cloned().unwrap();
    let mut seeded = user("Bert", &group_id);
    seeded["_id"] = json!(7);
    ctx.seed("users", seeded);

    let projection = Projection::from(["username"]);
    let mut partial = ctx
        .odm
        .find_by_id("user", 7, Some(&projection))
        .unwrap()
        .unwrap();
    partial.set("username", "Henk").unwrap();
    partial.set("age", 40).unwrap();
    assert!(partial.load_state().projection().unwrap().includes("age"));

    partial.store().unwrap();
    let stored = ctx.stored("users", json!(7)).unwrap();
    assert_eq!(stored["username"], json!("Henk"));
    assert_eq!(stored["age"], json!(40));
    assert_eq!(stored["tags"], json!(["ops", "oncall"]));
    assert_eq!(stored["address"]["city"], json!("Utrecht"));

    assert!(matches!(partial.replace(), Err(OdmError::PartialReplace)));
}

#[test]
fn test_vanished_document_on_store() {
    let ctx = TestContext::new();
    let mut whole = ctx.group("admins");
    let id = whole.identifier().cloned().unwrap();

    let projection = Projection::from(["name"]);
    let mut partial = ctx
        .odm
        .find_by_id("group", id.clone(), Some(&projection))
        .unwrap()
        .unwrap();

    ctx.store.remove("groups", &Filter::by_id(id.clone()), 1).unwrap();

    partial.set("name", "wheel").unwrap();
    assert!(matches!(
        partial.store(),
        Err(OdmError::DocumentNotFound { .. })
    ));
    assert!(ctx.stored("groups", id.clone()).is_none());

    whole.set("name", "staff").unwrap();
    whole.store().unwrap();
    assert_eq!(ctx.stored("groups", id).unwrap()["name"], json!("staff"));
}

#[test]
fn test_remove_then_store_inserts_again() {
    let ctx = TestContext::new();
    let mut group = ctx.group("admins");
    let id = group.identifier().cloned().unwrap();

    group.remove().unwrap();
    assert!(group.is_removed());
    assert!(group.is_new());
    assert_eq!(ctx.odm.count("groups", &Filter::new()).unwrap(), 0);

    group.store().unwrap();
    assert_eq!(ctx.stored("groups", id).unwrap()["name"], json!("admins"));
}

#[test]
fn test_replace_overwrites_whole_document() {
    let ctx = TestContext::new();
    ctx.seed("groups", json!({"_id": 3, "name": "ops", "legacy": true}));

    let mut group = ctx.odm.find_by_id("group", 3, None).unwrap().unwrap();
    group.set("name", "sre").unwrap();
    group.unset("legacy").unwrap();
    group.replace().unwrap();

    assert_eq!(
        ctx.stored("groups", json!(3)).unwrap(),
        crate::common::doc(json!({"_id": 3, "name": "sre"}))
    );
}

#[test]
fn test_construction_agrees_with_schema_validation() {
    let ctx = TestContext::new();
    let group = ctx.group("admins");
    let group_id = group.identifier().cloned().unwrap();
    let schema = user_schema();

    let candidates = [
        user("Bert", &group_id),
        json!({"username": "Bert", "group": group_id}),
        json!({"username": "", "group": group_id}),
        json!({"username": "Bert", "group": group_id, "tags": ["a", 1]}),
        json!({"username": "Bert", "group": group_id, "address": {"street": "x"}}),
        json!({"username": "Bert", "group": dangling_id()}),
    ];

    for candidate in candidates {
        let document = crate::common::doc(candidate.clone());
        let valid = schema.validate(&document, FieldScope::All, &ctx.odm).is_ok();
        match Instance::new(&ctx.odm, "user", candidate) {
            Ok(_) => assert!(valid),
            Err(OdmError::InvalidInstanceDocument(_)) => assert!(!valid),
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
}

#[test]
fn test_store_revalidates_before_writing() {
    let ctx = TestContext::new();
    let mut group = ctx.group("admins");
    let id = group.identifier().cloned().unwrap();

    group.set("name", "").unwrap();
    match group.store() {
        Err(OdmError::InvalidInstanceDocument(e)) => assert_eq!(e.field(), Some("name")),
        other => panic!("expected a validation failure, got {other:?}"),
    }
    assert!(matches!(
        group.replace(),
        Err(OdmError::InvalidInstanceDocument(_))
    ));
    assert_eq!(ctx.stored("groups", id.clone()).unwrap()["name"], json!("admins"));
    assert!(ctx.odm.find_by_id("group", id.clone(), None).is_ok());

    // Fixing the document lets the pending change through
    group.set("name", "wheel").unwrap();
    group.store().unwrap();
    assert_eq!(ctx.stored("groups", id).unwrap()["name"], json!("wheel"));

    // A reference whose target has gone blocks the store as well
    let other = ctx.group("ops");
    let mut bert = Instance::new(&ctx.odm, "user", user("Bert", other.identifier().unwrap())).unwrap();
    bert.store().unwrap();
    ctx.store
        .remove("groups", &Filter::by_id(other.identifier().cloned().unwrap()), 1)
        .unwrap();
    bert.set("age", 41).unwrap();
    assert!(matches!(
        bert.store(),
        Err(OdmError::InvalidInstanceDocument(ValidationError::UnresolvableReference { .. }))
    ));
}
