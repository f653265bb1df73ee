//! End-of-scope persistence and storage error reporting.

use crate::common::{FlakyStore, TestContext, group_schema};
use document_odm::storage::{Database, Filter, InMemoryStore, StorageError};
use document_odm::{Instance, Odm, OdmError};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

type Reports = Arc<Mutex<Vec<(String, Option<Value>, bool)>>>;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn flaky_odm() -> (Odm, FlakyStore) {
    let store = FlakyStore::new(InMemoryStore::new());
    let db = Database::new("app", store.clone());
    let odm = Odm::new();
    odm.register("group", group_schema(), &db).unwrap();
    (odm, store)
}

fn capture(odm: &Odm) -> Reports {
    let reports: Reports = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    odm.set_storage_error_handler(move |err, instance, implicit| {
        sink.lock()
            .unwrap()
            .push((err.to_string(), instance.get("name").cloned(), implicit));
    });
    reports
}

#[test]
fn test_scope_exit_flushes_changes() {
    let ctx = TestContext::new();
    let group = ctx.group("admins");
    let id = group.identifier().cloned().unwrap();

    {
        let mut scoped = ctx
            .odm
            .find_by_id("group", id.clone(), None)
            .unwrap()
            .unwrap()
            .scoped();
        scoped.set("name", "wheel").unwrap();
        assert_eq!(ctx.stored("groups", id.clone()).unwrap()["name"], json!("admins"));
    }

    assert_eq!(ctx.stored("groups", id).unwrap()["name"], json!("wheel"));
}

#[test]
fn test_failed_implicit_store_reaches_handler() {
    init_logging();
    let (odm, store) = flaky_odm();
    let reports = capture(&odm);

    store.fail_writes(true);
    {
        let _scoped = Instance::new(&odm, "group", json!({"name": "admins"}))
            .unwrap()
            .scoped();
    }

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].0.contains("offline"));
    assert_eq!(reports[0].1, Some(json!("admins")));
    assert!(reports[0].2);
    assert_eq!(odm.count("groups", &Filter::new()).unwrap(), 0);
}

#[test]
fn test_close_surfaces_error_to_caller() {
    init_logging();
    let (odm, store) = flaky_odm();
    let reports = capture(&odm);

    store.fail_writes(true);
    let scoped = Instance::new(&odm, "group", json!({"name": "admins"}))
        .unwrap()
        .scoped();
    match scoped.close() {
        Err(OdmError::Storage(StorageError::Unavailable { .. })) => {}
        other => panic!("expected the store to be unavailable, got {other:?}"),
    }
    assert!(reports.lock().unwrap().is_empty());

    store.fail_writes(false);
    Instance::new(&odm, "group", json!({"name": "admins"}))
        .unwrap()
        .scoped()
        .close()
        .unwrap();
    assert_eq!(odm.count("groups", &Filter::new()).unwrap(), 1);
}

#[test]
fn test_invalid_instance_is_not_flushed() {
    init_logging();
    let ctx = TestContext::new();
    let reports = capture(&ctx.odm);
    let group = ctx.group("admins");
    let id = group.identifier().cloned().unwrap();

    {
        let mut scoped = group.scoped();
        scoped.set("name", "").unwrap();
    }

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].0.contains("name"));
    assert_eq!(reports[0].1, Some(json!("")));
    assert_eq!(ctx.stored("groups", id).unwrap()["name"], json!("admins"));
}

#[test]
fn test_failed_remove_keeps_implicit_persistence() {
    init_logging();
    let (odm, store) = flaky_odm();
    let mut group = Instance::new(&odm, "group", json!({"name": "admins"})).unwrap();
    group.store().unwrap();
    let id = group.identifier().cloned().unwrap();

    {
        let mut scoped = group.scoped();
        store.fail_writes(true);
        assert!(matches!(scoped.remove(), Err(OdmError::Storage(_))));
        assert!(!scoped.is_removed());
        assert!(!scoped.is_new());

        store.fail_writes(false);
        scoped.set("name", "wheel").unwrap();
    }

    let stored = odm.find_by_id("group", id, None).unwrap().unwrap();
    assert_eq!(stored.get("name"), Some(&json!("wheel")));
}

#[test]
fn test_handler_may_reset_itself() {
    init_logging();
    let (odm, store) = flaky_odm();
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    let handle = odm.clone();
    odm.set_storage_error_handler(move |_, _, _| {
        *counter.lock().unwrap() += 1;
        handle.reset_storage_error_handler();
    });

    store.fail_writes(true);
    for name in ["a", "b"] {
        let _scoped = Instance::new(&odm, "group", json!({ "name": name }))
            .unwrap()
            .scoped();
    }

    // The second failure went to the logging handler
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn test_auto_store_disabled_by_configuration() {
    let ctx = TestContext::with_odm(Odm::builder().with_scoped_auto_store(false).build());
    {
        let mut scoped = Instance::new(&ctx.odm, "group", json!({"name": "admins"}))
            .unwrap()
            .scoped();
        assert!(!scoped.store_automatically());
        scoped.set("name", "wheel").unwrap();
    }
    assert_eq!(ctx.odm.count("groups", &Filter::new()).unwrap(), 0);

    {
        let mut scoped = Instance::new(&ctx.odm, "group", json!({"name": "ops"}))
            .unwrap()
            .scoped();
        scoped.set_store_automatically(true);
    }
    assert_eq!(ctx.odm.count("groups", &Filter::new()).unwrap(), 1);
}
