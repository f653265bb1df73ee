//! Typed models, registration policies and record mapping.

use crate::common::group_schema;
use chrono::{DateTime, TimeZone, Utc};
use document_odm::document::{ObjectId, Projection};
use document_odm::model::{Entity, ModelName};
use document_odm::schema::{FieldRequirement, Schema};
use document_odm::storage::{Database, Filter, InMemoryStore};
use document_odm::{DbRef, DuplicatePolicy, Instance, Odm, OdmError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

struct Group(Instance);

impl Entity for Group {
    fn model_name() -> ModelName {
        ModelName::from("group")
    }

    fn schema() -> Schema {
        group_schema()
    }

    fn from_instance(instance: Instance) -> Self {
        Group(instance)
    }

    fn instance(&self) -> &Instance {
        &self.0
    }

    fn instance_mut(&mut self) -> &mut Instance {
        &mut self.0
    }
}

impl Group {
    fn name(&self) -> Option<&str> {
        self.instance().get("name").and_then(|v| v.as_str())
    }
}

struct Person(Instance);

impl Entity for Person {
    fn model_name() -> ModelName {
        ModelName::new("person", "people")
    }

    fn schema() -> Schema {
        Schema::new()
            .required("name", FieldRequirement::NonEmptyString)
            .optional("group", FieldRequirement::reference("group"))
    }

    fn from_instance(instance: Instance) -> Self {
        Person(instance)
    }

    fn instance(&self) -> &Instance {
        &self.0
    }

    fn instance_mut(&mut self) -> &mut Instance {
        &mut self.0
    }
}

fn setup() -> (Odm, Database) {
    let odm = Odm::new();
    let db = Database::new("app", InMemoryStore::new());
    odm.register_entity::<Group>(&db).unwrap();
    odm.register_entity::<Person>(&db).unwrap();
    (odm, db)
}

#[test]
fn test_typed_queries() {
    let (odm, _db) = setup();

    for name in ["admins", "ops", "dev"] {
        let mut group: Group = odm.create_entity(json!({ "name": name })).unwrap();
        group.store().unwrap();
    }
    assert_eq!(odm.count_entities::<Group>(&Filter::new()).unwrap(), 3);

    let ops = odm
        .find_one_entity::<Group>(&Filter::new().eq("name", "ops"), None)
        .unwrap()
        .unwrap();
    assert_eq!(ops.name(), Some("ops"));

    let by_id = odm
        .find_entity_by_id::<Group>(ops.identifier().cloned().unwrap(), None)
        .unwrap()
        .unwrap();
    assert_eq!(by_id.name(), Some("ops"));

    let names: Vec<_> = odm
        .find_entities::<Group>(&Filter::new(), Some(&Projection::from(["name"])))
        .unwrap()
        .iter()
        .filter_map(|group| group.name().map(str::to_string))
        .collect();
    assert_eq!(names, ["admins", "ops", "dev"]);

    assert!(odm.create_entity::<Group>(json!({"name": ""})).is_err());
}

#[test]
fn test_entity_models_resolve_by_type_and_name() {
    let (odm, _db) = setup();

    let model = odm.model_for::<Person>().unwrap();
    assert_eq!(model.collection().name(), "people");
    assert!(Arc::ptr_eq(&model, &odm.model("person").unwrap()));
    assert!(Arc::ptr_eq(&model, &odm.model("people").unwrap()));
    assert!(model.entity_type_name().unwrap().ends_with("Person"));

    assert!(matches!(
        odm.model_for::<String>(),
        Err(OdmError::InvalidInstanceType { .. })
    ));
}

#[test]
fn test_removing_an_entity() {
    let (odm, _db) = setup();
    let mut group: Group = odm.create_entity(json!({"name": "admins"})).unwrap();
    group.store().unwrap();

    let mut person: Person = odm.create_entity(json!({"name": "Bert"})).unwrap();
    person.instance_mut().set_reference("group", Some(group.instance())).unwrap();
    person.store().unwrap();

    group.remove().unwrap();
    assert_eq!(odm.count_entities::<Group>(&Filter::new()).unwrap(), 0);
    assert!(person.instance().get_reference("group").unwrap().is_none());
}

#[test]
fn test_duplicate_registration_policies() {
    let (odm, db) = setup();
    assert!(matches!(
        odm.register("group", group_schema(), &db),
        Err(OdmError::DuplicateModel { .. })
    ));
    // The plural form is taken too
    assert!(matches!(
        odm.register(("crew", "groups"), group_schema(), &db),
        Err(OdmError::DuplicateModel { .. })
    ));
    assert!(matches!(
        odm.register_entity::<Group>(&db),
        Err(OdmError::DuplicateModel { .. })
    ));

    let odm = Odm::builder()
        .with_duplicate_registration(DuplicatePolicy::Replace)
        .build();
    odm.register_entity::<Group>(&db).unwrap();
    let relaxed = Schema::new().optional("name", FieldRequirement::String);
    odm.register("group", relaxed, &db).unwrap();

    assert_eq!(odm.registry().len(), 1);
    assert!(Instance::new(&odm, "group", json!({})).is_ok());
    assert!(odm.model_for::<Group>().is_err());
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PersonRecord {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    group: Option<DbRef>,
    #[serde(with = "document_odm::mapping::date")]
    joined: DateTime<Utc>,
}

#[test]
fn test_records_map_onto_instances() {
    let (odm, _db) = setup();
    let mut group: Group = odm.create_entity(json!({"name": "admins"})).unwrap();
    group.store().unwrap();

    let record = PersonRecord {
        id: ObjectId::new(),
        name: "Bert".to_string(),
        group: Some(group.instance().make_reference().unwrap()),
        joined: Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap(),
    };
    let mut person = Instance::from_record(&odm, "person", &record).unwrap();
    person.store().unwrap();

    let loaded: PersonRecord = odm.find_record_by_id("people", record.id).unwrap().unwrap();
    assert_eq!(loaded, record);

    let resolved = person.get_reference("group").unwrap().unwrap();
    assert_eq!(resolved.get("name"), Some(&json!("admins")));

    let dangling = PersonRecord {
        id: ObjectId::new(),
        group: Some(DbRef::new("groups", ObjectId::new())),
        ..record
    };
    assert!(Instance::from_record(&odm, "person", &dangling).is_err());
}
