//! Object-document mapping for Rust.
//!
//! Maps documents in a document database onto validated, typed instances with
//! composable schemas, cross-collection references, embedded snapshots and
//! end-of-scope persistence.
//!
//! # Core Components
//!
//! - [`Odm`] - Context owning the model registry, configuration and storage error handler
//! - [`Schema`](schema::Schema) - Declarative field requirements and the validation engine
//! - [`Instance`] - One document of a model, with dirty tracking and partial loads
//! - [`ScopedInstance`] - Guard that stores its instance when it leaves scope
//! - [`DbRef`] - Reference to a document in another collection
//! - [`EmbeddedInstance`] - Reference plus a projected snapshot of its target
//! - [`DocumentStore`](storage::DocumentStore) - Trait for storage backends
//!
//! # Quick Start
//!
//! ```rust
//! use document_odm::schema::{FieldRequirement, Schema};
//! use document_odm::storage::{Database, InMemoryStore};
//! use document_odm::{DbRef, Instance, Odm};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let odm = Odm::new();
//! let db = Database::new("app", InMemoryStore::new());
//!
//! odm.register("group", Schema::new().required("name", FieldRequirement::NonEmptyString), &db)?;
//! odm.register(
//!     "user",
//!     Schema::new()
//!         .required("username", FieldRequirement::NonEmptyString)
//!         .required("group", FieldRequirement::reference("group")),
//!     &db,
//! )?;
//!
//! let mut admins = Instance::new(&odm, "group", json!({"name": "admins"}))?;
//! admins.store()?;
//!
//! let reference = DbRef::for_instance(&admins)?;
//! let mut bert = Instance::new(&odm, "user", json!({"username": "Bert", "group": reference.to_value()}))?;
//! bert.store()?;
//!
//! let group = bert.get_reference("group")?.unwrap();
//! assert_eq!(group.get("name"), Some(&json!("admins")));
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod embedded;
pub mod error;
pub mod instance;
pub mod mapping;
pub mod model;
pub mod odm;
pub mod reference;
pub mod schema;
pub mod storage;

// Re-export commonly used types for convenience
pub use embedded::EmbeddedInstance;
pub use error::{OdmError, OdmResult, ValidationError, ValidationResult};
pub use instance::{Instance, LoadState, ScopedInstance};
pub use model::{DuplicatePolicy, Entity, Model, ModelName};
pub use odm::{Odm, OdmBuilder, OdmConfig, StorageErrorHandler};
pub use reference::DbRef;
