//! The ODM context object.
//!
//! An [`Odm`] owns the model registry, the configuration, and the handler that
//! receives storage errors from implicit persistence. It replaces ambient global
//! state: everything that registers or looks up models is handed an `Odm`.
//! Clones share the same registry and handler.
//!
//! # Examples
//!
//! ```rust
//! use document_odm::schema::{FieldRequirement, Schema};
//! use document_odm::storage::{Database, InMemoryStore};
//! use document_odm::{Instance, Odm};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let odm = Odm::new();
//! let db = Database::new("app", InMemoryStore::new());
//! odm.register("group", Schema::new().required("name", FieldRequirement::String), &db)?;
//!
//! let mut group = Instance::new(&odm, "group", json!({"name": "admins"}))?;
//! group.store()?;
//!
//! let id = group.identifier().cloned().unwrap();
//! let found = odm.find_by_id("groups", id, None)?.unwrap();
//! assert_eq!(found.get("name"), Some(&json!("admins")));
//! # Ok(())
//! # }
//! ```

mod builder;
mod operations;
mod registration;

pub use builder::{OdmBuilder, OdmConfig};

use crate::document::{ID_FIELD, as_document};
use crate::error::{OdmError, OdmResult};
use crate::instance::Instance;
use crate::model::{Model, ModelRegistry};
use crate::reference::DbRef;
use crate::schema::{ReferenceLookup, ReferenceStatus};
use crate::storage::Filter;
use log::{error, trace};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Receives errors raised while storing an instance where no caller can see
/// them. Arguments: the error, the instance, and whether the store was
/// implicit (end of scope).
pub type StorageErrorHandler = Arc<dyn Fn(&OdmError, &Instance, bool) + Send + Sync>;

struct OdmInner {
    registry: ModelRegistry,
    config: OdmConfig,
    error_handler: RwLock<StorageErrorHandler>,
}

/// Shared context for model registration, lookup and persistence.
#[derive(Clone)]
pub struct Odm {
    inner: Arc<OdmInner>,
}

impl Odm {
    /// A context with the default configuration.
    pub fn new() -> Self {
        Self::with_config(OdmConfig::default())
    }

    pub fn with_config(config: OdmConfig) -> Self {
        Self {
            inner: Arc::new(OdmInner {
                registry: ModelRegistry::new(),
                config,
                error_handler: RwLock::new(default_error_handler()),
            }),
        }
    }

    pub fn builder() -> OdmBuilder {
        OdmBuilder::new()
    }

    pub fn config(&self) -> &OdmConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.inner.registry
    }

    /// Look a model up by singular or plural name.
    pub fn model(&self, name: &str) -> OdmResult<Arc<Model>> {
        self.inner.registry.get(name)
    }

    /// Look up the model registered for the Rust type `T`.
    pub fn model_for<T: 'static>(&self) -> OdmResult<Arc<Model>> {
        self.inner.registry.get_for::<T>()
    }

    /// Replace the handler for storage errors from implicit persistence.
    ///
    /// The default handler logs the error at `error` level.
    pub fn set_storage_error_handler<F>(&self, handler: F)
    where
        F: Fn(&OdmError, &Instance, bool) + Send + Sync + 'static,
    {
        *self
            .inner
            .error_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(handler);
    }

    /// Restore the logging handler.
    pub fn reset_storage_error_handler(&self) {
        *self
            .inner
            .error_handler
            .write()
            .unwrap_or_else(PoisonError::into_inner) = default_error_handler();
    }

    pub(crate) fn report_storage_error(&self, err: &OdmError, instance: &Instance, implicit: bool) {
        // Clone out of the lock so a handler may replace itself
        let handler = Arc::clone(
            &self
                .inner
                .error_handler
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        );
        handler(err, instance, implicit);
    }
}

impl Default for Odm {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Odm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Odm")
            .field("models", &self.inner.registry.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

fn default_error_handler() -> StorageErrorHandler {
    Arc::new(|err: &OdmError, instance: &Instance, implicit: bool| {
        error!(
            "Failed to store {} instance {} ({}): {}",
            instance.model().name(),
            instance
                .identifier()
                .map(Value::to_string)
                .unwrap_or_else(|| "without identifier".to_string()),
            if implicit { "implicit" } else { "explicit" },
            err
        );
    })
}

impl ReferenceLookup for Odm {
    fn check_reference(&self, model: &str, value: &Value) -> Result<ReferenceStatus, OdmError> {
        let target = match self.model(model) {
            Ok(target) => target,
            Err(OdmError::InvalidInstanceType { .. }) => return Ok(ReferenceStatus::UnknownModel),
            Err(e) => return Err(e),
        };

        // A payload must point into the target model's collection
        let id = match as_document(value) {
            Some(payload) => {
                let Some(reference) = DbRef::from_document(payload) else {
                    return Ok(ReferenceStatus::Malformed);
                };
                if !reference.targets(target.collection()) {
                    trace!("Reference {} is not a '{}' reference", reference, model);
                    return Ok(ReferenceStatus::WrongTarget);
                }
                reference.id().clone()
            }
            None => value.clone(),
        };

        let filter = Filter::new().eq(ID_FIELD, id.clone());
        let count = target.collection().count(&filter)?;
        trace!(
            "Reference {} in {} matched {} document(s)",
            id,
            target.collection(),
            count
        );

        Ok(if count == 1 {
            ReferenceStatus::Found
        } else {
            ReferenceStatus::NotFound
        })
    }
}
