//! Model registry.
//!
//! The registry maps both name forms and the registered entity type to a shared
//! [`Model`]. It is guarded by an `RwLock`, so registration and lookup may run
//! from any thread. Registration is expected at startup; afterwards the
//! registry is read-mostly.

use super::{EntityType, Model, ModelName};
use crate::error::{OdmError, OdmResult};
use log::debug;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// What registering an already taken name or type does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Fail with [`OdmError::DuplicateModel`].
    #[default]
    Reject,
    /// Drop every conflicting model and register the new one.
    Replace,
}

#[derive(Debug, Default)]
struct Entries {
    models: Vec<Arc<Model>>,
    by_name: HashMap<String, Arc<Model>>,
    by_type: HashMap<TypeId, Arc<Model>>,
}

impl Entries {
    fn conflicts(&self, model: &Model) -> Vec<Arc<Model>> {
        let type_id = model.entity_type().map(|t| t.id);
        self.models
            .iter()
            .filter(|existing| {
                existing.name().overlaps(model.name())
                    || (type_id.is_some() && existing.entity_type().map(|t| t.id) == type_id)
            })
            .cloned()
            .collect()
    }

    fn evict(&mut self, model: &Arc<Model>) {
        self.models.retain(|m| !Arc::ptr_eq(m, model));
        self.by_name.retain(|_, m| !Arc::ptr_eq(m, model));
        self.by_type.retain(|_, m| !Arc::ptr_eq(m, model));
    }
}

/// Concurrency-safe mapping from model name and entity type to [`Model`].
#[derive(Debug, Default)]
pub struct ModelRegistry {
    entries: RwLock<Entries>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model.
    ///
    /// # Errors
    ///
    /// With [`DuplicatePolicy::Reject`], fails with [`OdmError::DuplicateModel`]
    /// if either name form or the entity type is already registered.
    pub fn insert(&self, model: Model, policy: DuplicatePolicy) -> OdmResult<Arc<Model>> {
        let mut entries = self.write();

        let conflicts = entries.conflicts(&model);
        if let Some(existing) = conflicts.first() {
            if policy == DuplicatePolicy::Reject {
                return Err(OdmError::DuplicateModel {
                    name: existing.name().singular().to_string(),
                });
            }
            for conflict in &conflicts {
                debug!("Replacing registered model '{}'", conflict.name());
                entries.evict(conflict);
            }
        }

        let model = Arc::new(model);
        let name = model.name();
        entries
            .by_name
            .insert(name.singular().to_string(), Arc::clone(&model));
        entries
            .by_name
            .insert(name.plural().to_string(), Arc::clone(&model));
        if let Some(EntityType { id, .. }) = model.entity_type() {
            entries.by_type.insert(id, Arc::clone(&model));
        }
        entries.models.push(Arc::clone(&model));

        Ok(model)
    }

    /// Look a model up by its singular or plural name.
    ///
    /// # Errors
    ///
    /// [`OdmError::InvalidInstanceType`] if nothing is registered under `name`.
    pub fn get(&self, name: &str) -> OdmResult<Arc<Model>> {
        self.read()
            .by_name
            .get(name)
            .cloned()
            .ok_or_else(|| OdmError::invalid_instance_type(name))
    }

    /// Look up the model registered for the Rust type `T`.
    pub fn get_for<T: 'static>(&self) -> OdmResult<Arc<Model>> {
        self.read()
            .by_type
            .get(&TypeId::of::<T>())
            .cloned()
            .ok_or_else(|| OdmError::invalid_instance_type(std::any::type_name::<T>()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().by_name.contains_key(name)
    }

    /// All registered models in registration order.
    pub fn models(&self) -> Vec<Arc<Model>> {
        self.read().models.clone()
    }

    pub fn len(&self) -> usize {
        self.read().models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Writers never leave the maps half-updated, so a poisoned lock still holds
    // consistent data.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
