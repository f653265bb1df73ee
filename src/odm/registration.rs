//! Model registration.

use super::Odm;
use crate::error::OdmResult;
use crate::model::{Entity, EntityType, Model, ModelName};
use crate::schema::Schema;
use crate::storage::Database;
use log::{debug, warn};
use std::sync::Arc;

impl Odm {
    /// Register a model under `name`, bound to the collection named by the
    /// plural form in `database`.
    ///
    /// When validator push-down is enabled, the schema's validator expression is
    /// installed on the collection. A failed install is logged and otherwise
    /// ignored.
    ///
    /// # Errors
    ///
    /// [`OdmError::DuplicateModel`](crate::error::OdmError::DuplicateModel) if the
    /// name is taken and duplicates are rejected.
    pub fn register(
        &self,
        name: impl Into<ModelName>,
        schema: Schema,
        database: &Database,
    ) -> OdmResult<Arc<Model>> {
        self.insert_model(Model::new(name.into(), schema, database, None))
    }

    /// Register the model for an [`Entity`] type, so it can be looked up by type.
    pub fn register_entity<T: Entity>(&self, database: &Database) -> OdmResult<Arc<Model>> {
        let model = Model::new(
            T::model_name(),
            T::schema(),
            database,
            Some(EntityType::of::<T>()),
        );
        self.insert_model(model)
    }

    fn insert_model(&self, model: Model) -> OdmResult<Arc<Model>> {
        let model = self
            .registry()
            .insert(model, self.config().duplicate_registration)?;
        debug!("Registered model {}", model);

        if self.config().push_validators {
            let validator = model.schema().to_validator();
            match model.collection().install_validator(&validator) {
                Ok(()) => debug!("Installed validator on {}", model.collection()),
                Err(e) => warn!(
                    "Could not install validator on {}: {}",
                    model.collection(),
                    e
                ),
            }
        }

        Ok(model)
    }
}
