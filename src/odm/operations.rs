//! Queries that build instances from stored documents.
//!
//! Every query names its model by singular or plural name (or by type for the
//! `*_entity` variants). A projection turns the results into partial
//! instances, validated only over the projected fields.

use super::Odm;
use crate::document::{Document, ID_FIELD, Projection};
use crate::error::{OdmError, OdmResult, ValidationError};
use crate::instance::{Instance, LoadState};
use crate::model::{Entity, Model};
use crate::storage::Filter;
use log::{trace, warn};
use serde_json::Value;
use std::sync::Arc;

impl Odm {
    /// Count the documents of a model matching `filter`.
    pub fn count(&self, model: &str, filter: &Filter) -> OdmResult<usize> {
        Ok(self.model(model)?.collection().count(filter)?)
    }

    /// The first matching instance, if any.
    pub fn find_one(
        &self,
        model: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> OdmResult<Option<Instance>> {
        self.load_one(self.model(model)?, filter, projection)
    }

    /// Every matching instance.
    ///
    /// With `skip_invalid_on_find` set, stored documents that fail validation
    /// are logged and left out; otherwise the first one fails the query.
    pub fn find(
        &self,
        model: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> OdmResult<Vec<Instance>> {
        self.load_many(self.model(model)?, filter, projection)
    }

    /// The instance whose `_id` equals `id`, if any.
    pub fn find_by_id(
        &self,
        model: &str,
        id: impl Into<Value>,
        projection: Option<&Projection>,
    ) -> OdmResult<Option<Instance>> {
        self.load_by_id(self.model(model)?, id.into(), projection)
    }

    /// The stored instance with this `_id`, or a new one carrying only the `_id`
    /// when none is stored. The new instance is not validated.
    pub fn find_or_create(&self, model: &str, id: impl Into<Value>) -> OdmResult<Instance> {
        let model = self.model(model)?;
        let id = id.into();
        if let Some(found) = self.load_by_id(Arc::clone(&model), id.clone(), None)? {
            return Ok(found);
        }

        let mut document = Document::new();
        document.insert(ID_FIELD.to_string(), id);
        Instance::for_model(self, model, document, false)
    }

    /// Typed [`find_one`](Self::find_one).
    pub fn find_one_entity<T: Entity>(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> OdmResult<Option<T>> {
        Ok(self
            .load_one(self.model_for::<T>()?, filter, projection)?
            .map(T::from_instance))
    }

    /// Typed [`find`](Self::find).
    pub fn find_entities<T: Entity>(
        &self,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> OdmResult<Vec<T>> {
        Ok(self
            .load_many(self.model_for::<T>()?, filter, projection)?
            .into_iter()
            .map(T::from_instance)
            .collect())
    }

    /// Typed [`find_by_id`](Self::find_by_id).
    pub fn find_entity_by_id<T: Entity>(
        &self,
        id: impl Into<Value>,
        projection: Option<&Projection>,
    ) -> OdmResult<Option<T>> {
        Ok(self
            .load_by_id(self.model_for::<T>()?, id.into(), projection)?
            .map(T::from_instance))
    }

    /// Build a new, validated entity from a document.
    pub fn create_entity<T: Entity>(&self, document: Value) -> OdmResult<T> {
        let Value::Object(document) = document else {
            return Err(ValidationError::NotADocument.into());
        };
        Instance::for_model(self, self.model_for::<T>()?, document, true).map(T::from_instance)
    }

    /// Typed [`count`](Self::count).
    pub fn count_entities<T: Entity>(&self, filter: &Filter) -> OdmResult<usize> {
        Ok(self.model_for::<T>()?.collection().count(filter)?)
    }

    pub(crate) fn load_by_id(
        &self,
        model: Arc<Model>,
        id: Value,
        projection: Option<&Projection>,
    ) -> OdmResult<Option<Instance>> {
        self.load_one(model, &Filter::by_id(id), projection)
    }

    fn load_one(
        &self,
        model: Arc<Model>,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> OdmResult<Option<Instance>> {
        let found = model.collection().find_one(filter, projection)?;
        trace!(
            "find_one in {} matched: {}",
            model.collection(),
            found.is_some()
        );

        found
            .map(|document| Instance::from_stored(self, model, document, load_state(projection)))
            .transpose()
    }

    fn load_many(
        &self,
        model: Arc<Model>,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> OdmResult<Vec<Instance>> {
        let documents = model.collection().find(filter, projection)?;
        let mut instances = Vec::with_capacity(documents.len());

        for document in documents {
            let id = document.get(ID_FIELD).cloned();
            match Instance::from_stored(self, Arc::clone(&model), document, load_state(projection))
            {
                Ok(instance) => instances.push(instance),
                Err(OdmError::InvalidInstanceDocument(e)) if self.config().skip_invalid_on_find => {
                    warn!(
                        "Skipping invalid {} document {}: {}",
                        model.name(),
                        id.map(|id| id.to_string()).unwrap_or_default(),
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Ok(instances)
    }
}

fn load_state(projection: Option<&Projection>) -> LoadState {
    match projection {
        Some(projection) => LoadState::Partial(projection.clone()),
        None => LoadState::Whole,
    }
}
