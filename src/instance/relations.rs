//! Reference and embedded-snapshot fields.

use super::Instance;
use crate::document::{Projection, as_document};
use crate::embedded::EmbeddedInstance;
use crate::error::{OdmError, OdmResult};
use crate::reference::DbRef;
use crate::schema::FieldRequirement;
use log::trace;

impl Instance {
    /// A reference to this instance.
    ///
    /// # Errors
    ///
    /// [`OdmError::MissingIdentifier`] before the instance has an `_id`.
    pub fn make_reference(&self) -> OdmResult<DbRef> {
        DbRef::for_instance(self)
    }

    /// Resolve the instance referenced by the field at `path`.
    ///
    /// Returns `Ok(None)` when the schema does not declare `path` as a
    /// reference, when the field is absent, or when no document matches. The
    /// result is always an instance of the declared model: a stored reference
    /// payload must point into that model's collection, and any other value is
    /// taken as the target's `_id`.
    ///
    /// # Errors
    ///
    /// - [`OdmError::MalformedReference`] if the field holds a sub-document that
    ///   is not a reference payload
    /// - [`OdmError::WrongReferenceTarget`] if the payload points elsewhere
    /// - [`OdmError::InvalidInstanceType`] if the target model is not registered
    pub fn get_reference(&self, path: &str) -> OdmResult<Option<Instance>> {
        let Some(model) = self
            .model
            .schema()
            .requirement(path)
            .and_then(FieldRequirement::referenced_model)
        else {
            return Ok(None);
        };
        let Some(value) = self.get(path) else {
            return Ok(None);
        };

        let target = self.odm.model(model)?;
        let id = match as_document(value) {
            Some(payload) => {
                let reference =
                    DbRef::from_document(payload).ok_or_else(|| OdmError::MalformedReference {
                        field: path.to_string(),
                    })?;
                if !reference.targets(target.collection()) {
                    return Err(OdmError::WrongReferenceTarget {
                        field: path.to_string(),
                        expected: model.to_string(),
                        found: reference.to_string(),
                    });
                }
                reference.id().clone()
            }
            None => value.clone(),
        };

        trace!("Resolving '{}' as a {} reference", path, model);
        self.odm.load_by_id(target, id, None)
    }

    /// Point the field at `path` to `target`, or clear it with `None`.
    ///
    /// The stored form is a reference payload.
    pub fn set_reference(&mut self, path: &str, target: Option<&Instance>) -> OdmResult<()> {
        match target {
            Some(target) => {
                let reference = target.make_reference()?;
                self.set(path, reference.to_value())
            }
            None => self.unset(path).map(|_| ()),
        }
    }

    /// The embedded snapshot stored at `path`, if the field holds one.
    pub fn get_embedded_instance(&self, path: &str) -> Option<EmbeddedInstance> {
        EmbeddedInstance::from_value(self.get(path)?)
    }

    /// Store a snapshot of `target`, restricted to `projection`, at `path`.
    ///
    /// The snapshot is read through the reference from the stored document, so
    /// unsaved changes on `target` are not embedded. It is not refreshed when
    /// `target` changes later.
    pub fn set_embedded_instance(
        &mut self,
        path: &str,
        target: &Instance,
        projection: Projection,
    ) -> OdmResult<()> {
        let embedded = EmbeddedInstance::from_instance(target, projection)?;
        let value = embedded.to_value(&self.odm)?;
        self.set(path, value)
    }
}
