//! Storing and removing instances.

use super::{Instance, LoadState};
use crate::document::{Document, ID_FIELD, ObjectId, get_path};
use crate::error::{OdmError, OdmResult};
use crate::storage::{Filter, Update};
use log::debug;
use serde_json::Value;
use std::mem;

impl Instance {
    /// Persist the instance.
    ///
    /// A new instance is inserted whole, after assigning an `_id` if it has
    /// none. An existing instance sends only its dirty paths: present values as
    /// `$set`, removed ones as `$unset`. Nothing is sent when nothing is dirty.
    ///
    /// # Errors
    ///
    /// - [`OdmError::Storage`] if the store call fails
    /// - [`OdmError::DocumentNotFound`] if a partial instance's stored document
    ///   has disappeared; a whole instance is re-inserted instead
    pub fn store(&mut self) -> OdmResult<()> {
        if self.is_new {
            self.validate()?;
            return self.insert();
        }

        if self.dirty.is_empty() {
            debug!("Nothing to store for {} instance", self.model.name());
            return Ok(());
        }

        self.validate()?;
        let id = self.require_identifier()?;
        let update = self.pending_update();
        let collection = self.model.collection();
        let outcome = collection.update_one(&Filter::by_id(id.clone()), &update, false)?;

        if outcome.matched == 0 {
            match self.state {
                LoadState::Whole => {
                    debug!("{} {} vanished, inserting it again", self.model.name(), id);
                    collection.insert(self.document.clone())?;
                }
                LoadState::Partial(_) => {
                    return Err(OdmError::document_not_found(collection.name(), id));
                }
            }
        }

        debug!(
            "Updated {} {} ({} path(s))",
            self.model.name(),
            id,
            self.dirty.len()
        );
        self.dirty.clear();
        Ok(())
    }

    /// Replace the stored document with this instance's document, inserting it
    /// when absent.
    ///
    /// # Errors
    ///
    /// - [`OdmError::PartialReplace`] on a partial instance, whose document
    ///   would erase every field outside the projection
    /// - [`OdmError::InvalidInstanceDocument`] if the document fails validation
    pub fn replace(&mut self) -> OdmResult<()> {
        if self.is_partial() {
            return Err(OdmError::PartialReplace);
        }
        self.validate()?;

        self.assign_identifier();
        let id = self.require_identifier()?;
        let outcome = self.model.collection().replace_one(
            &Filter::by_id(id.clone()),
            self.document.clone(),
            true,
        )?;
        debug!(
            "Replaced {} {} (upserted: {})",
            self.model.name(),
            id,
            outcome.upserted
        );

        self.mark_stored();
        Ok(())
    }

    /// Delete the stored document and disable implicit persistence.
    ///
    /// The in-memory document is kept. A later explicit [`store`](Self::store)
    /// inserts it again. A failed delete leaves the instance as it was.
    pub fn remove(&mut self) -> OdmResult<()> {
        if self.is_new {
            self.removed = true;
            return Ok(());
        }

        let id = self.require_identifier()?;
        let removed = self.model.collection().remove(&Filter::by_id(id.clone()), 1)?;
        debug!(
            "Removed {} {} ({} document(s))",
            self.model.name(),
            id,
            removed
        );

        self.is_new = true;
        self.removed = true;
        self.dirty.clear();
        Ok(())
    }

    /// The update a [`store`](Self::store) of an existing instance would send.
    pub fn pending_update(&self) -> Update {
        self.dirty
            .iter()
            .fold(Update::new(), |update, path| match get_path(&self.document, path) {
                Some(value) => update.set(path.as_str(), value.clone()),
                None => update.unset(path.as_str()),
            })
    }

    fn insert(&mut self) -> OdmResult<()> {
        self.assign_identifier();
        self.model.collection().insert(self.document.clone())?;
        debug!(
            "Inserted {} {}",
            self.model.name(),
            self.identifier().map(Value::to_string).unwrap_or_default()
        );

        self.mark_stored();
        Ok(())
    }

    /// Assign a fresh `_id` if the document has none. The identifier is placed
    /// first in the document.
    fn assign_identifier(&mut self) {
        if self.document.contains_key(ID_FIELD) {
            return;
        }

        let mut document = Document::new();
        document.insert(ID_FIELD.to_string(), ObjectId::new().to_value());
        document.extend(mem::take(&mut self.document));
        self.document = document;
    }

    fn require_identifier(&self) -> OdmResult<Value> {
        self.identifier().cloned().ok_or(OdmError::MissingIdentifier)
    }

    fn mark_stored(&mut self) {
        self.is_new = false;
        self.removed = false;
        self.dirty.clear();
    }
}
