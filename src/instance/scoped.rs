//! End-of-scope persistence.
//!
//! A [`ScopedInstance`] stores its instance when it goes out of scope. Drop has
//! no caller to return an error to, so a failed store there is passed to the
//! [`Odm`](crate::Odm)'s storage error handler with `implicit = true`. Call
//! [`close`](ScopedInstance::close) to flush explicitly and get the error back
//! instead.
//!
//! # Examples
//!
//! ```rust
//! use document_odm::schema::{FieldRequirement, Schema};
//! use document_odm::storage::{Database, Filter, InMemoryStore};
//! use document_odm::{Instance, Odm};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let odm = Odm::new();
//! let db = Database::new("app", InMemoryStore::new());
//! odm.register("group", Schema::new().required("name", FieldRequirement::String), &db)?;
//!
//! {
//!     let mut group = Instance::new(&odm, "group", json!({"name": "admins"}))?.scoped();
//!     group.set("name", "wheel")?;
//! } // stored here
//!
//! assert_eq!(odm.count("groups", &Filter::new().eq("name", "wheel"))?, 1);
//! # Ok(())
//! # }
//! ```

use super::Instance;
use crate::error::OdmResult;
use std::ops::{Deref, DerefMut};

/// Guard that stores an [`Instance`] when dropped.
///
/// Nothing is stored if auto-store is off or the instance was removed.
#[derive(Debug)]
pub struct ScopedInstance {
    instance: Instance,
    store_automatically: bool,
    armed: bool,
}

impl ScopedInstance {
    /// Guard an instance, taking the auto-store flag from its context's
    /// configuration.
    pub fn new(instance: Instance) -> Self {
        let store_automatically = instance.odm().config().store_scoped_automatically;
        Self::with_auto_store(instance, store_automatically)
    }

    pub fn with_auto_store(instance: Instance, store_automatically: bool) -> Self {
        Self {
            instance,
            store_automatically,
            armed: true,
        }
    }

    pub fn store_automatically(&self) -> bool {
        self.store_automatically
    }

    pub fn set_store_automatically(&mut self, enabled: bool) {
        self.store_automatically = enabled;
    }

    /// Flush now, returning any storage error, and disarm the guard.
    pub fn close(mut self) -> OdmResult<()> {
        self.armed = false;
        if self.should_flush() {
            self.instance.store()
        } else {
            Ok(())
        }
    }

    /// Disarm the guard and hand back the instance without storing it.
    pub fn into_inner(mut self) -> Instance {
        self.armed = false;
        self.instance.take()
    }

    fn should_flush(&self) -> bool {
        self.store_automatically && !self.instance.is_removed()
    }
}

impl Deref for ScopedInstance {
    type Target = Instance;

    fn deref(&self) -> &Instance {
        &self.instance
    }
}

impl DerefMut for ScopedInstance {
    fn deref_mut(&mut self) -> &mut Instance {
        &mut self.instance
    }
}

impl Drop for ScopedInstance {
    fn drop(&mut self) {
        if !self.armed || !self.should_flush() {
            return;
        }

        if let Err(e) = self.instance.store() {
            self.instance
                .odm()
                .report_storage_error(&e, &self.instance, true);
        }
    }
}
