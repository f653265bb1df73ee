//! Typed wrappers around instances.

use super::ModelName;
use crate::error::OdmResult;
use crate::instance::Instance;
use crate::schema::Schema;
use serde_json::Value;

/// A Rust type that stands for the instances of one model.
///
/// Implementors wrap an [`Instance`] and add typed accessors on top of it.
/// Register the type with [`Odm::register_entity`](crate::Odm::register_entity)
/// and query it with the `*_entity` operations on [`Odm`](crate::Odm).
///
/// # Examples
///
/// ```rust
/// use document_odm::model::{Entity, ModelName};
/// use document_odm::schema::{FieldRequirement, Schema};
/// use document_odm::Instance;
///
/// struct Group(Instance);
///
/// impl Entity for Group {
///     fn model_name() -> ModelName {
///         ModelName::from("group")
///     }
///
///     fn schema() -> Schema {
///         Schema::new().required("name", FieldRequirement::String)
///     }
///
///     fn from_instance(instance: Instance) -> Self {
///         Group(instance)
///     }
///
///     fn instance(&self) -> &Instance {
///         &self.0
///     }
///
///     fn instance_mut(&mut self) -> &mut Instance {
///         &mut self.0
///     }
/// }
///
/// impl Group {
///     fn name(&self) -> Option<&str> {
///         self.instance().get("name").and_then(|v| v.as_str())
///     }
/// }
/// ```
pub trait Entity: Sized + 'static {
    /// Name the model is registered under.
    fn model_name() -> ModelName;

    fn schema() -> Schema;

    fn from_instance(instance: Instance) -> Self;

    fn instance(&self) -> &Instance;

    fn instance_mut(&mut self) -> &mut Instance;

    fn identifier(&self) -> Option<&Value> {
        self.instance().identifier()
    }

    fn store(&mut self) -> OdmResult<()> {
        self.instance_mut().store()
    }

    fn remove(&mut self) -> OdmResult<()> {
        self.instance_mut().remove()
    }
}
