//! Declarative document schemas and the validation engine.
//!
//! A schema is an ordered list of named field rules. Each rule carries a
//! [`FieldRequirement`], a recursive predicate that may nest other schemas or
//! combine other requirements. Validation returns the first failure in
//! declaration order as a [`ValidationError`](crate::error::ValidationError).
//!
//! # Key Types
//!
//! - [`Schema`] - Ordered field rules
//! - [`FieldRequirement`] - One node of the predicate tree
//! - [`FieldScope`] - Restricts validation to (or away from) a projection
//! - [`ReferenceLookup`] - Existence checks used by `Reference` requirements
//!
//! # Examples
//!
//! ```rust
//! use document_odm::schema::{DetachedLookup, FieldRequirement, FieldScope, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::new()
//!     .required("username", FieldRequirement::NonEmptyString)
//!     .optional("age", FieldRequirement::Number);
//!
//! let doc = json!({"username": "Bert", "age": false});
//! let err = schema
//!     .validate(doc.as_object().unwrap(), FieldScope::All, &DetachedLookup)
//!     .unwrap_err();
//! assert_eq!(err.field(), Some("age"));
//! ```

pub mod expression;
pub mod types;
pub mod validation;


pub use types::{AbsencePolicy, FieldRequirement, FieldScope, FieldSpec, Pattern, Schema};
pub use validation::{DetachedLookup, ReferenceLookup, ReferenceStatus};
