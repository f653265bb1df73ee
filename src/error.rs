//! Error types for ODM operations.
//!
//! Validation failures are carried by [`ValidationError`], a structured enum whose
//! `Display` output is the human-readable, field-path-qualified reason. Everything an
//! explicit operation can fail with is collected in [`OdmError`].

use crate::storage::StorageError;

/// Main error type for ODM operations.
#[derive(Debug, thiserror::Error)]
pub enum OdmError {
    /// No model is registered for the requested type or name
    #[error("No model registered for '{name}'")]
    InvalidInstanceType { name: String },

    /// A document did not satisfy the model's schema
    #[error("Invalid instance document: {0}")]
    InvalidInstanceDocument(#[from] ValidationError),

    /// A reference resolved against an existing model but no document matched
    #[error("Referenced document {id} not found in collection '{collection}'")]
    ReferenceNotFound { collection: String, id: String },

    /// A reference field holds a payload pointing outside the declared model
    #[error("Field '{field}' must reference '{expected}', but points at {found}")]
    WrongReferenceTarget {
        field: String,
        expected: String,
        found: String,
    },

    /// A reference names a database other than the one its collection is
    /// registered in
    #[error("Reference {reference} cannot be resolved: '{collection}' is registered in database '{registered}'")]
    ForeignDatabase {
        reference: String,
        collection: String,
        registered: String,
    },

    /// A model with the same name is already registered
    #[error("Model '{name}' is already registered")]
    DuplicateModel { name: String },

    /// A stored value could not be read as a reference payload
    #[error("Field '{field}' does not hold a usable reference")]
    MalformedReference { field: String },

    /// Full-document replacement was requested on a projected instance
    #[error("Cannot replace the stored document from a partially loaded instance")]
    PartialReplace,

    /// The instance has no `_id` to address it by
    #[error("Instance has no identifier")]
    MissingIdentifier,

    /// An attempt to change an `_id` that was already assigned
    #[error("The identifier of an instance cannot be changed once assigned")]
    ImmutableIdentifier,

    /// The stored document an existing instance was loaded from is gone
    #[error("Document {id} no longer exists in collection '{collection}'")]
    DocumentNotFound { collection: String, id: String },

    /// Errors from the document store
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regex requirement could not be compiled
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Reasons a value fails a schema.
///
/// Each variant names the offending field path so the rendered message can be
/// shown to a user as is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Required field is missing
    #[error("Required field '{field}' is missing")]
    MissingRequiredField { field: String },

    /// Value is of the wrong kind
    #[error("Field '{field}' has invalid type, expected {expected}, got {actual}")]
    InvalidType {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("Field '{field}' is of type string but is empty")]
    EmptyString { field: String },

    #[error("Field '{field}' does not match any value in the enumeration")]
    NotInEnumeration { field: String },

    #[error("Field '{field}' does not match the expected value {expected}")]
    ValueMismatch { field: String, expected: String },

    #[error("Field '{field}' does not match pattern '{pattern}'")]
    PatternMismatch { field: String, pattern: String },

    #[error("Field '{field}' does not match any provided requirement")]
    NoRequirementMatched { field: String },

    /// Reference target is unregistered, malformed or absent
    #[error("Field '{field}' is a reference to a '{model}' instance, but {reason}")]
    UnresolvableReference {
        field: String,
        model: String,
        reason: String,
    },

    /// Database lookup failed while checking a reference
    #[error("Database lookup error while validating field '{field}'")]
    LookupFailure { field: String },

    /// The validated value is not a document
    #[error("Value is not a document")]
    NotADocument,
}

impl OdmError {
    /// Create an invalid instance type error
    pub fn invalid_instance_type(name: impl Into<String>) -> Self {
        Self::InvalidInstanceType { name: name.into() }
    }

    pub fn reference_not_found(collection: impl Into<String>, id: impl ToString) -> Self {
        Self::ReferenceNotFound {
            collection: collection.into(),
            id: id.to_string(),
        }
    }

    pub fn document_not_found(collection: impl Into<String>, id: impl ToString) -> Self {
        Self::DocumentNotFound {
            collection: collection.into(),
            id: id.to_string(),
        }
    }
}

impl ValidationError {
    /// Create a missing required field error
    pub fn missing_required(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    /// Create an invalid type error
    pub fn invalid_type(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidType {
            field: field.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn unresolvable_reference(
        field: impl Into<String>,
        model: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvableReference {
            field: field.into(),
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// The field path this failure was reported for, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField { field }
            | Self::InvalidType { field, .. }
            | Self::EmptyString { field }
            | Self::NotInEnumeration { field }
            | Self::ValueMismatch { field, .. }
            | Self::PatternMismatch { field, .. }
            | Self::NoRequirementMatched { field }
            | Self::UnresolvableReference { field, .. }
            | Self::LookupFailure { field } => Some(field),
            Self::NotADocument => None,
        }
    }

    /// The rendered reason string.
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

// Result type aliases for convenience
pub type OdmResult<T> = Result<T, OdmError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
