//! Storage-specific error types.
//!
//! These errors describe failures of the document store itself and carry no
//! knowledge of schemas or models. The ODM layer wraps them in
//! [`OdmError::Storage`](crate::error::OdmError::Storage).

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A document with the same `_id` already exists.
    #[error("Duplicate key: {id} already exists in collection '{collection}'")]
    DuplicateKey { collection: String, id: String },

    /// The document or update cannot be stored.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// The backend is temporarily unreachable.
    #[error("Storage unavailable: {message}")]
    Unavailable { message: String },

    /// Generic internal storage error.
    #[error("Internal storage error: {message}")]
    Internal { message: String },
}

impl StorageError {
    /// Create a duplicate key error.
    pub fn duplicate_key(collection: impl Into<String>, id: impl ToString) -> Self {
        Self::DuplicateKey {
            collection: collection.into(),
            id: id.to_string(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Create an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
