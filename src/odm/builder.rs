//! Configuration and builder for [`Odm`] contexts.

use super::Odm;
use crate::model::DuplicatePolicy;

/// Behavior switches for an [`Odm`] context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OdmConfig {
    /// Install each model's schema as a server-side validator on registration.
    /// Failures to install are logged and otherwise ignored.
    pub push_validators: bool,

    /// Validate documents read from storage before building instances.
    pub validate_on_load: bool,

    /// Initial value of the auto-store flag of new scoped instances.
    pub store_scoped_automatically: bool,

    /// What registering a name or type twice does.
    pub duplicate_registration: DuplicatePolicy,

    /// Skip stored documents that fail validation in multi-document finds
    /// instead of failing the whole query.
    pub skip_invalid_on_find: bool,
}

impl Default for OdmConfig {
    fn default() -> Self {
        Self {
            push_validators: true,
            validate_on_load: true,
            store_scoped_automatically: true,
            duplicate_registration: DuplicatePolicy::Reject,
            skip_invalid_on_find: true,
        }
    }
}

/// Builder for [`Odm`] contexts.
///
/// # Examples
///
/// ```rust
/// use document_odm::{DuplicatePolicy, Odm};
///
/// let odm = Odm::builder()
///     .with_validator_push_down(false)
///     .with_duplicate_registration(DuplicatePolicy::Replace)
///     .build();
///
/// assert!(!odm.config().push_validators);
/// assert_eq!(odm.config().duplicate_registration, DuplicatePolicy::Replace);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OdmBuilder {
    config: OdmConfig,
}

impl OdmBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator_push_down(mut self, enabled: bool) -> Self {
        self.config.push_validators = enabled;
        self
    }

    /// Whether documents loaded from storage are validated.
    pub fn with_validation_on_load(mut self, enabled: bool) -> Self {
        self.config.validate_on_load = enabled;
        self
    }

    pub fn with_scoped_auto_store(mut self, enabled: bool) -> Self {
        self.config.store_scoped_automatically = enabled;
        self
    }

    pub fn with_duplicate_registration(mut self, policy: DuplicatePolicy) -> Self {
        self.config.duplicate_registration = policy;
        self
    }

    pub fn with_skip_invalid_on_find(mut self, enabled: bool) -> Self {
        self.config.skip_invalid_on_find = enabled;
        self
    }

    pub fn with_config(mut self, config: OdmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Odm {
        Odm::with_config(self.config)
    }
}
