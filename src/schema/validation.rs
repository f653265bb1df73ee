//! Schema validation logic.
//!
//! Validation walks the schema in declaration order and stops at the first
//! failure. Data-shape problems always come back as a [`ValidationError`]; the
//! only external calls are reference existence checks, which go through a
//! [`ReferenceLookup`] so the engine stays independent of any registry or store.

use super::types::{AbsencePolicy, FieldRequirement, FieldScope, FieldSpec, Schema};
use crate::document::{Document, ValueKind};
use crate::error::{OdmError, ValidationError, ValidationResult};
use log::warn;
use serde_json::Value;

/// Outcome of checking one reference value against its target model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceStatus {
    /// Exactly one matching document exists
    Found,
    /// The target model exists but no document matched
    NotFound,
    /// No model is registered under the requested name
    UnknownModel,
    /// The stored sub-document is not a usable reference payload
    Malformed,
    /// The payload points into a collection or database other than the
    /// target model's
    WrongTarget,
}

/// Existence checks for `Reference` requirements.
///
/// A sub-document value is a reference payload to parse and resolve; any other
/// value is a bare identifier to count in the target model's collection.
pub trait ReferenceLookup {
    fn check_reference(&self, model: &str, value: &Value) -> Result<ReferenceStatus, OdmError>;
}

/// Lookup for schemas validated without a registry: every model is unknown,
/// so any `Reference` requirement fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedLookup;

impl ReferenceLookup for DetachedLookup {
    fn check_reference(&self, _model: &str, _value: &Value) -> Result<ReferenceStatus, OdmError> {
        Ok(ReferenceStatus::UnknownModel)
    }
}

impl Schema {
    /// Validate a document against this schema.
    ///
    /// # Arguments
    /// * `document` - The document to check
    /// * `scope` - Which declared fields take part (all, only a projection, or all but a projection)
    /// * `lookup` - Reference existence checks
    ///
    /// # Examples
    ///
    /// ```rust
    /// use document_odm::schema::{DetachedLookup, FieldRequirement, FieldScope, Schema};
    /// use serde_json::json;
    ///
    /// let groups = Schema::new().required("name", FieldRequirement::String);
    ///
    /// let ok = json!({"name": "bob"});
    /// assert!(groups.validate(ok.as_object().unwrap(), FieldScope::All, &DetachedLookup).is_ok());
    ///
    /// let missing = json!({"bob": true});
    /// let err = groups
    ///     .validate(missing.as_object().unwrap(), FieldScope::All, &DetachedLookup)
    ///     .unwrap_err();
    /// assert!(err.to_string().contains("name"));
    /// ```
    pub fn validate(
        &self,
        document: &Document,
        scope: FieldScope<'_>,
        lookup: &dyn ReferenceLookup,
    ) -> ValidationResult<()> {
        self.validate_fields(document, "", scope, lookup)
    }

    /// Validate an arbitrary value, which must be a document.
    pub fn validate_value(
        &self,
        value: &Value,
        scope: FieldScope<'_>,
        lookup: &dyn ReferenceLookup,
    ) -> ValidationResult<()> {
        let document = value.as_object().ok_or(ValidationError::NotADocument)?;
        self.validate(document, scope, lookup)
    }

    fn validate_fields(
        &self,
        document: &Document,
        prefix: &str,
        scope: FieldScope<'_>,
        lookup: &dyn ReferenceLookup,
    ) -> ValidationResult<()> {
        for spec in self.fields() {
            let path = join_path(prefix, spec.name());
            if !scope.covers(&path) {
                continue;
            }
            spec.validate_in(document, &path, scope, lookup)?;
        }
        Ok(())
    }
}

impl FieldSpec {
    fn validate_in(
        &self,
        document: &Document,
        path: &str,
        scope: FieldScope<'_>,
        lookup: &dyn ReferenceLookup,
    ) -> ValidationResult<()> {
        let Some(value) = document.get(self.name()) else {
            return match (self.is_required(), self.requirement()) {
                (false, _) | (true, FieldRequirement::Anything(AbsencePolicy::Accept)) => Ok(()),
                (true, _) => Err(ValidationError::missing_required(path)),
            };
        };

        self.requirement().check(value, path, scope, lookup)
    }
}

impl FieldRequirement {
    /// Validate a present value. `path` is the field path used in diagnostics.
    pub fn validate(
        &self,
        value: &Value,
        path: &str,
        lookup: &dyn ReferenceLookup,
    ) -> ValidationResult<()> {
        self.check(value, path, FieldScope::All, lookup)
    }

    fn check(
        &self,
        value: &Value,
        path: &str,
        scope: FieldScope<'_>,
        lookup: &dyn ReferenceLookup,
    ) -> ValidationResult<()> {
        let kind = ValueKind::of(value);

        match self {
            Self::String => self.expect_kind(kind == ValueKind::String, path, kind),
            Self::Number => self.expect_kind(kind.is_number(), path, kind),
            Self::Date => self.expect_kind(kind == ValueKind::Date, path, kind),
            Self::AnyObject => self.expect_kind(kind == ValueKind::Document, path, kind),
            Self::Bool => self.expect_kind(kind == ValueKind::Bool, path, kind),
            Self::ObjectId => self.expect_kind(kind == ValueKind::ObjectId, path, kind),
            Self::NonEmptyString => match value {
                Value::String(s) if s.is_empty() => Err(ValidationError::EmptyString {
                    field: path.to_string(),
                }),
                Value::String(_) => Ok(()),
                _ => self.expect_kind(false, path, kind),
            },
            Self::Reference(model) => check_reference(model, value, path, lookup),
            Self::Object(schema) => match value {
                Value::Object(document) if kind == ValueKind::Document => {
                    schema.validate_fields(document, path, scope, lookup)
                }
                _ => self.expect_kind(false, path, kind),
            },
            Self::Enumeration(values) => {
                if values.contains(value) {
                    Ok(())
                } else {
                    Err(ValidationError::NotInEnumeration {
                        field: path.to_string(),
                    })
                }
            }
            Self::ArrayOf(element) => {
                let Value::Array(items) = value else {
                    return self.expect_kind(false, path, kind);
                };
                for (index, item) in items.iter().enumerate() {
                    element.check(item, &format!("{}.{}", path, index), scope, lookup)?;
                }
                Ok(())
            }
            Self::AnyOf(requirements) => {
                if requirements
                    .iter()
                    .any(|r| r.check(value, path, scope, lookup).is_ok())
                {
                    Ok(())
                } else {
                    Err(ValidationError::NoRequirementMatched {
                        field: path.to_string(),
                    })
                }
            }
            Self::AllOf(requirements) => requirements
                .iter()
                .try_for_each(|r| r.check(value, path, scope, lookup)),
            Self::ExactValue(expected) => {
                if expected == value {
                    Ok(())
                } else {
                    Err(ValidationError::ValueMismatch {
                        field: path.to_string(),
                        expected: expected.to_string(),
                    })
                }
            }
            Self::MatchingRegex(pattern) => match value {
                Value::String(s) if pattern.is_match(s) => Ok(()),
                Value::String(_) => Err(ValidationError::PatternMismatch {
                    field: path.to_string(),
                    pattern: pattern.source().to_string(),
                }),
                _ => Err(ValidationError::invalid_type(path, "string", kind.name())),
            },
            Self::Anything(AbsencePolicy::Accept) => Ok(()),
            Self::Anything(AbsencePolicy::Reject) => {
                if value.is_null() {
                    Err(ValidationError::missing_required(path))
                } else {
                    Ok(())
                }
            }
        }
    }

    fn expect_kind(&self, matches: bool, path: &str, actual: ValueKind) -> ValidationResult<()> {
        if matches {
            Ok(())
        } else {
            Err(ValidationError::invalid_type(
                path,
                self.describe(),
                actual.name(),
            ))
        }
    }
}

fn check_reference(
    model: &str,
    value: &Value,
    path: &str,
    lookup: &dyn ReferenceLookup,
) -> ValidationResult<()> {
    let status = match lookup.check_reference(model, value) {
        Ok(status) => status,
        Err(e) => {
            warn!("Reference lookup for '{}' failed: {}", path, e);
            return Err(ValidationError::LookupFailure {
                field: path.to_string(),
            });
        }
    };

    let reason = match status {
        ReferenceStatus::Found => return Ok(()),
        ReferenceStatus::NotFound => "no matching document could be found",
        ReferenceStatus::UnknownModel => "that model is not registered",
        ReferenceStatus::Malformed => "the stored value does not form a usable reference",
        ReferenceStatus::WrongTarget => "it points into a different collection",
    };

    Err(ValidationError::unresolvable_reference(path, model, reason))
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}
