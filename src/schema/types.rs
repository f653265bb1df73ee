//! Core schema type definitions.
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s. Each spec pairs a field name
//! with a [`FieldRequirement`], the recursive predicate the field's value must
//! satisfy, and marks the field required or optional.

use crate::document::Projection;
use crate::error::OdmResult;
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::fmt;

/// Declarative set of field rules a document must satisfy.
///
/// Fields are validated in declaration order, so the first reported failure is
/// deterministic.
///
/// # Examples
///
/// ```rust
/// use document_odm::schema::{FieldRequirement, Schema};
///
/// let users = Schema::new()
///     .required("username", FieldRequirement::NonEmptyString)
///     .optional("age", FieldRequirement::Number)
///     .required("group", FieldRequirement::reference("group"));
///
/// assert_eq!(users.fields().len(), 3);
/// assert!(users.requirement("group").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// An empty schema; every document satisfies it.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a required field.
    pub fn required(self, name: impl Into<String>, requirement: FieldRequirement) -> Self {
        self.with_field(FieldSpec::required(name, requirement))
    }

    /// Declare an optional field.
    pub fn optional(self, name: impl Into<String>, requirement: FieldRequirement) -> Self {
        self.with_field(FieldSpec::optional(name, requirement))
    }

    /// Add a field spec. A spec with an already declared name replaces the
    /// earlier one in place.
    pub fn with_field(mut self, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Find the requirement declared for a dotted path, descending through
    /// nested `Object` requirements.
    pub fn requirement(&self, path: &str) -> Option<&FieldRequirement> {
        match path.split_once('.') {
            None => self.field(path).map(FieldSpec::requirement),
            Some((head, rest)) => match self.field(head)?.requirement() {
                FieldRequirement::Object(nested) => nested.requirement(rest),
                _ => None,
            },
        }
    }
}

impl<S: Into<String>> FromIterator<(S, FieldRequirement, bool)> for Schema {
    fn from_iter<I: IntoIterator<Item = (S, FieldRequirement, bool)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |schema, (name, requirement, required)| {
                schema.with_field(FieldSpec {
                    name: name.into(),
                    requirement,
                    required,
                })
            })
    }
}

/// One named field of a [`Schema`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    requirement: FieldRequirement,
    required: bool,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, requirement: FieldRequirement) -> Self {
        Self {
            name: name.into(),
            requirement,
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, requirement: FieldRequirement) -> Self {
        Self {
            name: name.into(),
            requirement,
            required: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requirement(&self) -> &FieldRequirement {
        &self.requirement
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// How the `Anything` requirement treats a field that is missing or `null`.
///
/// Historic behavior differed between releases, so the choice is explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbsencePolicy {
    /// A missing or `null` value fails validation.
    #[default]
    Reject,
    /// Every value passes, including none at all.
    Accept,
}

/// One node of the recursive validation predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRequirement {
    /// A string value
    String,
    /// An `int32`, `int64` or `double` value
    Number,
    /// A `$date` timestamp
    Date,
    /// Any sub-document
    AnyObject,
    Bool,
    /// A string of at least one character
    NonEmptyString,
    /// An `$oid` identifier
    ObjectId,
    /// A reference to an existing instance of the named model, either as a
    /// bare identifier or a `{"$ref", "$id"}` payload
    Reference(String),
    /// A sub-document satisfying a nested schema
    Object(Schema),
    /// One of the listed values (exact value and type)
    Enumeration(Vec<Value>),
    /// An array whose every element satisfies the requirement
    ArrayOf(Box<FieldRequirement>),
    /// At least one of the requirements
    AnyOf(Vec<FieldRequirement>),
    /// Every one of the requirements
    AllOf(Vec<FieldRequirement>),
    /// Exactly this value (value and type)
    ExactValue(Value),
    /// A string matching the pattern
    MatchingRegex(Pattern),
    Anything(AbsencePolicy),
}

impl FieldRequirement {
    /// Reference to the model registered under `model` (singular or plural name).
    pub fn reference(model: impl Into<String>) -> Self {
        Self::Reference(model.into())
    }

    pub fn object(schema: Schema) -> Self {
        Self::Object(schema)
    }

    pub fn array_of(element: FieldRequirement) -> Self {
        Self::ArrayOf(Box::new(element))
    }

    pub fn any_of(requirements: impl IntoIterator<Item = FieldRequirement>) -> Self {
        Self::AnyOf(requirements.into_iter().collect())
    }

    pub fn all_of(requirements: impl IntoIterator<Item = FieldRequirement>) -> Self {
        Self::AllOf(requirements.into_iter().collect())
    }

    pub fn enumeration<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::Enumeration(values.into_iter().map(Into::into).collect())
    }

    pub fn exactly(value: impl Into<Value>) -> Self {
        Self::ExactValue(value.into())
    }

    /// A regex requirement. `options` may contain `i`, `m`, `s` and `x`.
    ///
    /// # Errors
    ///
    /// Returns [`OdmError::InvalidPattern`](crate::error::OdmError::InvalidPattern)
    /// if the pattern does not compile.
    pub fn matching_regex(pattern: &str, options: &str) -> OdmResult<Self> {
        Ok(Self::MatchingRegex(Pattern::new(pattern, options)?))
    }

    /// Any present, non-null value.
    pub fn anything() -> Self {
        Self::Anything(AbsencePolicy::Reject)
    }

    /// Any value, or none.
    pub fn anything_or_absent() -> Self {
        Self::Anything(AbsencePolicy::Accept)
    }

    /// The model named by a `Reference` requirement.
    pub fn referenced_model(&self) -> Option<&str> {
        match self {
            Self::Reference(model) => Some(model),
            _ => None,
        }
    }

    /// Short description used as the "expected" part of diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Number => "number".to_string(),
            Self::Date => "date".to_string(),
            Self::AnyObject | Self::Object(_) => "object".to_string(),
            Self::Bool => "bool".to_string(),
            Self::NonEmptyString => "non-empty string".to_string(),
            Self::ObjectId => "objectId".to_string(),
            Self::Reference(model) => format!("reference to '{}'", model),
            Self::Enumeration(values) => format!("one of {}", Value::Array(values.clone())),
            Self::ArrayOf(element) => format!("array of {}", element.describe()),
            Self::AnyOf(_) => "any of the listed requirements".to_string(),
            Self::AllOf(_) => "all of the listed requirements".to_string(),
            Self::ExactValue(value) => value.to_string(),
            Self::MatchingRegex(pattern) => format!("string matching '{}'", pattern.source()),
            Self::Anything(_) => "any value".to_string(),
        }
    }
}

/// A compiled regular expression together with its source and option letters.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    options: String,
    regex: Regex,
}

impl Pattern {
    /// Compile a pattern. Option letters: `i` case-insensitive, `m` multi-line,
    /// `s` dot matches newline, `x` ignore whitespace. Unknown letters are ignored.
    pub fn new(source: &str, options: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(options.contains('i'))
            .multi_line(options.contains('m'))
            .dot_matches_new_line(options.contains('s'))
            .ignore_whitespace(options.contains('x'))
            .build()?;

        Ok(Self {
            source: source.to_string(),
            options: options.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn options(&self) -> &str {
        &self.options
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.options == other.options
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.options)
    }
}

/// Which declared fields a validation pass looks at.
#[derive(Debug, Clone, Copy, Default)]
pub enum FieldScope<'a> {
    /// Every declared field
    #[default]
    All,
    /// Only fields inside the projection (partial loads)
    Only(&'a Projection),
    /// Every field except those inside the projection
    Ignoring(&'a Projection),
}

impl FieldScope<'_> {
    /// Whether the field at `path` is validated under this scope.
    pub fn covers(&self, path: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(projection) => projection.includes(path),
            Self::Ignoring(projection) => !projection.fields().iter().any(|field| {
                field == path
                    || path
                        .strip_prefix(field.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            }),
        }
    }
}
