//! Rendering schemas as server-side validator expressions.
//!
//! The output is a query-operator document (`$and`, `$or`, `$type`, `$in`, ...)
//! that a document store can enforce on writes. Rendering is a pure function of
//! the schema. Rules that cannot be expressed structurally, such as reference
//! existence, are narrowed to the kinds of value they accept.

use super::types::{AbsencePolicy, FieldRequirement, FieldSpec, Schema};
use serde_json::{Value, json};

impl Schema {
    /// Render this schema as a validator expression.
    ///
    /// An empty schema renders as `{}`, which every document satisfies.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use document_odm::schema::{FieldRequirement, Schema};
    /// use serde_json::json;
    ///
    /// let groups = Schema::new().required("name", FieldRequirement::String);
    /// assert_eq!(
    ///     groups.to_validator(),
    ///     json!({"$and": [{"name": {"$type": "string"}}]})
    /// );
    /// ```
    pub fn to_validator(&self) -> Value {
        let predicates = self.field_predicates("");
        if predicates.is_empty() {
            json!({})
        } else {
            json!({ "$and": predicates })
        }
    }

    fn field_predicates(&self, prefix: &str) -> Vec<Value> {
        self.fields()
            .iter()
            .map(|spec| {
                let path = if prefix.is_empty() {
                    spec.name().to_string()
                } else {
                    format!("{}.{}", prefix, spec.name())
                };
                spec.predicate(&path)
            })
            .collect()
    }
}

impl FieldSpec {
    fn predicate(&self, path: &str) -> Value {
        let present = self.requirement().predicate(path);
        if self.is_required() {
            present
        } else {
            json!({ "$or": [present, { path: { "$exists": false } }] })
        }
    }
}

impl FieldRequirement {
    /// Render the predicate a document must satisfy for the value at `path`.
    pub fn predicate(&self, path: &str) -> Value {
        match self {
            Self::AnyOf(requirements) => json!({
                "$or": requirements.iter().map(|r| r.predicate(path)).collect::<Vec<_>>()
            }),
            Self::AllOf(requirements) => json!({
                "$and": requirements.iter().map(|r| r.predicate(path)).collect::<Vec<_>>()
            }),
            Self::Object(schema) => {
                let mut clauses = vec![json!({ path: { "$type": "object" } })];
                clauses.extend(schema.field_predicates(path));
                json!({ "$and": clauses })
            }
            Self::ArrayOf(element) => json!({ path: element.array_operator() }),
            Self::Anything(AbsencePolicy::Accept) => json!({}),
            _ => match self.operator() {
                Some(operator) => json!({ path: operator }),
                None => json!({}),
            },
        }
    }

    /// The operator document for requirements that constrain a single value
    /// in place. Composite requirements have none.
    fn operator(&self) -> Option<Value> {
        let operator = match self {
            Self::String => json!({ "$type": "string" }),
            Self::Number => json!({ "$type": ["double", "int", "long"] }),
            Self::Date => json!({ "$type": "date" }),
            Self::AnyObject => json!({ "$type": "object" }),
            Self::Bool => json!({ "$type": "bool" }),
            Self::NonEmptyString => json!({ "$type": "string", "$ne": "" }),
            Self::ObjectId => json!({ "$type": "objectId" }),
            Self::Reference(_) => json!({ "$type": ["objectId", "object"] }),
            Self::Enumeration(values) => json!({ "$in": values }),
            Self::ExactValue(value) => json!({ "$eq": value }),
            Self::MatchingRegex(pattern) => json!({
                "$regex": pattern.source(),
                "$options": pattern.options(),
            }),
            Self::Anything(AbsencePolicy::Reject) => json!({ "$exists": true, "$ne": null }),
            Self::Anything(AbsencePolicy::Accept)
            | Self::Object(_)
            | Self::ArrayOf(_)
            | Self::AnyOf(_)
            | Self::AllOf(_) => return None,
        };
        Some(operator)
    }

    /// Operator for an array whose every element satisfies `self`: no element
    /// may fail the element predicate.
    fn array_operator(&self) -> Value {
        if let Some(operator) = self.operator() {
            return json!({
                "$type": "array",
                "$not": { "$elemMatch": { "$not": operator } },
            });
        }

        match self {
            Self::Object(schema) => json!({
                "$type": "array",
                "$not": { "$elemMatch": { "$nor": [schema.to_validator()] } },
            }),
            _ => json!({ "$type": "array" }),
        }
    }
}
