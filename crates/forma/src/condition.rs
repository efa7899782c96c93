//! Association validation conditions and declaration options.

use std::fmt;

use forma_core::{Attributes, Value};
use serde::{Serialize, Serializer};

use crate::error::FormError;

/// Whether an association's invalidity propagates into the composite.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum ValidationCondition {
    /// Always validate the sub-entity and merge its errors.
    #[default]
    Always,
    /// Never consult the sub-entity's validity.
    Never,
    /// Resolve this composite predicate at validation time.
    NamedPredicate(String),
}

impl ValidationCondition {
    #[must_use]
    pub fn predicate(name: impl Into<String>) -> Self {
        Self::NamedPredicate(name.into())
    }

    /// The predicate name, for `NamedPredicate` conditions.
    #[must_use]
    pub fn predicate_name(&self) -> Option<&str> {
        match self {
            Self::NamedPredicate(name) => Some(name),
            Self::Always | Self::Never => None,
        }
    }
}

impl fmt::Display for ValidationCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("always"),
            Self::Never => f.write_str("never"),
            Self::NamedPredicate(name) => f.write_str(name),
        }
    }
}

/// Accepts `true`, `false`, or a non-empty predicate name.
impl TryFrom<&Value> for ValidationCondition {
    type Error = FormError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(true) => Ok(Self::Always),
            Value::Bool(false) => Ok(Self::Never),
            Value::String(name) if !name.trim().is_empty() => Ok(Self::NamedPredicate(name.clone())),
            other => Err(FormError::configuration(format!(
                "the `validate` option only accepts true, false, or a predicate name (got {other})"
            ))),
        }
    }
}

/// Serializes the way it is accepted: booleans or the predicate name.
impl Serialize for ValidationCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Always => serializer.serialize_bool(true),
            Self::Never => serializer.serialize_bool(false),
            Self::NamedPredicate(name) => serializer.serialize_str(name),
        }
    }
}

/// Options accepted when declaring an association.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssociationOptions {
    pub validate: Option<ValidationCondition>,
}

impl AssociationOptions {
    #[must_use]
    pub fn validate(mut self, condition: ValidationCondition) -> Self {
        self.validate = Some(condition);
        self
    }

    /// Parse an options map. Only the `validate` key is recognised.
    ///
    /// # Errors
    ///
    /// Returns `FormError::Configuration` for unknown keys or a `validate`
    /// value of the wrong shape.
    pub fn from_map(options: &Attributes) -> Result<Self, FormError> {
        let mut parsed = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "validate" => parsed.validate = Some(ValidationCondition::try_from(value)?),
                unknown => {
                    return Err(FormError::configuration(format!(
                        "unknown association option `{unknown}`"
                    )));
                }
            }
        }
        Ok(parsed)
    }
}
