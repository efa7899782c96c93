//! Declarative field validators.
//!
//! A `Validator` pairs an attribute with a rule (`ValidatorKind`) and
//! activation options. It can check a value and describe itself as a
//! client-side rule hash.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, json};

use crate::value::{Value, as_number, is_blank, render};

/// Lifecycle context a validator can be restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationContext {
    Create,
    Update,
}

impl ValidationContext {
    /// The context that applies to a record in the given state.
    #[must_use]
    pub const fn for_record(new_record: bool) -> Self {
        if new_record { Self::Create } else { Self::Update }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule a validator enforces.
#[derive(Debug, Clone)]
pub enum ValidatorKind {
    Presence,
    Numericality,
    Length {
        minimum: Option<usize>,
        maximum: Option<usize>,
    },
    Format(Regex),
}

impl ValidatorKind {
    /// Rule name used as the grouping key in exported rule hashes.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Presence => "presence",
            Self::Numericality => "numericality",
            Self::Length { .. } => "length",
            Self::Format(_) => "format",
        }
    }
}

impl PartialEq for ValidatorKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Presence, Self::Presence) | (Self::Numericality, Self::Numericality) => true,
            (
                Self::Length { minimum, maximum },
                Self::Length {
                    minimum: other_min,
                    maximum: other_max,
                },
            ) => minimum == other_min && maximum == other_max,
            (Self::Format(a), Self::Format(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for ValidatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Activation options shared by every validator kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Only run in this lifecycle context.
    pub on: Option<ValidationContext>,
    /// Only run when this named predicate holds.
    pub condition: Option<String>,
    /// Skip when this named predicate holds.
    pub unless: Option<String>,
    /// Replaces the default failure message(s).
    pub message: Option<String>,
}

impl ValidatorOptions {
    #[must_use]
    pub const fn is_conditional(&self) -> bool {
        self.condition.is_some() || self.unless.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Validator {
    attribute: String,
    kind: ValidatorKind,
    options: ValidatorOptions,
}

impl Validator {
    #[must_use]
    pub fn new(attribute: impl Into<String>, kind: ValidatorKind) -> Self {
        Self {
            attribute: attribute.into(),
            kind,
            options: ValidatorOptions::default(),
        }
    }

    #[must_use]
    pub fn presence(attribute: impl Into<String>) -> Self {
        Self::new(attribute, ValidatorKind::Presence)
    }

    #[must_use]
    pub fn numericality(attribute: impl Into<String>) -> Self {
        Self::new(attribute, ValidatorKind::Numericality)
    }

    #[must_use]
    pub fn length(
        attribute: impl Into<String>,
        minimum: Option<usize>,
        maximum: Option<usize>,
    ) -> Self {
        Self::new(attribute, ValidatorKind::Length { minimum, maximum })
    }

    /// # Errors
    ///
    /// Returns `regex::Error` if `pattern` does not compile.
    pub fn format(attribute: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::new(attribute, ValidatorKind::Format(Regex::new(pattern)?)))
    }

    #[must_use]
    pub const fn on(mut self, context: ValidationContext) -> Self {
        self.options.on = Some(context);
        self
    }

    /// Only run when the named predicate holds on the owning entity.
    #[must_use]
    pub fn when(mut self, predicate: impl Into<String>) -> Self {
        self.options.condition = Some(predicate.into());
        self
    }

    #[must_use]
    pub fn unless(mut self, predicate: impl Into<String>) -> Self {
        self.options.unless = Some(predicate.into());
        self
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.options.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    #[must_use]
    pub const fn kind(&self) -> &ValidatorKind {
        &self.kind
    }

    #[must_use]
    pub const fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Whether this validator runs for a record in the given state.
    ///
    /// `evaluate` resolves named predicates on the owning entity; unknown
    /// predicates should resolve to `false`.
    pub fn applies(&self, new_record: bool, evaluate: impl Fn(&str) -> bool) -> bool {
        if let Some(on) = self.options.on {
            if on != ValidationContext::for_record(new_record) {
                return false;
            }
        }
        self.conditions_hold(evaluate)
    }

    /// Whether the `if` and `unless` predicates allow this rule, ignoring
    /// its `on` context.
    pub fn conditions_hold(&self, evaluate: impl Fn(&str) -> bool) -> bool {
        if let Some(condition) = &self.options.condition {
            if !evaluate(condition) {
                return false;
            }
        }
        if let Some(unless) = &self.options.unless {
            if evaluate(unless) {
                return false;
            }
        }
        true
    }

    /// Check a value, returning the failure messages (empty when it passes).
    #[must_use]
    pub fn check(&self, value: Option<&Value>) -> Vec<String> {
        let value = value.unwrap_or(&Value::Null);
        let mut failures = Vec::new();
        match &self.kind {
            ValidatorKind::Presence => {
                if is_blank(value) {
                    failures.push(self.default_message("can't be blank"));
                }
            }
            ValidatorKind::Numericality => {
                if as_number(value).is_none() {
                    failures.push(self.default_message("is not a number"));
                }
            }
            ValidatorKind::Length { minimum, maximum } => {
                let length = render(value).chars().count();
                if let Some(min) = *minimum {
                    if length < min {
                        failures.push(self.default_message(&too_short(min)));
                    }
                }
                if let Some(max) = *maximum {
                    if length > max {
                        failures.push(self.default_message(&too_long(max)));
                    }
                }
            }
            ValidatorKind::Format(regex) => {
                if value.is_null() || !regex.is_match(&render(value)) {
                    failures.push(self.default_message("is invalid"));
                }
            }
        }
        failures
    }

    /// Describe this rule for a remote caller: kind parameters plus message
    /// text, without activation options.
    #[must_use]
    pub fn client_side_hash(&self) -> Value {
        match &self.kind {
            ValidatorKind::Presence => json!({ "message": self.default_message("can't be blank") }),
            ValidatorKind::Numericality => json!({
                "messages": { "numericality": self.default_message("is not a number") }
            }),
            ValidatorKind::Length { minimum, maximum } => {
                let mut messages = Map::new();
                let mut hash = Map::new();
                if let Some(min) = *minimum {
                    messages.insert("minimum".into(), self.default_message(&too_short(min)).into());
                    hash.insert("minimum".into(), min.into());
                }
                if let Some(max) = *maximum {
                    messages.insert("maximum".into(), self.default_message(&too_long(max)).into());
                    hash.insert("maximum".into(), max.into());
                }
                hash.insert("messages".into(), Value::Object(messages));
                Value::Object(hash)
            }
            ValidatorKind::Format(regex) => json!({
                "message": self.default_message("is invalid"),
                "with": regex.as_str(),
            }),
        }
    }

    fn default_message(&self, fallback: &str) -> String {
        self.options
            .message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

fn characters(count: usize) -> String {
    if count == 1 {
        "1 character".to_string()
    } else {
        format!("{count} characters")
    }
}

fn too_short(min: usize) -> String {
    format!("is too short (minimum is {})", characters(min))
}

fn too_long(max: usize) -> String {
    format!("is too long (maximum is {})", characters(max))
}
