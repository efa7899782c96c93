//! The client-side validation hash.

use forma::Composite;
use forma_core::{Validator, Value};
use indexmap::IndexMap;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};

use crate::force::Force;

/// Field name to validator kind to rule descriptions, in export order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ValidationHash(IndexMap<String, IndexMap<String, Vec<Value>>>);

impl ValidationHash {
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&IndexMap<String, Vec<Value>>> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn into_inner(self) -> IndexMap<String, IndexMap<String, Vec<Value>>> {
        self.0
    }

    fn push(&mut self, field: &str, validator: &Validator) {
        self.0
            .entry(field.to_string())
            .or_default()
            .entry(validator.kind().as_str().to_string())
            .or_default()
            .push(validator.client_side_hash());
    }
}

/// Whether `validator` is exported for a record in the given state.
///
/// Conditional rules are exported only when forced, and then depend on their
/// `if`/`unless` predicates alone: a forced rule is not filtered by `on`.
fn usable(
    validator: &Validator,
    attribute: &str,
    new_record: bool,
    evaluate: impl Fn(&str) -> bool,
    force: &Force,
) -> bool {
    let kind = validator.kind().as_str();
    if force.turned_off(attribute, kind) {
        return false;
    }
    if validator.options().is_conditional() {
        return force.can_force(attribute, kind) && validator.conditions_hold(evaluate);
    }
    validator.applies(new_record, evaluate)
}

/// Describe the rules `composite` would enforce right now.
///
/// Composite-level rules come first. Association rules follow, keyed
/// `<association>_<attribute>`, for associations whose validation condition
/// currently holds. Rules from both that land on the same field are grouped
/// together. A composite is always a new record, so its own rules use the
/// `create` context; association rules use their entity's state.
#[must_use]
pub fn client_side_validation_hash(composite: &Composite, force: &Force) -> ValidationHash {
    let mut hash = ValidationHash::default();

    for validator in composite.kind().validators() {
        let attribute = validator.attribute();
        if usable(
            validator,
            attribute,
            !composite.persisted(),
            |p| composite.evaluate(p).unwrap_or(false),
            force,
        ) {
            hash.push(attribute, validator);
        }
    }

    for definition in composite.kind().definitions() {
        let name = definition.name();
        if !composite.should_validate_association(name) {
            continue;
        }
        let Some(entity) = composite.association(name) else {
            continue;
        };
        let scoped = force.scoped(&definition.prefix());
        let new_record = entity.is_new_record();
        for validator in entity.validators() {
            if usable(
                &validator,
                validator.attribute(),
                new_record,
                |p| entity.evaluate(p).unwrap_or(false),
                &scoped,
            ) {
                hash.push(&definition.namespaced(validator.attribute()), &validator);
            }
        }
    }

    tracing::debug!(
        composite = composite.kind().name(),
        fields = hash.len(),
        "exported client-side validations"
    );
    hash
}

/// JSON Schema of [`ValidationHash`].
#[must_use]
pub fn export_schema() -> Value {
    schema_for!(ValidationHash).to_value()
}
