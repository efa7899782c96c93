//! Association definitions.

use std::sync::Arc;

use forma_core::EntityKind;

use crate::condition::{AssociationOptions, ValidationCondition};
use crate::error::FormError;

/// One named association: which entity kind it refers to and when it is validated.
///
/// Created once when a composite type is declared and immutable afterwards.
#[derive(Debug, Clone)]
pub struct AssociationDefinition {
    name: String,
    kind: Arc<dyn EntityKind>,
    options: AssociationOptions,
}

impl AssociationDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: Arc<dyn EntityKind>, options: AssociationOptions) -> Self {
        Self {
            name: name.into(),
            kind,
            options,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &Arc<dyn EntityKind> {
        &self.kind
    }

    /// Attribute names of the target kind, in its declaration order.
    ///
    /// # Errors
    ///
    /// Returns `FormError::Configuration` if the kind cannot enumerate them.
    pub fn attributes(&self) -> Result<Vec<String>, FormError> {
        self.kind.attribute_names().ok_or_else(|| {
            FormError::configuration(format!(
                "association `{}` refers to {}, which cannot report its attribute names",
                self.name,
                self.kind.name()
            ))
        })
    }

    /// The declared condition, `Always` when none was given.
    #[must_use]
    pub fn validation_condition(&self) -> ValidationCondition {
        self.options.validate.clone().unwrap_or_default()
    }

    /// `<name>_`, the prefix of every namespaced key of this association.
    #[must_use]
    pub fn prefix(&self) -> String {
        format!("{}_", self.name)
    }

    /// `<name>_<attribute>`.
    #[must_use]
    pub fn namespaced(&self, attribute: &str) -> String {
        format!("{}_{attribute}", self.name)
    }
}
