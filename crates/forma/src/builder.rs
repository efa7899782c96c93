//! Resolves one association's sub-entity from flat construction input.
//!
//! With a primary key in the input (`<name>_<pk>`), the stored instance is
//! loaded and overlaid with the namespaced input. Without one, a new instance
//! is constructed from the namespaced input alone and the store is never
//! touched.

use forma_core::{Attributes, Entity, Store, Value};

use crate::definition::AssociationDefinition;
use crate::error::FormError;

pub struct AssociationBuilder<'a> {
    definition: &'a AssociationDefinition,
    input: &'a Attributes,
}

impl<'a> AssociationBuilder<'a> {
    #[must_use]
    pub const fn new(definition: &'a AssociationDefinition, input: &'a Attributes) -> Self {
        Self { definition, input }
    }

    /// Input keys starting with `<name>_`, prefix stripped, in input order.
    #[must_use]
    pub fn association_attributes(&self) -> Attributes {
        let prefix = self.definition.prefix();
        self.input
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(&prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect()
    }

    /// The primary-key value supplied for this association, if the target
    /// kind supports key lookup and the value is neither `null` nor `""`.
    #[must_use]
    pub fn primary_key_value(&self) -> Option<&'a Value> {
        let field = self.definition.kind().primary_key()?;
        self.input
            .get(&self.definition.namespaced(field))
            .filter(|value| !value.is_null() && value.as_str().is_none_or(|s| !s.is_empty()))
    }

    /// # Errors
    ///
    /// Returns `FormError::NotFound` when the supplied primary key matches no
    /// stored record, or any error raised while applying the input.
    pub fn build(&self, store: &dyn Store) -> Result<Box<dyn Entity>, FormError> {
        let attributes = self.association_attributes();
        let kind = self.definition.kind();

        if let Some(key) = self.primary_key_value() {
            let mut entity = kind.find(store, key)?;
            entity.assign(&attributes)?;
            tracing::debug!(
                association = self.definition.name(),
                kind = kind.name(),
                key = %key,
                overrides = attributes.len(),
                "loaded association from store"
            );
            Ok(entity)
        } else {
            let entity = kind.instantiate(&attributes)?;
            tracing::debug!(
                association = self.definition.name(),
                kind = kind.name(),
                "constructed new association"
            );
            Ok(entity)
        }
    }
}
