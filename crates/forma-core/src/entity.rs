//! The entity capability consumed by composites.
//!
//! `EntityKind` is the type-level half (attribute enumeration, construction,
//! primary-key lookup); `Entity` is the instance-level half (attribute
//! reads/writes, validity, member invocation). Both are object safe so a
//! composite can hold heterogeneous sub-entities behind `Box<dyn Entity>`.

use std::any::Any;
use std::fmt;

use crate::errors::{EntityError, StoreError};
use crate::store::Store;
use crate::validation::{Errors, Validator};
use crate::value::{Attributes, Value};

/// Type-level description of an entity.
pub trait EntityKind: fmt::Debug + Send + Sync {
    /// Kind name, used for store lookups and diagnostics.
    fn name(&self) -> &str;

    /// Ordered attribute names, or `None` when the kind cannot enumerate them.
    fn attribute_names(&self) -> Option<Vec<String>>;

    /// Construct a new instance from attributes alone. Never touches a store.
    ///
    /// # Errors
    ///
    /// Returns `EntityError` if an attribute cannot be applied.
    fn instantiate(&self, attributes: &Attributes) -> Result<Box<dyn Entity>, EntityError>;

    /// Primary-key field designator, for kinds that support key lookup.
    fn primary_key(&self) -> Option<&str> {
        None
    }

    /// Hydrate the stored instance identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns `EntityError::Store` wrapping `StoreError::NotFound` when no
    /// record matches, or `StoreError::Unsupported` for kinds without lookup.
    fn find(&self, store: &dyn Store, key: &Value) -> Result<Box<dyn Entity>, EntityError> {
        let _ = (store, key);
        Err(StoreError::Unsupported {
            kind: self.name().to_string(),
            operation: "find",
        }
        .into())
    }
}

/// A live entity instance.
///
/// Readers are addressed by attribute name, writers by `name=`; both are
/// reachable through [`Entity::invoke`] alongside any other members the
/// entity exposes.
pub trait Entity: fmt::Debug + Any {
    fn kind_name(&self) -> &str;

    /// Read an attribute. `None` when the entity has no such attribute.
    fn read(&self, attribute: &str) -> Option<Value>;

    /// Write an attribute.
    ///
    /// # Errors
    ///
    /// Returns `EntityError::UnknownMember` if the attribute is not writable.
    fn write(&mut self, attribute: &str, value: Value) -> Result<(), EntityError>;

    /// Overlay attributes onto this instance. Input values win over current
    /// ones; names the entity does not know are skipped.
    ///
    /// # Errors
    ///
    /// Propagates any write failure other than an unknown attribute.
    fn assign(&mut self, attributes: &Attributes) -> Result<(), EntityError> {
        for (name, value) in attributes {
            match self.write(name, value.clone()) {
                Ok(()) => {}
                Err(EntityError::UnknownMember { .. }) => {
                    tracing::debug!(entity = self.kind_name(), attribute = %name, "skipping unknown attribute");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Run this entity's validators. Empty means valid.
    fn validate(&self) -> Errors {
        Errors::new()
    }

    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Declared validators, for tooling that describes rules without running them.
    fn validators(&self) -> Vec<Validator> {
        Vec::new()
    }

    /// Whether this instance has never been stored.
    fn is_new_record(&self) -> bool {
        true
    }

    /// Evaluate a named zero-argument predicate. `None` if it does not exist.
    fn evaluate(&self, predicate: &str) -> Option<bool> {
        let _ = predicate;
        None
    }

    fn responds_to(&self, member: &str) -> bool;

    /// Invoke a member by name with positional arguments.
    ///
    /// # Errors
    ///
    /// Returns `EntityError::UnknownMember` for members the entity does not
    /// expose, `EntityError::InvalidArguments` on arity mismatch, or whatever
    /// the member itself fails with.
    fn invoke(&mut self, member: &str, args: &[Value]) -> Result<Value, EntityError>;

    /// The persist operation, if this entity has one.
    fn as_persist(&mut self) -> Option<&mut dyn Persist> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Optional capability: write this entity through a store.
pub trait Persist {
    /// # Errors
    ///
    /// Returns `EntityError` if the store rejects the write.
    fn persist(&mut self, store: &mut dyn Store) -> Result<(), EntityError>;
}
