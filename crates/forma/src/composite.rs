//! Composite instances.
//!
//! A `Composite` owns one sub-entity per declared association plus its own
//! scalar attributes. Reads and writes on namespaced keys go through the
//! type's slot table to the owning sub-entity; validation merges each
//! association's errors under `<association>_<field>`; `save` persists every
//! sub-entity that can be persisted, inside one store transaction when the
//! instance asks for it.

use std::sync::Arc;

use forma_core::{Attributes, Detached, Entity, EntityError, Errors, Store, Value};
use indexmap::IndexMap;
use serde_json::Map;

use crate::builder::AssociationBuilder;
use crate::condition::ValidationCondition;
use crate::error::FormError;
use crate::registry::{CompositeType, Slot};

#[derive(Debug)]
pub struct Composite {
    pub(crate) kind: Arc<CompositeType>,
    values: IndexMap<String, Value>,
    pub(crate) associations: IndexMap<String, Box<dyn Entity>>,
    errors: Errors,
    use_transaction: bool,
}

impl Composite {
    /// Build a composite from flat input without a backing store.
    ///
    /// # Errors
    ///
    /// Fails if the input supplies a primary key for an association: key
    /// lookup needs a store, see [`Composite::load`].
    pub fn new(kind: &Arc<CompositeType>, input: &Attributes) -> Result<Self, FormError> {
        Self::load(kind, input, &Detached)
    }

    /// Build a composite from flat input, loading associations whose primary
    /// key is supplied from `store`.
    ///
    /// # Errors
    ///
    /// Returns `FormError::NotFound` if a supplied primary key matches no
    /// stored record.
    pub fn load(kind: &Arc<CompositeType>, input: &Attributes, store: &dyn Store) -> Result<Self, FormError> {
        let mut associations = IndexMap::with_capacity(kind.definitions().len());
        for definition in kind.definitions() {
            let entity = AssociationBuilder::new(definition, input).build(store)?;
            associations.insert(definition.name().to_string(), entity);
        }

        let mut composite = Self {
            kind: Arc::clone(kind),
            values: kind
                .own_attributes()
                .iter()
                .map(|name| (name.clone(), Value::Null))
                .collect(),
            associations,
            errors: Errors::new(),
            use_transaction: kind.is_transactional(),
        };

        for (key, value) in input {
            match kind.slot(key) {
                Some(Slot::Own) => {
                    composite.values.insert(key.clone(), value.clone());
                }
                Some(Slot::Association { .. }) => {}
                None if composite.owning_association(key).is_some() => {}
                None => tracing::debug!(composite = kind.name(), key = %key, "ignoring unknown input key"),
            }
        }
        Ok(composite)
    }

    #[must_use]
    pub const fn kind(&self) -> &Arc<CompositeType> {
        &self.kind
    }

    #[must_use]
    pub fn association_names(&self) -> Vec<&str> {
        self.kind.association_names()
    }

    /// Association name to sub-entity, as of now.
    #[must_use]
    pub fn associations(&self) -> Vec<(&str, &dyn Entity)> {
        self.associations
            .iter()
            .map(|(name, entity)| (name.as_str(), entity.as_ref()))
            .collect()
    }

    #[must_use]
    pub fn association(&self, name: &str) -> Option<&dyn Entity> {
        self.associations.get(name).map(AsRef::as_ref)
    }

    pub fn association_mut(&mut self, name: &str) -> Option<&mut (dyn Entity + 'static)> {
        self.associations.get_mut(name).map(AsMut::as_mut)
    }

    /// The sub-entity under `name`, if it is a `T`.
    #[must_use]
    pub fn association_as<T: Entity>(&self, name: &str) -> Option<&T> {
        self.association(name)?.as_any().downcast_ref::<T>()
    }

    /// Swap in a new sub-entity, returning the one it replaces.
    ///
    /// # Errors
    ///
    /// Returns `FormError::UnknownMember` if no association is named `name`.
    pub fn replace_association(&mut self, name: &str, entity: Box<dyn Entity>) -> Result<Box<dyn Entity>, FormError> {
        let slot = self
            .associations
            .get_mut(name)
            .ok_or_else(|| FormError::unknown_member(self.kind.name(), &format!("{name}=")))?;
        Ok(std::mem::replace(slot, entity))
    }

    /// Read any key of the attribute surface. `None` for keys outside it.
    #[must_use]
    pub fn read(&self, key: &str) -> Option<Value> {
        match self.kind.slot(key)? {
            Slot::Own => self.values.get(key).cloned(),
            Slot::Association { association, attribute } => self.associations.get(association)?.read(attribute),
        }
    }

    /// # Errors
    ///
    /// Returns `FormError::UnknownMember` for keys outside the attribute
    /// surface, or the sub-entity's own write error.
    pub fn write(&mut self, key: &str, value: impl Into<Value>) -> Result<(), FormError> {
        match self.kind.slot(key) {
            Some(Slot::Own) => {
                self.values.insert(key.to_string(), value.into());
                Ok(())
            }
            Some(Slot::Association { association, attribute }) => {
                let entity = self
                    .associations
                    .get_mut(association)
                    .ok_or_else(|| FormError::unknown_member(self.kind.name(), &format!("{key}=")))?;
                entity.write(attribute, value.into())?;
                Ok(())
            }
            None => Err(FormError::unknown_member(self.kind.name(), &format!("{key}="))),
        }
    }

    /// A composite is never itself a stored record.
    #[must_use]
    pub const fn persisted(&self) -> bool {
        false
    }

    /// Errors from the most recent validity check.
    #[must_use]
    pub const fn errors(&self) -> &Errors {
        &self.errors
    }

    /// Own validators first, then the errors of every association whose
    /// condition currently holds, re-keyed as `<association>_<field>`.
    #[must_use]
    pub fn validate(&self) -> Errors {
        let mut errors = Errors::new();
        for validator in self.kind.validators() {
            if validator.applies(true, |p| self.evaluate(p).unwrap_or(false)) {
                errors.extend_field(validator.attribute(), validator.check(self.read(validator.attribute()).as_ref()));
            }
        }
        for (name, entity) in &self.associations {
            if self.should_validate_association(name) {
                errors.merge_namespaced(name, &entity.validate());
            }
        }
        errors
    }

    /// Recompute [`errors`](Self::errors) and report whether there are none.
    pub fn is_valid(&mut self) -> bool {
        self.errors = self.validate();
        self.errors.is_empty()
    }

    /// Whether `name`'s errors are merged right now. Named predicates are
    /// resolved against the current state on every call.
    #[must_use]
    pub fn should_validate_association(&self, name: &str) -> bool {
        match self.kind.association_validations().get(name) {
            Some(ValidationCondition::Never) => false,
            Some(ValidationCondition::NamedPredicate(predicate)) => self.evaluate(predicate).unwrap_or(false),
            Some(ValidationCondition::Always) | None => true,
        }
    }

    /// Evaluate a composite predicate. `None` if it is not declared.
    #[must_use]
    pub fn evaluate(&self, predicate: &str) -> Option<bool> {
        self.kind.predicate(predicate).map(|p| p(self))
    }

    #[must_use]
    pub const fn use_transaction(&self) -> bool {
        self.use_transaction
    }

    pub const fn set_use_transaction(&mut self, use_transaction: bool) {
        self.use_transaction = use_transaction;
    }

    #[must_use]
    pub fn with_transaction(mut self, use_transaction: bool) -> Self {
        self.use_transaction = use_transaction;
        self
    }

    /// Validate, run the `before_save` hook, then persist every association
    /// that has a persist operation.
    ///
    /// Returns `Ok(None)` without touching the store when the composite is
    /// invalid, and `Ok(Some(self))` once everything is persisted.
    ///
    /// # Errors
    ///
    /// Propagates hook and persistence failures unchanged. In transactional
    /// mode the store rolls back every write made by this save.
    pub fn save(&mut self, store: &mut dyn Store) -> Result<Option<&mut Self>, FormError> {
        if !self.is_valid() {
            tracing::debug!(composite = self.kind.name(), errors = self.errors.len(), "not saving invalid composite");
            return Ok(None);
        }

        if let Some(hook) = self.kind.before_save() {
            hook(self)?;
        }

        let composite = self.kind.name().to_string();
        let associations = &mut self.associations;
        if self.use_transaction {
            store.transaction(&mut |tx: &mut dyn Store| persist_all(&composite, associations, tx))?;
        } else {
            persist_all(&composite, associations, store)?;
        }
        Ok(Some(self))
    }

    /// Invoke a member by name: own and synthesized accessors, association
    /// readers, declared methods and predicates, then forwarding.
    ///
    /// # Errors
    ///
    /// Returns `FormError::UnknownMember` when nothing answers to `member`,
    /// or whatever the member itself fails with.
    pub fn call(&mut self, member: &str, args: &[Value]) -> Result<Value, FormError> {
        if let Some(key) = member.strip_suffix('=') {
            if self.kind.slot(key).is_some() {
                EntityError::check_arity(member, args, 1)?;
                self.write(key, args[0].clone())?;
                return Ok(args[0].clone());
            }
            if self.associations.contains_key(key) {
                EntityError::check_arity(member, args, 1)?;
                self.assign_association(key, &args[0])?;
                return Ok(args[0].clone());
            }
        } else if self.kind.slot(member).is_some() {
            EntityError::check_arity(member, args, 0)?;
            return Ok(self.read(member).unwrap_or(Value::Null));
        } else if let Some(snapshot) = self.association_snapshot(member) {
            EntityError::check_arity(member, args, 0)?;
            return Ok(snapshot);
        }

        if let Some(method) = self.kind.method(member).cloned() {
            return method(self, args);
        }
        if let Some(result) = self.evaluate(member) {
            EntityError::check_arity(member, args, 0)?;
            return Ok(Value::Bool(result));
        }

        self.forward(member, args)
    }

    #[must_use]
    pub fn responds_to(&self, member: &str) -> bool {
        let accessor = member.strip_suffix('=').unwrap_or(member);
        self.kind.slot(accessor).is_some()
            || self.associations.contains_key(accessor)
            || self.kind.has_method(member)
            || self.kind.has_predicate(member)
            || self.supports_member(member)
    }

    /// Replace the named association with a new instance built from an
    /// object of its attributes.
    fn assign_association(&mut self, name: &str, value: &Value) -> Result<(), FormError> {
        let Some(object) = value.as_object() else {
            return Err(FormError::InvalidArgument {
                member: format!("{name}="),
                expected: "an object of attributes",
            });
        };
        let definition = self
            .kind
            .association(name)
            .ok_or_else(|| FormError::unknown_member(self.kind.name(), &format!("{name}=")))?;
        let attributes: Attributes = object.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let entity = definition.kind().instantiate(&attributes)?;
        self.replace_association(name, entity)?;
        Ok(())
    }

    /// The named association's attributes as an object.
    fn association_snapshot(&self, name: &str) -> Option<Value> {
        let entity = self.associations.get(name)?;
        let definition = self.kind.association(name)?;
        let attributes = definition.attributes().ok()?;
        let object: Map<String, Value> = attributes
            .into_iter()
            .map(|attribute| {
                let value = entity.read(&attribute).unwrap_or(Value::Null);
                (attribute, value)
            })
            .collect();
        Some(Value::Object(object))
    }
}

fn persist_all(
    composite: &str,
    associations: &mut IndexMap<String, Box<dyn Entity>>,
    store: &mut dyn Store,
) -> Result<(), EntityError> {
    for (name, entity) in associations.iter_mut() {
        if let Some(persist) = entity.as_persist() {
            persist.persist(store)?;
            tracing::debug!(composite, association = %name, "persisted association");
        } else {
            tracing::debug!(composite, association = %name, "association has no persist operation");
        }
    }
    Ok(())
}
