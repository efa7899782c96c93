//! Composite type declaration.
//!
//! A `CompositeType` is the registry behind every composite instance: its own
//! attributes, the ordered association definitions, the validation condition
//! of each association, and the attribute slot table that maps every key of
//! the unified attribute surface to where its value lives. The slot table is
//! filled once, while the type is declared, and consulted for every read and
//! write afterwards.

use std::fmt;
use std::sync::Arc;

use forma_config::CompositeConfig;
use forma_core::{Attributes, EntityKind, Validator, Value};
use indexmap::IndexMap;

use crate::composite::Composite;
use crate::condition::{AssociationOptions, ValidationCondition};
use crate::definition::AssociationDefinition;
use crate::error::FormError;

/// Named zero-argument predicate on a composite.
pub type CompositePredicate = Arc<dyn Fn(&Composite) -> bool + Send + Sync>;

/// Named method on a composite.
pub type CompositeMethod = Arc<dyn Fn(&mut Composite, &[Value]) -> Result<Value, FormError> + Send + Sync>;

/// Runs after validation and before any association is persisted.
pub type BeforeSave = Arc<dyn Fn(&mut Composite) -> Result<(), FormError> + Send + Sync>;

/// Where the value behind an attribute key lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// A scalar owned by the composite itself.
    Own,
    /// `attribute` on the sub-entity held under `association`.
    Association { association: String, attribute: String },
}

pub struct CompositeType {
    name: String,
    own_attributes: Vec<String>,
    definitions: Vec<AssociationDefinition>,
    validations: IndexMap<String, ValidationCondition>,
    slots: IndexMap<String, Slot>,
    validators: Vec<Validator>,
    predicates: IndexMap<String, CompositePredicate>,
    methods: IndexMap<String, CompositeMethod>,
    before_save: Option<BeforeSave>,
    transactional: bool,
}

impl CompositeType {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> CompositeTypeBuilder {
        CompositeTypeBuilder::new(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Association names, in declaration order.
    #[must_use]
    pub fn association_names(&self) -> Vec<&str> {
        self.definitions.iter().map(AssociationDefinition::name).collect()
    }

    /// Association name to validation condition.
    #[must_use]
    pub const fn association_validations(&self) -> &IndexMap<String, ValidationCondition> {
        &self.validations
    }

    /// Every key of the attribute surface: own attributes and namespaced
    /// association attributes, in declaration order.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<&str> {
        self.slots.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn own_attributes(&self) -> &[String] {
        &self.own_attributes
    }

    #[must_use]
    pub fn association(&self, name: &str) -> Option<&AssociationDefinition> {
        self.definitions.iter().find(|d| d.name() == name)
    }

    #[must_use]
    pub fn definitions(&self) -> &[AssociationDefinition] {
        &self.definitions
    }

    /// Composite-level validators.
    #[must_use]
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Default for new instances' `use_transaction` flag.
    #[must_use]
    pub const fn is_transactional(&self) -> bool {
        self.transactional
    }

    #[must_use]
    pub fn slot(&self, key: &str) -> Option<&Slot> {
        self.slots.get(key)
    }

    pub(crate) fn predicate(&self, name: &str) -> Option<&CompositePredicate> {
        self.predicates.get(name)
    }

    pub(crate) fn method(&self, name: &str) -> Option<&CompositeMethod> {
        self.methods.get(name)
    }

    pub(crate) fn has_predicate(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    pub(crate) fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub(crate) fn before_save(&self) -> Option<BeforeSave> {
        self.before_save.clone()
    }
}

impl fmt::Debug for CompositeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeType")
            .field("name", &self.name)
            .field("own_attributes", &self.own_attributes)
            .field("associations", &self.association_names())
            .field("validations", &self.validations)
            .field("predicates", &self.predicates.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("transactional", &self.transactional)
            .finish_non_exhaustive()
    }
}

/// Declares a [`CompositeType`].
///
/// Declaration methods chain by value. The first declaration error is kept
/// and returned from [`build`](Self::build); later calls are ignored.
pub struct CompositeTypeBuilder {
    shape: CompositeType,
    strict_keys: bool,
    error: Option<FormError>,
}

impl CompositeTypeBuilder {
    fn new(name: String) -> Self {
        let defaults = CompositeConfig::default();
        Self {
            shape: CompositeType {
                name,
                own_attributes: Vec::new(),
                definitions: Vec::new(),
                validations: IndexMap::new(),
                slots: IndexMap::new(),
                validators: Vec::new(),
                predicates: IndexMap::new(),
                methods: IndexMap::new(),
                before_save: None,
                transactional: defaults.transactional,
            },
            strict_keys: defaults.strict_keys,
            error: None,
        }
    }

    /// Apply the `[composite]` configuration section.
    #[must_use]
    pub const fn config(mut self, config: &CompositeConfig) -> Self {
        self.shape.transactional = config.transactional;
        self.strict_keys = config.strict_keys;
        self
    }

    #[must_use]
    pub const fn transactional(mut self, transactional: bool) -> Self {
        self.shape.transactional = transactional;
        self
    }

    /// Declare a scalar attribute owned by the composite.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let name = name.into();
        if let Err(e) = self.claim_key(&name) {
            self.error = Some(e);
            return self;
        }
        if self.strict_keys && self.shape.definitions.iter().any(|d| d.name() == name) {
            self.error = Some(FormError::configuration(format!(
                "attribute `{name}` shadows an association of {}",
                self.shape.name
            )));
            return self;
        }
        if !self.shape.own_attributes.contains(&name) {
            self.shape.own_attributes.push(name.clone());
        }
        self.shape.slots.insert(name, Slot::Own);
        self
    }

    #[must_use]
    pub fn attributes<I, S>(self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(self, Self::attribute)
    }

    /// Declare an association: one sub-entity of `kind` held under `name`,
    /// whose attributes join the surface as `<name>_<attribute>`.
    #[must_use]
    pub fn attributes_for(mut self, name: impl Into<String>, kind: Arc<dyn EntityKind>, options: AssociationOptions) -> Self {
        if self.error.is_some() {
            return self;
        }
        let definition = AssociationDefinition::new(name, kind, options);
        if let Err(e) = self.declare(definition) {
            self.error = Some(e);
        }
        self
    }

    /// Like [`attributes_for`](Self::attributes_for), with options given as a
    /// map (`{"validate": true | false | "predicate?"}`).
    #[must_use]
    pub fn attributes_for_with(self, name: impl Into<String>, kind: Arc<dyn EntityKind>, options: &Attributes) -> Self {
        match AssociationOptions::from_map(options) {
            Ok(options) => self.attributes_for(name, kind, options),
            Err(e) => self.fail(e),
        }
    }

    #[must_use]
    pub fn validates(mut self, validator: Validator) -> Self {
        self.shape.validators.push(validator);
        self
    }

    #[must_use]
    pub fn predicate<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Composite) -> bool + Send + Sync + 'static,
    {
        self.shape.predicates.insert(name.into(), Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&mut Composite, &[Value]) -> Result<Value, FormError> + Send + Sync + 'static,
    {
        self.shape.methods.insert(name.into(), Arc::new(method));
        self
    }

    #[must_use]
    pub fn before_save<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Composite) -> Result<(), FormError> + Send + Sync + 'static,
    {
        self.shape.before_save = Some(Arc::new(hook));
        self
    }

    /// # Errors
    ///
    /// Returns the first declaration error, or `FormError::Configuration` if
    /// an association's validation condition names a predicate the composite
    /// does not declare.
    pub fn build(self) -> Result<Arc<CompositeType>, FormError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        for (association, condition) in &self.shape.validations {
            if let Some(predicate) = condition.predicate_name() {
                if !self.shape.has_predicate(predicate) {
                    return Err(FormError::configuration(format!(
                        "association `{association}` is validated by `{predicate}`, which {} does not declare",
                        self.shape.name
                    )));
                }
            }
        }
        tracing::debug!(
            composite = %self.shape.name,
            associations = self.shape.definitions.len(),
            attributes = self.shape.slots.len(),
            "declared composite type"
        );
        Ok(Arc::new(self.shape))
    }

    fn fail(mut self, error: FormError) -> Self {
        self.error.get_or_insert(error);
        self
    }

    fn declare(&mut self, definition: AssociationDefinition) -> Result<(), FormError> {
        let attributes = definition.attributes()?;
        let name = definition.name().to_string();

        let position = self.shape.definitions.iter().position(|d| d.name() == name);
        if position.is_some() {
            if self.strict_keys {
                return Err(FormError::configuration(format!(
                    "association `{name}` is declared twice on {}",
                    self.shape.name
                )));
            }
            self.shape.slots.retain(
                |_, slot| !matches!(slot, Slot::Association { association, .. } if *association == name),
            );
        } else if self.strict_keys && self.shape.slots.get(&name) == Some(&Slot::Own) {
            return Err(FormError::configuration(format!(
                "association `{name}` shadows an attribute of {}",
                self.shape.name
            )));
        }

        for attribute in &attributes {
            let key = definition.namespaced(attribute);
            self.claim_key(&key)?;
            self.shape.slots.insert(
                key,
                Slot::Association {
                    association: name.clone(),
                    attribute: attribute.clone(),
                },
            );
        }

        self.shape.validations.insert(name.clone(), definition.validation_condition());
        tracing::debug!(
            composite = %self.shape.name,
            association = %name,
            kind = definition.kind().name(),
            condition = %definition.validation_condition(),
            attributes = attributes.len(),
            "declared association"
        );
        match position {
            Some(index) => self.shape.definitions[index] = definition,
            None => self.shape.definitions.push(definition),
        }
        Ok(())
    }

    /// Fail if `key` is already on the attribute surface and keys are strict.
    fn claim_key(&self, key: &str) -> Result<(), FormError> {
        if !self.strict_keys {
            return Ok(());
        }
        match self.shape.slots.get(key) {
            None => Ok(()),
            Some(Slot::Own) => Err(FormError::configuration(format!(
                "attribute `{key}` is declared twice on {}",
                self.shape.name
            ))),
            Some(Slot::Association { association, .. }) => Err(FormError::configuration(format!(
                "attribute `{key}` collides with a key synthesized for association `{association}` on {}",
                self.shape.name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_core::{ModelKind, attrs};
    use pretty_assertions::assert_eq;

    fn kind(name: &str, attributes: &[&str]) -> Arc<dyn EntityKind> {
        Arc::new(ModelKind::builder(name).attributes(attributes.iter().copied()).build())
    }

    /// A kind that cannot enumerate its attributes.
    #[derive(Debug)]
    struct Opaque;

    impl EntityKind for Opaque {
        fn name(&self) -> &str {
            "vault_record"
        }

        fn attribute_names(&self) -> Option<Vec<String>> {
            None
        }

        fn instantiate(&self, _attributes: &Attributes) -> Result<Box<dyn forma_core::Entity>, forma_core::EntityError> {
            Err(forma_core::EntityError::UnknownMember {
                entity: "vault_record".into(),
                member: "new".into(),
            })
        }
    }

    fn lenient() -> CompositeConfig {
        CompositeConfig {
            strict_keys: false,
            ..CompositeConfig::default()
        }
    }

    #[test]
    fn slots_follow_declaration_order() {
        let cart = CompositeType::builder("Cart")
            .attributes(["total", "tax"])
            .attributes_for("book", kind("book", &["title", "price"]), AssociationOptions::default())
            .build()
            .unwrap();

        assert_eq!(cart.attribute_names(), vec!["total", "tax", "book_title", "book_price"]);
        assert_eq!(
            cart.slot("book_price"),
            Some(&Slot::Association {
                association: "book".into(),
                attribute: "price".into()
            })
        );
        assert_eq!(cart.slot("total"), Some(&Slot::Own));
    }

    #[test]
    fn attribute_named_like_earlier_association_is_rejected_when_strict() {
        let result = CompositeType::builder("Cart")
            .attributes_for("user", kind("user", &["email"]), AssociationOptions::default())
            .attribute("user")
            .build();
        assert!(matches!(result, Err(FormError::Configuration(ref m)) if m.contains("shadows an association")));
    }

    #[test]
    fn association_without_attribute_names_fails_the_build() {
        let opaque: Arc<dyn EntityKind> = Arc::new(Opaque);
        let result = CompositeType::builder("Cart")
            .attribute("total")
            .attributes_for("vault", opaque, AssociationOptions::default())
            .build();
        assert!(matches!(result, Err(FormError::Configuration(ref m)) if m.contains("vault")));
    }

    #[test]
    fn duplicate_association_is_rejected_when_strict() {
        let result = CompositeType::builder("Cart")
            .attributes_for("book", kind("book", &["title"]), AssociationOptions::default())
            .attributes_for("book", kind("book", &["title"]), AssociationOptions::default())
            .build();
        assert!(matches!(result, Err(FormError::Configuration(_))));
    }

    #[test]
    fn redeclared_association_replaces_in_place_when_lenient() {
        let cart = CompositeType::builder("Cart")
            .config(&lenient())
            .attributes_for("book", kind("book", &["title", "price"]), AssociationOptions::default())
            .attributes_for("user", kind("user", &["email"]), AssociationOptions::default())
            .attributes_for(
                "book",
                kind("book", &["isbn"]),
                AssociationOptions::default().validate(ValidationCondition::Never),
            )
            .build()
            .unwrap();

        assert_eq!(cart.association_names(), vec!["book", "user"]);
        assert_eq!(cart.attribute_names(), vec!["user_email", "book_isbn"]);
        assert_eq!(cart.association_validations()["book"], ValidationCondition::Never);
    }

    #[test]
    fn namespaced_collision_is_rejected_when_strict() {
        // `credit` + `card_number` and `credit_card` + `number` both synthesize `credit_card_number`.
        let result = CompositeType::builder("Checkout")
            .attributes_for("credit", kind("credit", &["card_number"]), AssociationOptions::default())
            .attributes_for("credit_card", kind("credit_card", &["number"]), AssociationOptions::default())
            .build();
        assert!(matches!(result, Err(FormError::Configuration(msg)) if msg.contains("credit_card_number")));
    }

    #[test]
    fn namespaced_collision_overwrites_when_lenient() {
        let checkout = CompositeType::builder("Checkout")
            .config(&lenient())
            .attributes_for("credit", kind("credit", &["card_number"]), AssociationOptions::default())
            .attributes_for("credit_card", kind("credit_card", &["number"]), AssociationOptions::default())
            .build()
            .unwrap();
        assert_eq!(
            checkout.slot("credit_card_number"),
            Some(&Slot::Association {
                association: "credit_card".into(),
                attribute: "number".into()
            })
        );
    }

    #[test]
    fn own_attribute_colliding_with_synthesized_key() {
        let result = CompositeType::builder("Cart")
            .attributes_for("book", kind("book", &["title"]), AssociationOptions::default())
            .attribute("book_title")
            .build();
        assert!(matches!(result, Err(FormError::Configuration(_))));
    }

    #[test]
    fn unknown_predicate_fails_at_build() {
        let result = CompositeType::builder("Cart")
            .attributes_for(
                "card",
                kind("card", &["number"]),
                AssociationOptions::default().validate(ValidationCondition::predicate("require_card?")),
            )
            .build();
        assert!(matches!(result, Err(FormError::Configuration(msg)) if msg.contains("require_card?")));
    }

    #[test]
    fn bad_option_map_fails_at_build() {
        let result = CompositeType::builder("Cart")
            .attributes_for_with("card", kind("card", &["number"]), &attrs! { "validate" => 1 })
            .attribute("total")
            .build();
        assert!(matches!(result, Err(FormError::Configuration(_))));
    }

    #[test]
    fn config_sets_transactional_default() {
        let config = CompositeConfig {
            transactional: false,
            ..CompositeConfig::default()
        };
        let cart = CompositeType::builder("Cart").config(&config).build().unwrap();
        assert!(!cart.is_transactional());
    }
}
