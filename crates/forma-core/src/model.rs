//! Record-backed entities.
//!
//! `ModelKind` declares an entity shape at runtime (attributes, plain
//! accessors, validators, predicates, methods, optional primary key) and
//! `Model` is an instance of it holding values in an ordered map. Together
//! they implement the full entity capability, including key lookup and
//! persistence through a [`Store`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::entity::{Entity, EntityKind, Persist};
use crate::errors::EntityError;
use crate::store::Store;
use crate::validation::{Errors, Validator};
use crate::value::{Attributes, Value, is_blank};

/// Named zero-argument predicate on a model.
pub type ModelPredicate = Arc<dyn Fn(&Model) -> bool + Send + Sync>;

/// Named method on a model.
pub type ModelMethod = Arc<dyn Fn(&mut Model, &[Value]) -> Result<Value, EntityError> + Send + Sync>;

struct Shape {
    name: String,
    attributes: Vec<String>,
    accessors: Vec<String>,
    validators: Vec<Validator>,
    predicates: IndexMap<String, ModelPredicate>,
    methods: IndexMap<String, ModelMethod>,
    primary_key: Option<String>,
    persistable: bool,
}

/// Shape of a record-backed entity. Cheap to clone.
#[derive(Clone)]
pub struct ModelKind {
    shape: Arc<Shape>,
}

impl ModelKind {
    #[must_use]
    pub fn builder(name: impl Into<String>) -> ModelKindBuilder {
        ModelKindBuilder {
            shape: Shape {
                name: name.into(),
                attributes: Vec::new(),
                accessors: Vec::new(),
                validators: Vec::new(),
                predicates: IndexMap::new(),
                methods: IndexMap::new(),
                primary_key: None,
                persistable: false,
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.shape.name
    }

    /// Declared attributes, in declaration order.
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.shape.attributes
    }

    #[must_use]
    pub fn is_persistable(&self) -> bool {
        self.shape.persistable
    }

    /// A blank instance with every attribute and accessor set to `null`.
    #[must_use]
    pub fn new_model(&self) -> Model {
        let values = self
            .shape
            .attributes
            .iter()
            .chain(&self.shape.accessors)
            .map(|name| (name.clone(), Value::Null))
            .collect();
        Model {
            kind: self.clone(),
            values,
            persisted: false,
        }
    }

    fn has_field(&self, name: &str) -> bool {
        self.shape.attributes.iter().any(|a| a == name)
            || self.shape.accessors.iter().any(|a| a == name)
    }
}

impl fmt::Debug for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelKind")
            .field("name", &self.shape.name)
            .field("attributes", &self.shape.attributes)
            .field("accessors", &self.shape.accessors)
            .field("primary_key", &self.shape.primary_key)
            .field("persistable", &self.shape.persistable)
            .finish_non_exhaustive()
    }
}

impl EntityKind for ModelKind {
    fn name(&self) -> &str {
        &self.shape.name
    }

    fn attribute_names(&self) -> Option<Vec<String>> {
        Some(self.shape.attributes.clone())
    }

    fn instantiate(&self, attributes: &Attributes) -> Result<Box<dyn Entity>, EntityError> {
        let mut model = self.new_model();
        model.assign(attributes)?;
        Ok(Box::new(model))
    }

    fn primary_key(&self) -> Option<&str> {
        self.shape.primary_key.as_deref()
    }

    fn find(&self, store: &dyn Store, key: &Value) -> Result<Box<dyn Entity>, EntityError> {
        let Some(primary_key) = self.primary_key() else {
            return Err(crate::errors::StoreError::Unsupported {
                kind: self.name().to_string(),
                operation: "find",
            }
            .into());
        };

        let record = store.find(self.name(), key)?;
        let mut model = self.new_model();
        for (name, value) in record {
            if self.shape.attributes.contains(&name) {
                model.values.insert(name, value);
            }
        }
        model.values.insert(primary_key.to_string(), key.clone());
        model.persisted = true;
        tracing::debug!(kind = self.name(), key = %key, "hydrated stored record");
        Ok(Box::new(model))
    }
}

/// Declares a [`ModelKind`].
pub struct ModelKindBuilder {
    shape: Shape,
}

impl ModelKindBuilder {
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.shape.attributes.contains(&name) {
            self.shape.attributes.push(name);
        }
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

    /// A readable/writable field that is not part of the attribute list.
    #[must_use]
    pub fn accessor(mut self, name: impl Into<String>) -> Self {
        self.shape.accessors.push(name.into());
        self
    }

    #[must_use]
    pub fn validates(mut self, validator: Validator) -> Self {
        self.shape.validators.push(validator);
        self
    }

    #[must_use]
    pub fn predicate<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Model) -> bool + Send + Sync + 'static,
    {
        self.shape.predicates.insert(name.into(), Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&mut Model, &[Value]) -> Result<Value, EntityError> + Send + Sync + 'static,
    {
        self.shape.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// Enable key lookup on `field`. The field becomes the first attribute
    /// if it was not declared already.
    #[must_use]
    pub fn primary_key(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        if !self.shape.attributes.contains(&field) {
            self.shape.attributes.insert(0, field.clone());
        }
        self.shape.primary_key = Some(field);
        self
    }

    /// Give instances a persist operation.
    #[must_use]
    pub const fn persistable(mut self) -> Self {
        self.shape.persistable = true;
        self
    }

    #[must_use]
    pub fn build(self) -> ModelKind {
        ModelKind {
            shape: Arc::new(self.shape),
        }
    }
}

/// An instance of a [`ModelKind`].
#[derive(Clone)]
pub struct Model {
    kind: ModelKind,
    values: IndexMap<String, Value>,
    persisted: bool,
}

impl Model {
    #[must_use]
    pub const fn kind(&self) -> &ModelKind {
        &self.kind
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// # Errors
    ///
    /// Returns `EntityError::UnknownMember` if `name` is neither an attribute
    /// nor an accessor.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), EntityError> {
        if !self.kind.has_field(name) {
            return Err(EntityError::unknown_member(self.kind.name(), &format!("{name}=")));
        }
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// The primary-key value, when the kind has one and it is set.
    #[must_use]
    pub fn key(&self) -> Option<&Value> {
        let field = self.kind.shape.primary_key.as_deref()?;
        self.values.get(field).filter(|v| !is_blank(v))
    }

    /// The declared attributes and their current values. Accessors are excluded.
    #[must_use]
    pub fn record(&self) -> Attributes {
        self.kind
            .shape
            .attributes
            .iter()
            .map(|name| {
                let value = self.values.get(name).cloned().unwrap_or(Value::Null);
                (name.clone(), value)
            })
            .collect()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("kind", &self.kind.name())
            .field("values", &self.values)
            .field("persisted", &self.persisted)
            .finish()
    }
}

impl Entity for Model {
    fn kind_name(&self) -> &str {
        self.kind.name()
    }

    fn read(&self, attribute: &str) -> Option<Value> {
        self.values.get(attribute).cloned()
    }

    fn write(&mut self, attribute: &str, value: Value) -> Result<(), EntityError> {
        self.set(attribute, value)
    }

    fn validate(&self) -> Errors {
        let new_record = self.is_new_record();
        let mut errors = Errors::new();
        for validator in &self.kind.shape.validators {
            if validator.applies(new_record, |p| self.evaluate(p).unwrap_or(false)) {
                let failures = validator.check(self.values.get(validator.attribute()));
                errors.extend_field(validator.attribute(), failures);
            }
        }
        errors
    }

    fn validators(&self) -> Vec<Validator> {
        self.kind.shape.validators.clone()
    }

    fn is_new_record(&self) -> bool {
        !self.persisted
    }

    fn evaluate(&self, predicate: &str) -> Option<bool> {
        self.kind.shape.predicates.get(predicate).map(|p| p(self))
    }

    fn responds_to(&self, member: &str) -> bool {
        let shape = &self.kind.shape;
        member
            .strip_suffix('=')
            .map_or_else(|| self.kind.has_field(member), |field| self.kind.has_field(field))
            || shape.methods.contains_key(member)
            || shape.predicates.contains_key(member)
    }

    fn invoke(&mut self, member: &str, args: &[Value]) -> Result<Value, EntityError> {
        if let Some(field) = member.strip_suffix('=') {
            if self.kind.has_field(field) {
                EntityError::check_arity(member, args, 1)?;
                self.set(field, args[0].clone())?;
                return Ok(args[0].clone());
            }
        } else if self.kind.has_field(member) {
            EntityError::check_arity(member, args, 0)?;
            return Ok(self.values.get(member).cloned().unwrap_or(Value::Null));
        }

        if let Some(method) = self.kind.shape.methods.get(member).cloned() {
            return method(self, args);
        }

        if let Some(predicate) = self.kind.shape.predicates.get(member).cloned() {
            EntityError::check_arity(member, args, 0)?;
            return Ok(Value::Bool(predicate(self)));
        }

        Err(EntityError::unknown_member(self.kind.name(), member))
    }

    fn as_persist(&mut self) -> Option<&mut dyn Persist> {
        if self.kind.is_persistable() {
            Some(self)
        } else {
            None
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl Persist for Model {
    fn persist(&mut self, store: &mut dyn Store) -> Result<(), EntityError> {
        let record = self.record();
        let key = store.save(self.kind.name(), self.key(), &record)?;
        if let Some(field) = self.kind.shape.primary_key.clone() {
            self.values.insert(field, key.clone());
        }
        self.persisted = true;
        tracing::debug!(kind = self.kind.name(), key = %key, "persisted record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::errors::StoreError;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn user_kind() -> ModelKind {
        ModelKind::builder("user")
            .primary_key("id")
            .attributes(["first_name", "last_name", "email"])
            .accessor("full_name")
            .validates(Validator::presence("email"))
            .predicate("named?", |m| m.get("first_name").is_some_and(|v| !is_blank(v)))
            .method("greeting", |m, args| {
                EntityError::check_arity("greeting", args, 1)?;
                let name = m.get("first_name").cloned().unwrap_or(Value::Null);
                Ok(json!(format!("{}, {}", args[0].as_str().unwrap_or("Hello"), name.as_str().unwrap_or("stranger"))))
            })
            .persistable()
            .build()
    }

    /// Single-kind store that remembers the last write.
    #[derive(Default)]
    struct OneRecordStore {
        record: Option<Attributes>,
    }

    impl Store for OneRecordStore {
        fn find(&self, kind: &str, key: &Value) -> Result<Attributes, StoreError> {
            self.record.clone().ok_or_else(|| StoreError::NotFound {
                kind: kind.to_string(),
                key: key.to_string(),
            })
        }

        fn save(&mut self, _kind: &str, key: Option<&Value>, record: &Attributes) -> Result<Value, StoreError> {
            self.record = Some(record.clone());
            Ok(key.cloned().unwrap_or_else(|| json!(1)))
        }

        fn transaction(&mut self, work: &mut crate::store::UnitOfWork<'_>) -> Result<(), EntityError> {
            work(self)
        }
    }

    #[test]
    fn primary_key_is_first_attribute() {
        let kind = user_kind();
        assert_eq!(
            kind.attribute_names().unwrap(),
            vec!["id", "first_name", "last_name", "email"]
        );
    }

    #[test]
    fn instantiate_assigns_known_fields_only() {
        let kind = user_kind();
        let entity = kind
            .instantiate(&attrs! { "first_name" => "Mo", "nickname" => "M" })
            .unwrap();
        assert_eq!(entity.read("first_name"), Some(json!("Mo")));
        assert_eq!(entity.read("nickname"), None);
        assert!(entity.is_new_record());
    }

    #[test]
    fn accessors_are_writable_but_not_attributes() {
        let mut model = user_kind().new_model();
        model.invoke("full_name=", &[json!("Mo Lawson")]).unwrap();
        assert_eq!(model.invoke("full_name", &[]).unwrap(), json!("Mo Lawson"));
        assert!(!model.record().contains_key("full_name"));
    }

    #[test]
    fn validate_reports_blank_email() {
        let mut model = user_kind().new_model();
        assert_eq!(model.validate().get("email"), ["can't be blank"]);
        model.set("email", "bob@example.com").unwrap();
        assert!(model.is_valid());
    }

    #[test]
    fn members_dispatch_to_methods_and_predicates() {
        let mut model = user_kind().new_model();
        model.set("first_name", "Mo").unwrap();
        assert!(model.responds_to("greeting"));
        assert!(model.responds_to("named?"));
        assert!(model.responds_to("email="));
        assert!(!model.responds_to("nickname"));
        assert_eq!(model.invoke("greeting", &[json!("Hi")]).unwrap(), json!("Hi, Mo"));
        assert_eq!(model.invoke("named?", &[]).unwrap(), json!(true));
    }

    #[test]
    fn unknown_member_and_bad_arity() {
        let mut model = user_kind().new_model();
        assert!(matches!(
            model.invoke("fly", &[]),
            Err(EntityError::UnknownMember { .. })
        ));
        assert!(matches!(
            model.invoke("email", &[json!(1)]),
            Err(EntityError::InvalidArguments { given: 1, expected: 0, .. })
        ));
    }

    #[test]
    fn persist_assigns_key_and_marks_persisted() {
        let mut store = OneRecordStore::default();
        let mut model = user_kind().new_model();
        model.set("email", "bob@example.com").unwrap();

        model.as_persist().unwrap().persist(&mut store).unwrap();

        assert!(model.is_persisted());
        assert_eq!(model.key(), Some(&json!(1)));
        assert_eq!(store.record.unwrap()["email"], json!("bob@example.com"));
    }

    #[test]
    fn non_persistable_kind_has_no_persist() {
        let mut model = ModelKind::builder("book").attribute("title").build().new_model();
        assert!(model.as_persist().is_none());
    }

    #[test]
    fn find_hydrates_stored_values() {
        let store = OneRecordStore {
            record: Some(attrs! { "first_name" => "Mo", "last_name" => "Lawson", "email" => "mo@example.com" }),
        };
        let entity = user_kind().find(&store, &json!(7)).unwrap();
        assert_eq!(entity.read("id"), Some(json!(7)));
        assert_eq!(entity.read("last_name"), Some(json!("Lawson")));
        assert!(!entity.is_new_record());
    }

    #[test]
    fn find_without_primary_key_is_unsupported() {
        let kind = ModelKind::builder("book").attribute("title").build();
        let result = kind.find(&OneRecordStore::default(), &json!(1));
        assert!(matches!(
            result,
            Err(EntityError::Store(StoreError::Unsupported { operation: "find", .. }))
        ));
    }

    #[test]
    fn downcast_through_entity() {
        let entity = user_kind().instantiate(&attrs! {}).unwrap();
        let model = entity.as_any().downcast_ref::<Model>().unwrap();
        assert_eq!(model.kind().name(), "user");
    }
}
