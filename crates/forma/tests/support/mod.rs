//! Shared fixture kinds and composites for the integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use forma::{AssociationOptions, CompositeType, FormError, ValidationCondition};
use forma_core::value::as_number;
use forma_core::{EntityError, ModelKind, Validator, Value};
use serde_json::json;

/// `first_name`, `last_name`, `email`, plus a `full_name` accessor.
/// Email is required. Instances persist themselves.
pub fn dummy_user() -> ModelKind {
    ModelKind::builder("dummy_user")
        .attributes(["first_name", "last_name", "email"])
        .accessor("full_name")
        .validates(Validator::presence("email"))
        .predicate("named?", |user| user.get("first_name").is_some_and(|v| !v.is_null()))
        .method("greeting", |user, args| {
            EntityError::check_arity("greeting", args, 1)?;
            let salutation = args[0].as_str().unwrap_or("Hello");
            let name = user.get("first_name").and_then(Value::as_str).unwrap_or("stranger");
            Ok(json!(format!("{salutation}, {name}")))
        })
        .persistable()
        .build()
}

/// `title`, `price`. Title is required. No persist operation.
pub fn dummy_book() -> ModelKind {
    ModelKind::builder("dummy_book")
        .attributes(["title", "price"])
        .validates(Validator::presence("title"))
        .build()
}

/// `number`, `expiration`, `cvv`. Number is required and 12 to 19 characters.
pub fn dummy_credit_card() -> ModelKind {
    ModelKind::builder("dummy_credit_card")
        .attributes(["number", "expiration", "cvv"])
        .validates(Validator::presence("number"))
        .validates(Validator::length("number", Some(12), Some(19)))
        .build()
}

/// The shopping cart: its own `total` and `tax`, a user that is always
/// validated, a book that never is, and a credit card that is validated only
/// when the book has a positive price.
pub fn cart() -> Arc<CompositeType> {
    CompositeType::builder("Cart")
        .attributes(["total", "tax"])
        .attributes_for("dummy_user", Arc::new(dummy_user()), AssociationOptions::default())
        .attributes_for(
            "dummy_book",
            Arc::new(dummy_book()),
            AssociationOptions::default().validate(ValidationCondition::Never),
        )
        .attributes_for(
            "dummy_credit_card",
            Arc::new(dummy_credit_card()),
            AssociationOptions::default().validate(ValidationCondition::predicate("require_credit_card?")),
        )
        .validates(Validator::numericality("total"))
        .predicate("require_credit_card?", |cart| {
            cart.read("dummy_book_price")
                .as_ref()
                .and_then(as_number)
                .is_some_and(|price| price > 0.0)
        })
        .method("calculate_total", calculate_total)
        .build()
        .expect("cart fixture declares cleanly")
}

fn calculate_total(cart: &mut forma::Composite, _args: &[Value]) -> Result<Value, FormError> {
    let total = cart
        .read("dummy_book_price")
        .filter(|price| !price.is_null())
        .unwrap_or_else(|| json!(0.0));
    cart.write("total", total.clone())?;
    Ok(total)
}

/// A user kind with key lookup on `id`.
pub fn user() -> ModelKind {
    ModelKind::builder("user")
        .primary_key("id")
        .attributes(["name", "email"])
        .validates(Validator::presence("email"))
        .persistable()
        .build()
}

/// A book whose price must be a plain non-negative decimal.
pub fn book() -> ModelKind {
    ModelKind::builder("book")
        .attributes(["title", "price"])
        .validates(Validator::format("price", r"^\d+(\.\d+)?$").expect("valid pattern"))
        .build()
}

/// A persistable invoice, used to exercise multi-write saves.
pub fn invoice() -> ModelKind {
    ModelKind::builder("invoice")
        .primary_key("id")
        .attributes(["amount"])
        .persistable()
        .build()
}

/// `user` (always validated, key lookup) and `book` (never validated).
pub fn account() -> Arc<CompositeType> {
    CompositeType::builder("Account")
        .attributes_for("user", Arc::new(user()), AssociationOptions::default())
        .attributes_for(
            "book",
            Arc::new(book()),
            AssociationOptions::default().validate(ValidationCondition::Never),
        )
        .build()
        .expect("account fixture declares cleanly")
}
