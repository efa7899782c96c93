//! Composite declaration, attribute surface, validation, and save behavior
//! for the shopping-cart fixture.

mod support;

use forma::Composite;
use forma_core::{Model, Validator, attrs};
use forma_store::MemoryStore;
use pretty_assertions::assert_eq;
use serde_json::json;

use support::{cart, dummy_user};

fn blank_cart() -> Composite {
    Composite::new(&cart(), &attrs! {}).unwrap()
}

// ---------------------------------------------------------------------------
// Declaration
// ---------------------------------------------------------------------------

#[test]
fn synthesizes_namespaced_accessors() {
    let model = blank_cart();
    assert!(model.responds_to("dummy_user_first_name"));
    assert!(model.responds_to("dummy_user_first_name="));
    assert!(model.responds_to("dummy_user"));
}

#[test]
fn attribute_names_include_associations_in_declaration_order() {
    assert_eq!(
        cart().attribute_names(),
        vec![
            "total",
            "tax",
            "dummy_user_first_name",
            "dummy_user_last_name",
            "dummy_user_email",
            "dummy_book_title",
            "dummy_book_price",
            "dummy_credit_card_number",
            "dummy_credit_card_expiration",
            "dummy_credit_card_cvv",
        ]
    );
}

#[test]
fn association_names_in_declaration_order() {
    assert_eq!(
        cart().association_names(),
        vec!["dummy_user", "dummy_book", "dummy_credit_card"]
    );
}

#[test]
fn association_validations_record_each_condition() {
    assert_eq!(
        serde_json::to_value(cart().association_validations()).unwrap(),
        json!({
            "dummy_user": true,
            "dummy_book": false,
            "dummy_credit_card": "require_credit_card?",
        })
    );
}

// ---------------------------------------------------------------------------
// Construction and the attribute surface
// ---------------------------------------------------------------------------

#[test]
fn builds_each_association() {
    let model = blank_cart();
    assert!(model.association_as::<Model>("dummy_user").is_some());
    assert_eq!(model.association("dummy_book").unwrap().kind_name(), "dummy_book");
    assert_eq!(model.association_names(), cart().association_names());
}

#[test]
fn sets_association_attributes_from_input() {
    let model = Composite::new(
        &cart(),
        &attrs! { "dummy_user_first_name" => "Mo", "dummy_user_last_name" => "Lawson" },
    )
    .unwrap();
    assert_eq!(model.read("dummy_user_first_name"), Some(json!("Mo")));
    assert_eq!(model.read("dummy_user_last_name"), Some(json!("Lawson")));
}

#[test]
fn sets_own_attributes_from_input() {
    let model = Composite::new(&cart(), &attrs! { "total" => 21.49, "coupon" => "SPRING" }).unwrap();
    assert_eq!(model.read("total"), Some(json!(21.49)));
    assert_eq!(model.read("tax"), Some(json!(null)));
    assert_eq!(model.read("coupon"), None);
}

#[test]
fn writing_a_namespaced_key_reaches_the_association() {
    let mut model = blank_cart();
    model.write("dummy_user_first_name", "Mo").unwrap();
    assert_eq!(model.association("dummy_user").unwrap().read("first_name"), Some(json!("Mo")));
}

#[test]
fn writing_the_association_shows_through_the_namespaced_key() {
    let mut model = blank_cart();
    model
        .association_mut("dummy_user")
        .unwrap()
        .write("last_name", json!("Lawson"))
        .unwrap();
    assert_eq!(model.read("dummy_user_last_name"), Some(json!("Lawson")));
}

#[test]
fn unknown_key_cannot_be_written() {
    let mut model = blank_cart();
    assert!(matches!(
        model.write("dummy_user_nickname", "Mo"),
        Err(forma::FormError::UnknownMember { ref member, .. }) if member == "dummy_user_nickname="
    ));
}

#[test]
fn replacing_an_association_releases_the_old_one() {
    let mut model = blank_cart();
    let mut replacement = dummy_user().new_model();
    replacement.set("first_name", "Mo").unwrap();

    let released = model.replace_association("dummy_user", Box::new(replacement)).unwrap();

    assert_eq!(released.read("first_name"), Some(json!(null)));
    assert_eq!(model.read("dummy_user_first_name"), Some(json!("Mo")));
    assert!(model.replace_association("dummy_pet", Box::new(dummy_user().new_model())).is_err());
}

#[test]
fn association_writer_builds_a_fresh_instance() {
    let mut model = blank_cart();
    assert!(model.responds_to("dummy_user="));

    model
        .call("dummy_user=", &[json!({ "first_name": "Mo", "email": "mo@example.com" })])
        .unwrap();

    assert_eq!(model.read("dummy_user_first_name"), Some(json!("Mo")));
    assert_eq!(model.call("dummy_user", &[]).unwrap()["email"], json!("mo@example.com"));
    assert!(matches!(
        model.call("dummy_user=", &[json!("Mo")]),
        Err(forma::FormError::InvalidArgument { ref member, .. }) if member == "dummy_user="
    ));
    assert!(!model.responds_to("dummy_pet="));
}

#[test]
fn associations_snapshot() {
    let model = blank_cart();
    let kinds: Vec<_> = model
        .associations()
        .into_iter()
        .map(|(name, entity)| (name, entity.kind_name()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("dummy_user", "dummy_user"),
            ("dummy_book", "dummy_book"),
            ("dummy_credit_card", "dummy_credit_card"),
        ]
    );
}

#[test]
fn composite_is_never_persisted() {
    assert!(!blank_cart().persisted());
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn validates_associations_by_boolean_condition() {
    let mut model = blank_cart();
    model.call("calculate_total", &[]).unwrap();
    assert!(!model.is_valid());

    model.write("dummy_user_email", "bob@example.com").unwrap();
    assert!(model.is_valid());
}

#[test]
fn validates_associations_by_named_predicate() {
    let mut model = blank_cart();
    model.call("calculate_total", &[]).unwrap();
    model.write("dummy_user_email", "bob@example.com").unwrap();
    assert!(model.is_valid());

    model.write("dummy_book_price", 12.95).unwrap();
    assert!(!model.is_valid());
    assert_eq!(model.errors().get("dummy_credit_card_number"), [
        "can't be blank",
        "is too short (minimum is 12 characters)",
    ]);

    model.write("dummy_credit_card_number", 4_242_424_242_424_242_u64).unwrap();
    assert!(model.is_valid());
}

#[test]
fn full_messages_list_own_errors_then_association_errors() {
    let mut model = blank_cart();
    assert!(!model.is_valid());
    assert_eq!(
        model.errors().full_messages(),
        vec!["Total is not a number", "Dummy user email can't be blank"]
    );
}

#[test]
fn errors_are_recomputed_on_every_check() {
    let mut model = blank_cart();
    assert!(!model.is_valid());
    model.write("total", 0).unwrap();
    model.write("dummy_user_email", "bob@example.com").unwrap();
    assert!(model.is_valid());
    assert!(model.errors().is_empty());
}

#[test]
fn merged_messages_append_to_own_messages_on_the_same_key() {
    let shape = forma::CompositeType::builder("Signup")
        .attributes_for("dummy_user", std::sync::Arc::new(dummy_user()), forma::AssociationOptions::default())
        .validates(Validator::format("dummy_user_email", "@").unwrap().message("needs an @"))
        .build()
        .unwrap();
    let mut model = Composite::new(&shape, &attrs! {}).unwrap();

    assert!(!model.is_valid());
    assert_eq!(model.errors().get("dummy_user_email"), ["needs an @", "can't be blank"]);
}

// ---------------------------------------------------------------------------
// Save
// ---------------------------------------------------------------------------

#[test]
fn save_persists_associations_and_returns_self() {
    let mut store = MemoryStore::new();
    let mut model = blank_cart();
    model.write("dummy_user_email", "bob@example.com").unwrap();
    model.call("calculate_total", &[]).unwrap();

    let saved = model.save(&mut store).unwrap().expect("valid cart saves");
    assert_eq!(saved.read("dummy_user_email"), Some(json!("bob@example.com")));

    // Only the user can persist itself.
    assert_eq!(store.journal().len(), 1);
    assert_eq!(store.journal()[0].kind, "dummy_user");
    assert_eq!(store.journal()[0].data["email"], json!("bob@example.com"));
}

#[test]
fn save_refuses_invalid_composite() {
    let mut store = MemoryStore::new();
    let mut model = blank_cart();

    assert!(model.save(&mut store).unwrap().is_none());
    assert!(store.journal().is_empty());
    assert_eq!(store.transactions(), 0);
    assert!(model.errors().contains("dummy_user_email"));
}
