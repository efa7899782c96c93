//! # forma
//!
//! Composite entities assembled from several independently validated
//! sub-entities ("associations").
//!
//! A [`CompositeType`] is declared once with its own attributes and one
//! `attributes_for` call per association. Every attribute of an associated
//! kind joins the composite's attribute surface under the namespaced key
//! `<association>_<attribute>`. A [`Composite`] instance then:
//!
//! - splits flat construction input per association and resolves each
//!   sub-entity through [`AssociationBuilder`] (load by primary key and
//!   overlay, or construct fresh)
//! - reads and writes namespaced keys through the owning sub-entity
//! - merges sub-entity validation errors under namespaced keys, gated by each
//!   association's [`ValidationCondition`]
//! - persists every sub-entity in one `save`, optionally inside a store
//!   transaction
//! - forwards unknown `<association>_<member>` calls to the sub-entity
//!
//! ```
//! use std::sync::Arc;
//!
//! use forma::{AssociationOptions, Composite, CompositeType};
//! use forma_core::{ModelKind, Validator, attrs};
//!
//! let user = ModelKind::builder("user")
//!     .attributes(["name", "email"])
//!     .validates(Validator::presence("email"))
//!     .build();
//!
//! let signup = CompositeType::builder("Signup")
//!     .attribute("plan")
//!     .attributes_for("user", Arc::new(user), AssociationOptions::default())
//!     .build()?;
//!
//! let mut form = Composite::new(&signup, &attrs! { "plan" => "pro", "user_name" => "Mo" })?;
//! assert!(!form.is_valid());
//! assert_eq!(form.errors().get("user_email"), ["can't be blank"]);
//! # Ok::<(), forma::FormError>(())
//! ```

mod builder;
mod composite;
mod condition;
mod definition;
mod error;
mod forward;
mod registry;

pub use builder::AssociationBuilder;
pub use composite::Composite;
pub use condition::{AssociationOptions, ValidationCondition};
pub use definition::AssociationDefinition;
pub use error::FormError;
pub use forward::resolve_member;
pub use registry::{BeforeSave, CompositeMethod, CompositePredicate, CompositeType, CompositeTypeBuilder, Slot};
