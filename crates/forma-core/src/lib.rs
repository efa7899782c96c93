//! # forma-core
//!
//! Shared vocabulary for the Forma crates.
//!
//! This crate provides the types every other Forma crate builds on:
//! - `Value` / `Attributes`: the flat, ordered attribute maps used as input and records
//! - The entity capability (`EntityKind`, `Entity`, `Persist`) consumed by composites
//! - The store collaborator (`Store`) with its single atomic unit-of-work operation
//! - Validation vocabulary: `Errors`, `Validator`, `ValidatorKind`, `ValidatorOptions`
//! - `Model` / `ModelKind`: a record-backed entity implementation
//! - Cross-cutting error types

pub mod entity;
pub mod errors;
pub mod model;
pub mod store;
pub mod validation;
pub mod value;

pub use entity::{Entity, EntityKind, Persist};
pub use errors::{EntityError, StoreError};
pub use model::{Model, ModelKind, ModelKindBuilder};
pub use store::{Detached, Store};
pub use validation::{Errors, ValidationContext, Validator, ValidatorKind, ValidatorOptions};
pub use value::{Attributes, Value};
