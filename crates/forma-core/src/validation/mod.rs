//! Validation vocabulary: the error set and declarative validators.

mod error_set;
mod validator;

pub use error_set::{Errors, humanize};
pub use validator::{ValidationContext, Validator, ValidatorKind, ValidatorOptions};
