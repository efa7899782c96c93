//! Composite error types.

use forma_core::{EntityError, StoreError};
use thiserror::Error;

/// Errors from declaring, building, forwarding to, or saving a composite.
///
/// Validation failures are not errors: they are collected in the composite's
/// `Errors` and reported through `is_valid` / `save`.
#[derive(Debug, Error)]
pub enum FormError {
    /// A composite type was declared incorrectly.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Primary-key lookup found no stored record while building an association.
    #[error("{kind} not found: {key}")]
    NotFound { kind: String, key: String },

    /// Neither the composite nor any association exposes this member.
    #[error("undefined member `{member}` for {receiver}")]
    UnknownMember { receiver: String, member: String },

    /// A member was given a value of the wrong shape.
    #[error("`{member}` expects {expected}")]
    InvalidArgument { member: String, expected: &'static str },

    #[error(transparent)]
    Entity(EntityError),

    #[error(transparent)]
    Store(StoreError),
}

impl FormError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub(crate) fn unknown_member(receiver: &str, member: &str) -> Self {
        Self::UnknownMember {
            receiver: receiver.to_string(),
            member: member.to_string(),
        }
    }
}

impl From<StoreError> for FormError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound { kind, key } => Self::NotFound { kind, key },
            other => Self::Store(other),
        }
    }
}

impl From<EntityError> for FormError {
    fn from(error: EntityError) -> Self {
        match error {
            EntityError::Store(store) => store.into(),
            other => Self::Entity(other),
        }
    }
}
