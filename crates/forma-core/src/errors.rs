//! Cross-cutting error types for Forma.
//!
//! Errors raised by entities and by the store collaborator. Composite-level
//! errors (`FormError`) live in the `forma` crate, where these converge.

use thiserror::Error;

/// Errors from the persistent-store collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key lookup returned no record.
    #[error("{kind} not found: {key}")]
    NotFound { kind: String, key: String },

    /// The store or entity kind does not offer the requested operation.
    #[error("{kind} does not support {operation}")]
    Unsupported {
        kind: String,
        operation: &'static str,
    },

    /// The backing store failed.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Errors raised by entity members.
#[derive(Debug, Error)]
pub enum EntityError {
    /// The entity has no member with this name.
    #[error("undefined member `{member}` for {entity}")]
    UnknownMember { entity: String, member: String },

    /// A member was invoked with the wrong number of arguments.
    #[error("wrong number of arguments for `{member}` (given {given}, expected {expected})")]
    InvalidArguments {
        member: String,
        given: usize,
        expected: usize,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Catch-all for failures inside user-defined methods.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EntityError {
    pub(crate) fn unknown_member(entity: &str, member: &str) -> Self {
        Self::UnknownMember {
            entity: entity.to_string(),
            member: member.to_string(),
        }
    }

    /// Fail unless `args` holds exactly `expected` values.
    ///
    /// # Errors
    ///
    /// Returns `EntityError::InvalidArguments` on an arity mismatch.
    pub fn check_arity(member: &str, args: &[serde_json::Value], expected: usize) -> Result<(), Self> {
        if args.len() == expected {
            Ok(())
        } else {
            Err(Self::InvalidArguments {
                member: member.to_string(),
                given: args.len(),
                expected,
            })
        }
    }
}
