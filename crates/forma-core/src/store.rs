//! The persistent-store collaborator.
//!
//! Composites only need three things from a store: key lookup while building
//! sub-entities, a record write while saving, and one "run this unit of work
//! atomically" operation for transactional saves.

use crate::errors::{EntityError, StoreError};
use crate::value::{Attributes, Value};

/// A unit of work run inside [`Store::transaction`].
pub type UnitOfWork<'a> = dyn FnMut(&mut dyn Store) -> Result<(), EntityError> + 'a;

pub trait Store {
    /// Fetch the stored record of `kind` identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` when no record matches.
    fn find(&self, kind: &str, key: &Value) -> Result<Attributes, StoreError>;

    /// Insert or update a record, returning its key. A `None` key asks the
    /// store to assign one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    fn save(&mut self, kind: &str, key: Option<&Value>, record: &Attributes)
    -> Result<Value, StoreError>;

    /// Run `work` atomically: either every write inside it lands or none does.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `work`, after rolling back.
    fn transaction(&mut self, work: &mut UnitOfWork<'_>) -> Result<(), EntityError>;
}

/// A store with nothing behind it.
///
/// Used when a composite is built without a backing store: lookups and writes
/// report `StoreError::Unsupported`, transactions simply run their work.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

impl Store for Detached {
    fn find(&self, kind: &str, _key: &Value) -> Result<Attributes, StoreError> {
        Err(StoreError::Unsupported {
            kind: kind.to_string(),
            operation: "find",
        })
    }

    fn save(
        &mut self,
        kind: &str,
        _key: Option<&Value>,
        _record: &Attributes,
    ) -> Result<Value, StoreError> {
        Err(StoreError::Unsupported {
            kind: kind.to_string(),
            operation: "save",
        })
    }

    fn transaction(&mut self, work: &mut UnitOfWork<'_>) -> Result<(), EntityError> {
        work(self)
    }
}
