//! Write journal.
//!
//! Every successful write appends one `StoreOperation`. Rolled-back
//! transactions truncate the journal back to where they started, so the
//! journal only ever describes committed state.

use forma_core::{Attributes, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOp {
    Insert,
    Update,
}

impl StoreOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
        }
    }
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOperation {
    pub op: StoreOp,
    pub kind: String,
    pub key: Value,
    pub data: Attributes,
}
