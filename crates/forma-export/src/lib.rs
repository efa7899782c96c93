//! # forma-export
//!
//! Describes a composite's active validation rules for a remote caller, in
//! the shape client-side validation libraries consume:
//!
//! ```json
//! {
//!   "total": { "numericality": [{ "messages": { "numericality": "is not a number" } }] },
//!   "dummy_user_email": { "presence": [{ "message": "can't be blank" }] }
//! }
//! ```
//!
//! The export is a read-only view over the composite: its own validators
//! first, then the validators of every association whose validation condition
//! currently holds, re-keyed as `<association>_<attribute>`. Which rules are
//! included is decided by each rule's `on` context, its `if`/`unless`
//! predicates, and a caller-supplied [`Force`] policy.

mod force;
mod hash;

pub use force::{FieldForce, Force};
pub use hash::{ValidationHash, client_side_validation_hash, export_schema};
