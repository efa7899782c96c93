//! Composite declaration and save behavior.

use serde::{Deserialize, Serialize};

const fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompositeConfig {
    /// Default for whether `save` wraps persistence in a store transaction.
    /// Individual composite instances may override it.
    #[serde(default = "enabled")]
    pub transactional: bool,

    /// Reject duplicate association names and colliding namespaced attribute
    /// keys when a composite type is declared. When off, a redeclared
    /// association replaces the earlier one in place.
    #[serde(default = "enabled")]
    pub strict_keys: bool,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            transactional: enabled(),
            strict_keys: enabled(),
        }
    }
}
