//! In-memory store configuration.

use serde::{Deserialize, Serialize};

const fn default_first_key() -> u64 {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// First key assigned to records saved without one.
    #[serde(default = "default_first_key")]
    pub first_key: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            first_key: default_first_key(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        assert_eq!(StoreConfig::default().first_key, 1);
    }
}
