//! # forma-config
//!
//! Layered configuration loading for Forma using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`FORMA_*` prefix, `__` as separator)
//! 2. Project-level `.forma/config.toml`
//! 3. User-level `~/.config/forma/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `FORMA_COMPOSITE__TRANSACTIONAL` -> `composite.transactional`,
//! `FORMA_STORE__FIRST_KEY` -> `store.first_key`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use forma_config::FormaConfig;
//!
//! let config = FormaConfig::load_with_dotenv().expect("config");
//! if config.composite.strict_keys {
//!     println!("namespaced key collisions are rejected");
//! }
//! ```

mod composite;
mod error;
mod store;

pub use composite::CompositeConfig;
pub use error::ConfigError;
pub use store::StoreConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FormaConfig {
    #[serde(default)]
    pub composite: CompositeConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl FormaConfig {
    /// Load configuration from defaults, TOML files and `FORMA_*` variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source cannot be parsed, or
    /// `ConfigError::InvalidValue` if a value is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment())
    }

    /// Like [`Self::load`], after reading the nearest `.env` into the
    /// environment.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv();
        Self::load()
    }

    /// Extract and check a configuration from an arbitrary figment.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then user TOML, then project TOML, then environment.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".forma/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("FORMA_").split("__"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store.first_key == 0 {
            return Err(ConfigError::InvalidValue {
                field: "store.first_key".into(),
                reason: "keys start at 1".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("forma").join("config.toml"))
    }

    /// A missing `.env` is not an error.
    fn load_dotenv() {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = FormaConfig::default();
        assert!(config.composite.transactional);
        assert!(config.composite.strict_keys);
        assert_eq!(config.store.first_key, 1);
    }

    #[test]
    fn figment_builds_without_files() {
        let config: FormaConfig = FormaConfig::figment()
            .extract()
            .expect("should extract defaults");
        assert!(config.composite.strict_keys);
    }

    #[test]
    fn zero_first_key_is_rejected() {
        let figment = Figment::from(Serialized::defaults(FormaConfig::default()))
            .merge(Serialized::default("store.first_key", 0));
        let result = FormaConfig::from_figment(&figment);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}
