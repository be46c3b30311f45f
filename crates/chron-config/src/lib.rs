//! # chron-config
//!
//! Layered configuration loading for Chronicle using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CHRONICLE_*` prefix, `__` as separator)
//! 2. Project-level `.chronicle/config.toml`
//! 3. User-level `~/.config/chronicle/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CHRONICLE_TIMELINE__PAGE_SIZE` -> `timeline.page_size`,
//! `CHRONICLE_DATAVERSE__CLIENT_URL` -> `dataverse.client_url`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use chron_config::ChronConfig;
//!
//! let config = ChronConfig::load_with_dotenv().expect("config");
//! config.timeline.validate().expect("valid timeline options");
//!
//! if config.dataverse.is_configured() {
//!     println!("Dataverse: {}", config.dataverse.client_url);
//! }
//! ```

mod dataverse;
mod error;
mod timeline;

pub use dataverse::DataverseConfig;
pub use error::ConfigError;
pub use timeline::TimelineConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChronConfig {
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub dataverse: DataverseConfig,
}

impl ChronConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source cannot be parsed or a value
    /// has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests and the CLI can layer extra providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        let local_path = PathBuf::from(".chronicle/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("CHRONICLE_").split("__"))
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("chronicle").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = ChronConfig::default();
        assert_eq!(config.timeline.page_size, 25);
        assert!(config.timeline.include_change_data);
        assert!(!config.dataverse.is_configured());
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config: ChronConfig = ChronConfig::figment().extract()?;
            assert_eq!(config.timeline.height, 420);
            assert!(!config.timeline.show_load_more);
            Ok(())
        });
    }
}
