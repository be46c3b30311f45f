//! Dataverse Web API connection settings.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

const fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataverseConfig {
    /// Organization URL (e.g., `https://contoso.crm.dynamics.com`).
    #[serde(default)]
    pub client_url: String,

    /// OAuth bearer token. Empty means the requests go out unauthenticated
    /// (useful behind an authenticating proxy).
    #[serde(default)]
    pub access_token: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DataverseConfig {
    fn default() -> Self {
        Self {
            client_url: String::new(),
            access_token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DataverseConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.client_url.trim().is_empty()
    }

    /// Client URL without trailing slashes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when no client URL is set.
    pub fn base_url(&self) -> Result<&str, ConfigError> {
        if !self.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "dataverse".into(),
            });
        }
        Ok(self.client_url.trim().trim_end_matches('/'))
    }

    /// Copy with the access token masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            access_token: if self.access_token.is_empty() {
                String::new()
            } else {
                "***".to_string()
            },
            ..self.clone()
        }
    }
}
