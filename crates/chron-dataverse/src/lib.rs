//! # chron-dataverse
//!
//! Dataverse Web API client for Chronicle.
//!
//! Implements the three host services the timeline pipeline consumes:
//! - [`chron_core::AuditSource`]: paged `audits` queries with formatted values
//! - [`chron_core::RecordSource`]: single-field record lookups
//! - [`chron_core::MetadataSource`]: primary name attributes and attribute labels
//!
//! All requests go to `{client_url}/api/data/v9.2/` with the OData 4.0 headers
//! and the formatted-value annotation preference.

pub mod audit;
pub mod metadata;
pub mod record;

mod error;
mod http;

pub use error::DataverseError;

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chron_config::DataverseConfig;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};

use crate::http::check_response;

/// Web API path appended to the organization URL.
const API_PATH: &str = "/api/data/v9.2";

/// Ask the service to annotate option sets, lookups and dates with display text.
const FORMATTED_VALUES_PREFERENCE: &str =
    r#"odata.include-annotations="OData.Community.Display.V1.FormattedValue""#;

/// HTTP client for one Dataverse organization.
pub struct DataverseClient {
    http: reqwest::Client,
    api_base: String,
    access_token: Option<String>,
    /// Logical name → entity set name, fetched from metadata once per entity.
    entity_sets: Mutex<HashMap<String, String>>,
}

impl DataverseClient {
    /// Create a client for `client_url` (organization root URL).
    ///
    /// # Errors
    ///
    /// Returns [`DataverseError::Http`] if the underlying `reqwest::Client`
    /// cannot be built.
    pub fn new(
        client_url: &str,
        access_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, DataverseError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert("OData-MaxVersion", HeaderValue::from_static("4.0"));
        headers.insert("OData-Version", HeaderValue::from_static("4.0"));
        headers.insert("Prefer", HeaderValue::from_static(FORMATTED_VALUES_PREFERENCE));

        let http = reqwest::Client::builder()
            .user_agent("chronicle/0.1")
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api_base: format!("{}{API_PATH}", client_url.trim_end_matches('/')),
            access_token: access_token.filter(|t| !t.is_empty()),
            entity_sets: Mutex::new(HashMap::new()),
        })
    }

    /// Create a client from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DataverseError::Config`] when no client URL is configured, or
    /// [`DataverseError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &DataverseConfig) -> Result<Self, DataverseError> {
        Self::new(
            config.base_url()?,
            Some(config.access_token.clone()),
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Web API root, e.g. `https://contoso.crm.dynamics.com/api/data/v9.2`.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// GET `{api_base}{path}` and decode the JSON body.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, DataverseError> {
        let url = format!("{}{path}", self.api_base);
        tracing::debug!(%url, "dataverse request");

        let mut request = self.http.get(&url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        let resp = check_response(request.send().await?).await?;
        Ok(resp.json().await?)
    }

    /// Entity set name for a logical name (`audit` → `audits`).
    async fn entity_set_name(&self, entity: &str) -> Result<String, DataverseError> {
        let cached = self
            .entity_sets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(entity)
            .cloned();
        if let Some(set) = cached {
            return Ok(set);
        }

        let definition: metadata::EntityDefinition = self
            .get_json(&metadata::entity_definition_path(entity, "EntitySetName"))
            .await?;
        let set = definition
            .entity_set_name
            .filter(|s| !s.is_empty())
            .ok_or_else(|| DataverseError::Parse(format!("entity '{entity}' has no entity set")))?;

        self.entity_sets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(entity.to_string(), set.clone());
        Ok(set)
    }
}

/// Quote a string literal for an OData URL segment or filter.
pub(crate) fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
