//! Dataverse client error types.

use thiserror::Error;

/// Errors that can occur when talking to the Dataverse Web API.
#[derive(Debug, Error)]
pub enum DataverseError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Web API returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// Failed to interpret a Web API response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The service returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// Connection settings are missing or invalid.
    #[error(transparent)]
    Config(#[from] chron_config::ConfigError),
}
