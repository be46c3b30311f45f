//! Shared HTTP response helpers.
//!
//! Centralizes status-code checks (429 rate limiting with `Retry-After`
//! parsing, non-success → [`DataverseError::Api`]) so the service modules stay
//! focused on request construction and response mapping.

use crate::error::DataverseError;

/// Check an HTTP response for common error conditions.
///
/// Returns the response unchanged on success. Handles:
/// - **429 Too Many Requests** → [`DataverseError::RateLimited`] with
///   `Retry-After` header parsing (falls back to 60 s if absent or
///   unparseable).
/// - **Non-success status** → [`DataverseError::Api`] with status code and the
///   Web API error message when the body carries one.
pub async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, DataverseError> {
    if resp.status() == 429 {
        let retry_after = parse_retry_after(&resp);
        return Err(DataverseError::RateLimited {
            retry_after_secs: retry_after,
        });
    }
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(DataverseError::Api {
            status,
            message: api_error_message(&body),
        });
    }
    Ok(resp)
}

/// Parse the `Retry-After` header as seconds, falling back to 60 s.
fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}

/// Pull `error.message` out of an OData error body, else return the body.
fn api_error_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ODataError {
        error: ODataErrorBody,
    }
    #[derive(serde::Deserialize)]
    struct ODataErrorBody {
        message: String,
    }

    serde_json::from_str::<ODataError>(body).map_or_else(|_| body.to_string(), |e| e.error.message)
}
