//! Host service contracts.
//!
//! The timeline pipeline never talks HTTP itself. It consumes three services
//! provided by the host platform; `chron-dataverse` implements all of them over
//! the Web API and tests use in-memory fakes.

use std::collections::HashMap;
use std::future::Future;

use crate::model::AuditPage;

/// Paged audit query service.
pub trait AuditSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run `query` (an OData query string starting with `?`) against `entity`.
    fn retrieve_multiple(
        &self,
        entity: &str,
        query: &str,
    ) -> impl Future<Output = Result<AuditPage, Self::Error>> + Send;
}

/// Single-record field lookup.
pub trait RecordSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Current value of `field` on record `entity`/`id`, `None` when unset.
    fn retrieve_field(
        &self,
        entity: &str,
        id: &str,
        field: &str,
    ) -> impl Future<Output = Result<Option<serde_json::Value>, Self::Error>> + Send;
}

/// Entity metadata lookups.
pub trait MetadataSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Primary display attribute of `entity`, `None` when the host has none.
    fn primary_name_attribute(
        &self,
        entity: &str,
    ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;

    /// Display label for each logical name. Names without a label map to
    /// themselves.
    fn attribute_labels(
        &self,
        entity: &str,
        names: &[String],
    ) -> impl Future<Output = Result<HashMap<String, String>, Self::Error>> + Send;
}
