//! # chron-core
//!
//! Core types and pure parsers for Chronicle.
//!
//! This crate provides the foundational pieces shared across all Chronicle crates:
//! - Timeline data model (entity references, parsed changes, audit rows)
//! - Reference parser for compact `entity,guid` values
//! - Change payload parser for the audit `changedata` blob
//! - Canonical text coercion used by both parsers
//! - Source traits describing the host query, record and metadata services
//! - Cross-cutting error types

pub mod change;
pub mod errors;
pub mod model;
pub mod reference;
pub mod source;
pub mod text;

pub use change::{UNKNOWN_FIELD, parse_change_data};
pub use errors::CoreError;
pub use model::{AuditChangeLine, AuditPage, AuditRow, EntityRef, ParsedChange, RawAuditRecord};
pub use reference::{parse_entity_ref, sanitize_guid};
pub use source::{AuditSource, MetadataSource, RecordSource};
pub use text::ToText;
