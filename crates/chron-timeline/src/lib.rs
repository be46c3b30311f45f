//! # chron-timeline
//!
//! The audit timeline pipeline for Chronicle.
//!
//! - [`resolver`]: field labels and record reference display names, cached
//!   per controller
//! - [`grouping`]: collapses split audit records into one row per
//!   `(operation, created_on, user)` and merges pages
//! - [`controller`]: load state, paging through the host cursor, render
//!   snapshots
//! - [`view`]: filtering, sorting and value formatting for presentation
//! - [`navigation`]: opening a referenced record
//!
//! The controller is generic over the host services from `chron-core`; the
//! `chron-dataverse` client is the production implementation.

pub mod cache;
pub mod controller;
pub mod grouping;
pub mod navigation;
pub mod query;
pub mod resolver;
pub mod view;

pub use controller::{LoadState, NO_RECORD_MESSAGE, RecordContext, TimelineController, TimelineSnapshot};
pub use grouping::{GROUP_ID_PREFIX, ParsedEntry, group_key, group_page, merge_rows};
pub use navigation::{LogNavigator, Navigator, UrlNavigator};
pub use query::{AUDIT_ENTITY, AuditQuery, continuation_query};
pub use resolver::LabelResolver;
pub use view::{
    OperationAccent, SortColumn, SortDirection, TimelineFilter, apply_filter, field_options,
    filter_field_options, format_audit_value, operation_accent, selected_fields_summary, sort_rows,
};
