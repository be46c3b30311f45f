//! Timeline data model.
//!
//! ```text
//! RawAuditRecord ──parse──▶ ParsedChange* ──resolve──▶ AuditChangeLine* ──group──▶ AuditRow
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::reference::parse_entity_ref;

/// Pointer to a record: logical entity name plus its identifier.
///
/// Only produced by [`parse_entity_ref`], so `id` is always a sanitized
/// canonical GUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity: String,
    pub id: String,
}

impl EntityRef {
    /// Key used by the record-name cache.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("{}|{}", self.entity, self.id)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.entity, self.id)
    }
}

impl FromStr for EntityRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_entity_ref(s).ok_or_else(|| {
            CoreError::Validation(format!(
                "'{s}' is not a record reference (expected `<entity>,<guid>`)"
            ))
        })
    }
}

/// One field-level delta decoded from a change payload.
///
/// `old_value`/`new_value` start as raw text and are rewritten in place to a
/// display name when they decode as references; the decoded reference is kept
/// in `old_ref`/`new_ref` for navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedChange {
    pub field_name: String,
    pub old_value: String,
    pub new_value: String,
    pub old_ref: Option<EntityRef>,
    pub new_ref: Option<EntityRef>,
}

/// Display-ready change line of a timeline row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditChangeLine {
    /// Friendly field label (or the logical name when no label is known).
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_ref: Option<EntityRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_ref: Option<EntityRef>,
}

/// One timeline entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRow {
    /// Original audit id or a synthetic `grp:` group key.
    pub audit_id: String,
    pub operation: String,
    /// Host-formatted creation time, used verbatim for grouping.
    pub created_on: String,
    pub user: String,
    pub changes: Vec<AuditChangeLine>,
    /// Contributing attribute masks joined with `" | "`.
    pub attribute_mask: String,
}

/// An audit record as returned by the host, before normalization.
///
/// `operation`, `created_on` and `user` carry the host's formatted values when
/// available and fall back to the raw values otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAuditRecord {
    pub audit_id: String,
    pub operation: String,
    pub created_on: String,
    pub user: String,
    pub attribute_mask: String,
    /// Raw `changedata` value; absent when change detail was not selected.
    pub change_data: Option<serde_json::Value>,
}

/// One page of audit records plus the host continuation cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditPage {
    pub records: Vec<RawAuditRecord>,
    pub next_link: Option<String>,
}
