//! Grouping of raw audit records into timeline rows.
//!
//! The host sometimes splits one logical operation into several audit records.
//! Records sharing `(operation, created_on, user)` are one event: they become a
//! single [`AuditRow`] whose id is the synthetic `grp:` key, so the same event
//! arriving on a later page merges into the existing row.

use std::collections::HashMap;

use chron_core::{
    AuditChangeLine, AuditRow, ParsedChange, RawAuditRecord, UNKNOWN_FIELD, parse_change_data,
};

/// Prefix of synthetic row ids.
pub const GROUP_ID_PREFIX: &str = "grp:";

/// Separator used when joining attribute masks for display.
pub const MASK_SEPARATOR: &str = " | ";

const KEY_SEPARATOR: &str = "||";

/// A raw record with its decoded change list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedEntry {
    pub record: RawAuditRecord,
    pub changes: Vec<ParsedChange>,
}

impl ParsedEntry {
    /// Decode the record's change payload. With `include_change_data` off the
    /// payload is ignored and the entry carries no changes.
    #[must_use]
    pub fn from_record(mut record: RawAuditRecord, include_change_data: bool) -> Self {
        let payload = record.change_data.take();
        let changes = match payload {
            Some(raw) if include_change_data => parse_change_data(&raw),
            _ => Vec::new(),
        };
        Self { record, changes }
    }
}

/// Distinct changed field names across `entries`, first-seen order, without
/// the unknown-field sentinel.
#[must_use]
pub fn distinct_field_names(entries: &[ParsedEntry]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for change in entries.iter().flat_map(|e| &e.changes) {
        let name = &change.field_name;
        if !name.is_empty() && name != UNKNOWN_FIELD && !names.contains(name) {
            names.push(name.clone());
        }
    }
    names
}

/// `operation||created_on||user`
#[must_use]
pub fn group_key(operation: &str, created_on: &str, user: &str) -> String {
    [operation, created_on, user].join(KEY_SEPARATOR)
}

/// Synthetic row id for a group key.
#[must_use]
pub fn group_row_id(key: &str) -> String {
    format!("{GROUP_ID_PREFIX}{key}")
}

/// Group one page of entries, in arrival order.
///
/// Change lines keep arrival order within a group and take their field label
/// from `label_for`. Non-empty attribute masks are collected and deduplicated.
#[must_use]
pub fn group_page<F>(entries: Vec<ParsedEntry>, label_for: F) -> Vec<AuditRow>
where
    F: Fn(&str) -> String,
{
    let mut rows: Vec<AuditRow> = Vec::new();
    let mut masks: Vec<Vec<String>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for ParsedEntry { record, changes } in entries {
        let key = group_key(&record.operation, &record.created_on, &record.user);
        let slot = *index.entry(key).or_insert_with_key(|key| {
            rows.push(AuditRow {
                audit_id: group_row_id(key),
                operation: record.operation.clone(),
                created_on: record.created_on.clone(),
                user: record.user.clone(),
                changes: Vec::new(),
                attribute_mask: String::new(),
            });
            masks.push(Vec::new());
            rows.len() - 1
        });

        if !record.attribute_mask.is_empty() && !masks[slot].contains(&record.attribute_mask) {
            masks[slot].push(record.attribute_mask);
        }

        rows[slot]
            .changes
            .extend(changes.into_iter().map(|c| AuditChangeLine {
                field: label_for(&c.field_name),
                old_value: c.old_value,
                new_value: c.new_value,
                old_ref: c.old_ref,
                new_ref: c.new_ref,
            }));
    }

    for (row, row_masks) in rows.iter_mut().zip(masks) {
        row.attribute_mask = row_masks.join(MASK_SEPARATOR);
    }
    rows
}

/// Merge `incoming` rows into `existing`, keyed by `audit_id`.
///
/// New ids are appended in order; existing rows keep their position. On a
/// collision the incoming change lines are appended after the existing ones
/// and the masks are merged without repeating a segment.
pub fn merge_rows(existing: &mut Vec<AuditRow>, incoming: Vec<AuditRow>) {
    let mut index: HashMap<String, usize> = existing
        .iter()
        .enumerate()
        .map(|(i, row)| (row.audit_id.clone(), i))
        .collect();

    for row in incoming {
        if let Some(&i) = index.get(&row.audit_id) {
            let target = &mut existing[i];
            target.changes.extend(row.changes);
            target.attribute_mask = merge_masks(&target.attribute_mask, &row.attribute_mask);
        } else {
            index.insert(row.audit_id.clone(), existing.len());
            existing.push(row);
        }
    }
}

/// Join two `" | "`-separated mask lists, keeping first-seen order and
/// dropping empty or repeated segments.
#[must_use]
pub fn merge_masks(left: &str, right: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in left.split(MASK_SEPARATOR).chain(right.split(MASK_SEPARATOR)) {
        if !segment.is_empty() && !segments.contains(&segment) {
            segments.push(segment);
        }
    }
    segments.join(MASK_SEPARATOR)
}
