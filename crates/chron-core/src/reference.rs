//! Reference parser for compact `"<entity>,<guid>"` values.
//!
//! Lookup columns show up in change payloads as `contact,{3fa85f64-...}`. A
//! value only counts as a reference when it splits into exactly two
//! comma-separated parts, the entity part is non-empty after trimming and the
//! identifier part is a canonical 8-4-4-4-12 hex GUID once braces and
//! surrounding whitespace are removed.

use crate::model::EntityRef;

/// Lengths of the hyphen-separated GUID groups.
const GUID_GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Strip `{`/`}` anywhere in the value, then surrounding whitespace.
#[must_use]
pub fn sanitize_guid(raw: &str) -> String {
    raw.replace(['{', '}'], "").trim().to_string()
}

/// Case-insensitive check for the canonical hyphenated GUID shape.
#[must_use]
pub fn is_guid(value: &str) -> bool {
    let groups: Vec<&str> = value.split('-').collect();
    groups.len() == GUID_GROUPS.len()
        && groups
            .iter()
            .zip(GUID_GROUPS)
            .all(|(group, len)| group.len() == len && group.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Decode a reference value. Total: anything else yields `None`.
#[must_use]
pub fn parse_entity_ref(value: &str) -> Option<EntityRef> {
    let mut parts = value.split(',');
    let (Some(entity), Some(id), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };

    let entity = entity.trim();
    let id = sanitize_guid(id);
    if entity.is_empty() || !is_guid(&id) {
        return None;
    }

    Some(EntityRef {
        entity: entity.to_string(),
        id,
    })
}
