//! Change payload parser.
//!
//! The audit `changedata` column carries a JSON document of the shape
//!
//! ```json
//! { "changedAttributes": [ { "logicalName": "name", "oldValue": "A", "newValue": "B" } ] }
//! ```
//!
//! Historical rows are not always well formed. Anything that does not decode
//! yields an empty change list so one bad record cannot block the timeline.

use serde::Deserialize;
use serde_json::Value;

use crate::model::ParsedChange;
use crate::text::ToText;

/// Field name used when a changed attribute carries no logical name.
///
/// Never sent to metadata label resolution and never offered as a field option.
pub const UNKNOWN_FIELD: &str = "(unknown)";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeData {
    #[serde(default)]
    changed_attributes: Option<Vec<ChangedAttribute>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangedAttribute {
    #[serde(default)]
    logical_name: Option<Value>,
    #[serde(default)]
    old_value: Value,
    #[serde(default)]
    new_value: Value,
}

/// Decode a raw `changedata` value into field-level changes.
///
/// The value is coerced to text first, so both a JSON string column and an
/// already-decoded object are accepted.
#[must_use]
pub fn parse_change_data(raw: &Value) -> Vec<ParsedChange> {
    let text = raw.to_text();
    if text.is_empty() {
        return Vec::new();
    }

    let Ok(data) = serde_json::from_str::<ChangeData>(&text) else {
        return Vec::new();
    };

    data.changed_attributes
        .unwrap_or_default()
        .into_iter()
        .map(|attr| ParsedChange {
            field_name: match attr.logical_name {
                None | Some(Value::Null) => UNKNOWN_FIELD.to_string(),
                Some(name) => name.to_text(),
            },
            old_value: attr.old_value.to_text(),
            new_value: attr.new_value.to_text(),
            old_ref: None,
            new_ref: None,
        })
        .collect()
}
