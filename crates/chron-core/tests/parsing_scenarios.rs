//! End-to-end checks of the pure parsers against realistic audit payloads.

use chron_core::{EntityRef, UNKNOWN_FIELD, parse_change_data, parse_entity_ref};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn braced_contact_reference() {
    assert_eq!(
        parse_entity_ref("contact,{3fa85f64-5717-4562-b3fc-2c963f66afa6}"),
        Some(EntityRef {
            entity: "contact".to_string(),
            id: "3fa85f64-5717-4562-b3fc-2c963f66afa6".to_string(),
        })
    );
}

#[test]
fn malformed_payload_yields_no_changes() {
    assert!(parse_change_data(&json!("{not json")).is_empty());
}

#[test]
fn lookup_values_in_payload_decode_as_references() {
    let payload = json!(
        r#"{"changedAttributes":[
            {"logicalName":"ownerid","oldValue":"systemuser,{11111111-2222-3333-4444-555555555555}","newValue":"team,66666666-7777-8888-9999-aaaaaaaaaaaa"},
            {"logicalName":"statuscode","oldValue":1,"newValue":2},
            {"oldValue":"a","newValue":"b"}
        ]}"#
    );

    let changes = parse_change_data(&payload);
    assert_eq!(changes.len(), 3);

    let owner = &changes[0];
    assert_eq!(owner.field_name, "ownerid");
    assert_eq!(
        parse_entity_ref(&owner.old_value).map(|r| r.entity),
        Some("systemuser".to_string())
    );
    assert_eq!(
        parse_entity_ref(&owner.new_value).map(|r| r.id),
        Some("66666666-7777-8888-9999-aaaaaaaaaaaa".to_string())
    );

    assert_eq!(parse_entity_ref(&changes[1].new_value), None);
    assert_eq!(changes[2].field_name, UNKNOWN_FIELD);
}
