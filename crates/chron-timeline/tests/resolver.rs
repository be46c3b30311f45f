mod support;

use chron_core::{EntityRef, ParsedChange, UNKNOWN_FIELD};
use chron_timeline::LabelResolver;
use pretty_assertions::assert_eq;
use serde_json::json;

use support::{CONTACT_ALICE, CONTACT_BOB, FakeHost};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

fn contacts() -> FakeHost {
    FakeHost::new()
        .with_primary_attr("contact", "fullname")
        .with_record_name("contact", CONTACT_ALICE, json!("Alice"))
        .with_record_name("contact", CONTACT_BOB, json!("Bob"))
}

fn change(field: &str, old: &str, new: &str) -> ParsedChange {
    ParsedChange {
        field_name: field.into(),
        old_value: old.into(),
        new_value: new.into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn braced_reference_resolves_to_display_name() {
    let host = contacts();
    let resolver = LabelResolver::new();

    let shown = resolver
        .resolve_reference(&host, &format!("contact,{{{CONTACT_ALICE}}}"))
        .await;
    assert_eq!(shown, "Alice");
    assert_eq!(resolver.cached_record_names(), 1);
}

#[tokio::test]
async fn plain_values_pass_through_without_calls() {
    let host = contacts();
    let resolver = LabelResolver::new();

    for value in ["Open", "", "contact,not-a-guid", "a,b,c"] {
        assert_eq!(resolver.resolve_reference(&host, value).await, value);
    }
    assert_eq!(host.primary_calls(), 0);
    assert_eq!(host.record_calls(), 0);
}

#[tokio::test]
async fn record_names_are_cached() {
    let host = contacts();
    let resolver = LabelResolver::new();
    let value = format!("contact,{CONTACT_ALICE}");

    resolver.resolve_reference(&host, &value).await;
    resolver.resolve_reference(&host, &value).await;

    assert_eq!(host.record_calls(), 1);
    assert_eq!(host.primary_calls(), 1);
}

#[tokio::test]
async fn failed_lookup_is_retried_next_time() {
    let host = contacts();
    host.fail_record("contact", CONTACT_ALICE, true);
    let resolver = LabelResolver::new();
    let value = format!("contact,{CONTACT_ALICE}");

    assert_eq!(resolver.resolve_reference(&host, &value).await, value);
    assert_eq!(resolver.cached_record_names(), 0);

    host.fail_record("contact", CONTACT_ALICE, false);
    assert_eq!(resolver.resolve_reference(&host, &value).await, "Alice");
    assert_eq!(host.record_calls(), 2);
}

#[tokio::test]
async fn failed_lookup_cached_when_enabled() {
    let host = contacts();
    host.fail_record("contact", CONTACT_ALICE, true);
    let resolver = LabelResolver::new().with_cache_failed_lookups(true);
    let value = format!("contact,{CONTACT_ALICE}");

    assert_eq!(resolver.resolve_reference(&host, &value).await, value);
    host.fail_record("contact", CONTACT_ALICE, false);
    assert_eq!(resolver.resolve_reference(&host, &value).await, value);
    assert_eq!(host.record_calls(), 1);
}

#[tokio::test]
async fn empty_display_name_falls_back_to_raw() {
    let host = FakeHost::new()
        .with_primary_attr("contact", "fullname")
        .with_record_name("contact", CONTACT_ALICE, json!(""));
    let resolver = LabelResolver::new();
    let value = format!("contact,{CONTACT_ALICE}");

    assert_eq!(resolver.resolve_reference(&host, &value).await, value);
    assert_eq!(resolver.cached_record_names(), 0);
}

#[tokio::test]
async fn missing_primary_attribute_is_not_cached() {
    let host = contacts();
    host.fail_primary(true);
    let resolver = LabelResolver::new();
    let value = format!("contact,{CONTACT_ALICE}");

    assert_eq!(resolver.resolve_reference(&host, &value).await, value);
    assert_eq!(host.record_calls(), 0);

    host.fail_primary(false);
    assert_eq!(resolver.resolve_reference(&host, &value).await, "Alice");
    assert_eq!(host.primary_calls(), 2);
}

#[tokio::test]
async fn batch_fetches_primary_attribute_once_per_type() {
    let host = contacts();
    let resolver = LabelResolver::new();
    let mut changes = vec![
        change("primarycontactid", &format!("contact,{CONTACT_ALICE}"), &format!("contact,{CONTACT_BOB}")),
        change("parentcontactid", "", &format!("contact,{CONTACT_ALICE}")),
    ];

    let count = resolver.resolve_batch(&host, changes.iter_mut()).await;

    assert_eq!(count, 3);
    assert_eq!(host.primary_calls(), 1);
    assert_eq!(host.record_calls(), 2);
    assert_eq!(changes[0].old_value, "Alice");
    assert_eq!(changes[0].new_value, "Bob");
    assert_eq!(changes[1].new_value, "Alice");
}

#[tokio::test]
async fn batch_sets_refs_only_for_references() {
    let host = contacts();
    let resolver = LabelResolver::new();
    let mut changes = vec![change("ownerid", "Open", &format!("contact,{{{CONTACT_BOB}}}"))];

    resolver.resolve_batch(&host, changes.iter_mut()).await;

    assert_eq!(changes[0].old_ref, None);
    assert_eq!(changes[0].old_value, "Open");
    assert_eq!(
        changes[0].new_ref,
        Some(EntityRef {
            entity: "contact".into(),
            id: CONTACT_BOB.into(),
        })
    );
    assert_eq!(changes[0].new_value, "Bob");
}

#[tokio::test]
async fn one_failed_lookup_does_not_affect_siblings() {
    let host = contacts();
    host.fail_record("contact", CONTACT_BOB, true);
    let resolver = LabelResolver::new();
    let bob = format!("contact,{CONTACT_BOB}");
    let mut changes = vec![
        change("a", &format!("contact,{CONTACT_ALICE}"), &bob),
        change("b", "", "plain"),
    ];

    resolver.resolve_batch(&host, changes.iter_mut()).await;

    assert_eq!(changes[0].old_value, "Alice");
    assert_eq!(changes[0].new_value, bob);
    assert!(changes[0].new_ref.is_some());
    assert_eq!(changes[1].new_value, "plain");
}

#[tokio::test]
async fn labels_fetched_in_one_batch_and_cached() {
    let host = FakeHost::new().with_label("name", "Account Name").with_label("statuscode", "Status Reason");
    let resolver = LabelResolver::new();

    let first = resolver
        .ensure_labels(&host, "account", &names(&["name", "statuscode", UNKNOWN_FIELD, "name"]))
        .await;
    let second = resolver.ensure_labels(&host, "account", &names(&["name"])).await;

    assert_eq!(
        host.label_calls(),
        vec![("account".to_string(), names(&["name", "statuscode"]))]
    );
    assert_eq!(first["statuscode"], "Status Reason");
    assert_eq!(second["name"], "Account Name");
    assert_eq!(resolver.label_for("account", "name"), "Account Name");
    assert_eq!(resolver.label_for("account", "statuscode"), "Status Reason");
    assert_eq!(resolver.label_for("account", "ownerid"), "ownerid");
    assert_eq!(resolver.label_for("contact", "name"), "name");
}

#[tokio::test]
async fn label_failure_uses_logical_names() {
    let host = FakeHost::new().with_label("name", "Account Name");
    host.fail_labels(true);
    let resolver = LabelResolver::new();

    let labels = resolver.ensure_labels(&host, "account", &names(&["name"])).await;
    assert_eq!(labels["name"], "name");
    assert_eq!(resolver.label_for("account", "name"), "name");
}

#[tokio::test]
async fn entity_type_change_invalidates_labels() {
    let host = FakeHost::new().with_label("name", "Name");
    let resolver = LabelResolver::new();

    resolver.ensure_labels(&host, "account", &names(&["name"])).await;
    resolver.ensure_labels(&host, "contact", &names(&["name"])).await;
    resolver.ensure_labels(&host, "contact", &names(&["name"])).await;

    let entities: Vec<String> = host.label_calls().into_iter().map(|(entity, _)| entity).collect();
    assert_eq!(entities, names(&["account", "contact"]));
}

#[tokio::test]
async fn labels_fetched_for_a_replaced_entity_type_are_not_cached() {
    let host = FakeHost::new()
        .with_entity_label("account", "name", "Account Name")
        .with_entity_label("contact", "name", "Full Name");
    let gate = host.gate_labels("account");
    let resolver = LabelResolver::new();
    let requested = names(&["name"]);

    let (account, contact) = tokio::join!(
        resolver.ensure_labels(&host, "account", &requested),
        async {
            let contact = resolver.ensure_labels(&host, "contact", &requested).await;
            gate.notify_one();
            contact
        }
    );

    assert_eq!(account["name"], "Account Name");
    assert_eq!(contact["name"], "Full Name");
    assert_eq!(resolver.label_for("contact", "name"), "Full Name");
    assert_eq!(resolver.label_for("account", "name"), "name");
}
