//! In-memory host services for timeline tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chron_core::{AuditPage, AuditSource, MetadataSource, RawAuditRecord, RecordSource};
use chron_timeline::{AuditQuery, Navigator};
use serde_json::{Value, json};
use tokio::sync::Notify;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub String);

#[derive(Default)]
struct Inner {
    pages: Mutex<HashMap<String, Result<AuditPage, String>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    label_gates: Mutex<HashMap<String, Arc<Notify>>>,
    record_names: Mutex<HashMap<String, Value>>,
    failing_records: Mutex<HashSet<String>>,
    primary_attrs: Mutex<HashMap<String, String>>,
    labels: Mutex<HashMap<String, String>>,
    entity_labels: Mutex<HashMap<String, String>>,
    fail_labels: AtomicBool,
    fail_primary: AtomicBool,
    audit_queries: Mutex<Vec<String>>,
    record_calls: AtomicUsize,
    primary_calls: AtomicUsize,
    label_calls: Mutex<Vec<(String, Vec<String>)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fake host. Clones share state, so a test can keep a handle after moving
/// one into a controller.
#[derive(Clone, Default)]
pub struct FakeHost {
    inner: Arc<Inner>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, query: &str, page: AuditPage) -> Self {
        lock(&self.inner.pages).insert(query.to_string(), Ok(page));
        self
    }

    pub fn with_failing_page(self, query: &str, message: &str) -> Self {
        lock(&self.inner.pages).insert(query.to_string(), Err(message.to_string()));
        self
    }

    /// Hold `query` until the returned handle is notified.
    pub fn gate(&self, query: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        lock(&self.inner.gates).insert(query.to_string(), Arc::clone(&notify));
        notify
    }

    /// Hold label requests for `entity` until the returned handle is notified.
    pub fn gate_labels(&self, entity: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        lock(&self.inner.label_gates).insert(entity.to_string(), Arc::clone(&notify));
        notify
    }

    pub fn with_record_name(self, entity: &str, id: &str, name: Value) -> Self {
        lock(&self.inner.record_names).insert(format!("{entity}|{id}"), name);
        self
    }

    pub fn with_primary_attr(self, entity: &str, attr: &str) -> Self {
        lock(&self.inner.primary_attrs).insert(entity.to_string(), attr.to_string());
        self
    }

    pub fn with_label(self, name: &str, label: &str) -> Self {
        lock(&self.inner.labels).insert(name.to_string(), label.to_string());
        self
    }

    /// Label for `name` on `entity` only; wins over [`Self::with_label`].
    pub fn with_entity_label(self, entity: &str, name: &str, label: &str) -> Self {
        lock(&self.inner.entity_labels).insert(format!("{entity}|{name}"), label.to_string());
        self
    }

    pub fn fail_record(&self, entity: &str, id: &str, failing: bool) {
        let key = format!("{entity}|{id}");
        let mut failing_records = lock(&self.inner.failing_records);
        if failing {
            failing_records.insert(key);
        } else {
            failing_records.remove(&key);
        }
    }

    pub fn fail_labels(&self, failing: bool) {
        self.inner.fail_labels.store(failing, Ordering::SeqCst);
    }

    pub fn fail_primary(&self, failing: bool) {
        self.inner.fail_primary.store(failing, Ordering::SeqCst);
    }

    pub fn audit_queries(&self) -> Vec<String> {
        lock(&self.inner.audit_queries).clone()
    }

    pub fn record_calls(&self) -> usize {
        self.inner.record_calls.load(Ordering::SeqCst)
    }

    pub fn primary_calls(&self) -> usize {
        self.inner.primary_calls.load(Ordering::SeqCst)
    }

    pub fn label_calls(&self) -> Vec<(String, Vec<String>)> {
        lock(&self.inner.label_calls).clone()
    }
}

impl AuditSource for FakeHost {
    type Error = FakeError;

    async fn retrieve_multiple(&self, entity: &str, query: &str) -> Result<AuditPage, FakeError> {
        assert_eq!(entity, "audit");
        lock(&self.inner.audit_queries).push(query.to_string());

        let gate = lock(&self.inner.gates).get(query).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        tokio::task::yield_now().await;

        let page = lock(&self.inner.pages).get(query).cloned();
        match page {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(FakeError(message)),
            None => Ok(AuditPage::default()),
        }
    }
}

impl RecordSource for FakeHost {
    type Error = FakeError;

    async fn retrieve_field(&self, entity: &str, id: &str, _field: &str) -> Result<Option<Value>, FakeError> {
        self.inner.record_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let key = format!("{entity}|{id}");
        if lock(&self.inner.failing_records).contains(&key) {
            return Err(FakeError(format!("record {key} unavailable")));
        }
        Ok(lock(&self.inner.record_names).get(&key).cloned())
    }
}

impl MetadataSource for FakeHost {
    type Error = FakeError;

    async fn primary_name_attribute(&self, entity: &str) -> Result<Option<String>, FakeError> {
        self.inner.primary_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        if self.inner.fail_primary.load(Ordering::SeqCst) {
            return Err(FakeError("metadata unavailable".into()));
        }
        Ok(lock(&self.inner.primary_attrs).get(entity).cloned())
    }

    async fn attribute_labels(
        &self,
        entity: &str,
        names: &[String],
    ) -> Result<HashMap<String, String>, FakeError> {
        lock(&self.inner.label_calls).push((entity.to_string(), names.to_vec()));

        let gate = lock(&self.inner.label_gates).get(entity).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        tokio::task::yield_now().await;

        if self.inner.fail_labels.load(Ordering::SeqCst) {
            return Err(FakeError("metadata unavailable".into()));
        }
        let labels = lock(&self.inner.labels);
        let entity_labels = lock(&self.inner.entity_labels);
        Ok(names
            .iter()
            .map(|name| {
                let label = entity_labels
                    .get(&format!("{entity}|{name}"))
                    .or_else(|| labels.get(name))
                    .cloned()
                    .unwrap_or_else(|| name.clone());
                (name.clone(), label)
            })
            .collect())
    }
}

/// Navigator that records what it was asked to open.
#[derive(Clone, Default)]
pub struct RecordingNavigator {
    pub opened: Arc<Mutex<Vec<(String, String)>>>,
}

impl Navigator for RecordingNavigator {
    fn open_record(&self, entity: &str, id: &str) {
        lock(&self.opened).push((entity.to_string(), id.to_string()));
    }
}

pub const RECORD_A: &str = "aaaaaaaa-0000-0000-0000-000000000001";
pub const RECORD_B: &str = "bbbbbbbb-0000-0000-0000-000000000002";
pub const CONTACT_ALICE: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
pub const CONTACT_BOB: &str = "4fa85f64-5717-4562-b3fc-2c963f66afa7";

/// First-page query with default timeline options.
pub fn first_query(record_id: &str) -> String {
    AuditQuery {
        record_id: record_id.to_string(),
        page_size: 25,
        include_change_data: true,
    }
    .to_query_string()
}

/// Audit record with a `changedata` payload built from `(field, old, new)`.
pub fn record(
    audit_id: &str,
    operation: &str,
    created_on: &str,
    user: &str,
    mask: &str,
    changes: &[(&str, &str, &str)],
) -> RawAuditRecord {
    let attributes: Vec<Value> = changes
        .iter()
        .map(|(field, old, new)| json!({ "logicalName": field, "oldValue": old, "newValue": new }))
        .collect();
    RawAuditRecord {
        audit_id: audit_id.to_string(),
        operation: operation.to_string(),
        created_on: created_on.to_string(),
        user: user.to_string(),
        attribute_mask: mask.to_string(),
        change_data: Some(Value::String(json!({ "changedAttributes": attributes }).to_string())),
    }
}

pub fn page(records: Vec<RawAuditRecord>, next_link: Option<&str>) -> AuditPage {
    AuditPage {
        records,
        next_link: next_link.map(ToString::to_string),
    }
}
