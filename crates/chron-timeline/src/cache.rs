//! In-memory caches owned by one timeline controller.
//!
//! - [`LabelCache`]: attribute labels, scoped to a single entity type and
//!   cleared wholesale when the type changes.
//! - [`OnceMap`]: append-only, first-resolution-wins values (primary name
//!   attributes, record display names). Concurrent lookups for the same key
//!   share one initialization.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chron_core::UNKNOWN_FIELD;
use tokio::sync::OnceCell;

/// Attribute logical name → display label for one entity type.
#[derive(Debug, Default)]
pub struct LabelCache {
    entity_type: Option<String>,
    labels: HashMap<String, String>,
}

impl LabelCache {
    /// Scope the cache to `entity_type`. Returns `true` when a different type
    /// was cached before, in which case every label was dropped.
    pub fn scope_to(&mut self, entity_type: &str) -> bool {
        if self.entity_type.as_deref() == Some(entity_type) {
            return false;
        }
        let had_scope = self.entity_type.is_some();
        self.entity_type = Some(entity_type.to_string());
        self.labels.clear();
        had_scope
    }

    #[must_use]
    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type.as_deref()
    }

    /// Distinct names (in first-seen order) with no cached label, skipping
    /// empty names and the unknown-field sentinel.
    #[must_use]
    pub fn missing(&self, names: &[String]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            if name.is_empty()
                || name == UNKNOWN_FIELD
                || self.labels.contains_key(name)
                || out.contains(name)
            {
                continue;
            }
            out.push(name.clone());
        }
        out
    }

    /// Cached labels for the names in `names` that have one.
    #[must_use]
    pub fn known(&self, names: &[String]) -> HashMap<String, String> {
        names
            .iter()
            .filter_map(|name| self.labels.get_key_value(name))
            .map(|(name, label)| (name.clone(), label.clone()))
            .collect()
    }

    /// First label stored for a name wins.
    pub fn insert(&mut self, name: String, label: String) {
        self.labels.entry(name).or_insert(label);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Append-only async cache. A key is set at most once; failed
/// initializations leave it unset so the next caller retries.
#[derive(Debug, Default)]
pub struct OnceMap {
    cells: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl OnceMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, key: &str) -> Arc<OnceCell<String>> {
        let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cells.entry(key.to_string()).or_default())
    }

    /// Cached value, if one was ever stored.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Return the cached value or run `init`. Concurrent callers for the same
    /// key wait for the running `init` instead of starting their own.
    pub async fn get_or_try_init<E, F, Fut>(&self, key: &str, init: F) -> Result<String, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, E>>,
    {
        let cell = self.cell(key);
        cell.get_or_try_init(init).await.cloned()
    }

    /// Number of keys holding a value.
    #[must_use]
    pub fn len(&self) -> usize {
        let cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
        cells.values().filter(|cell| cell.initialized()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
