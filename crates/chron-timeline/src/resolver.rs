//! Field label and record reference resolution.
//!
//! Two independent paths, both cache-backed and infallible towards the caller:
//!
//! - **Field labels**: logical attribute name → display label, one batched
//!   metadata call per page for the names not cached yet. On failure every
//!   requested name becomes its own label.
//! - **Reference display**: `entity,guid` value → the record's primary name.
//!   Anything that does not decode as a reference passes through unchanged.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chron_core::{EntityRef, MetadataSource, ParsedChange, RecordSource, ToText, parse_entity_ref};
use futures_util::future::join_all;

use crate::cache::{LabelCache, OnceMap};

/// A lookup that produced nothing worth caching.
struct Unresolved;

/// Label and reference resolver with per-controller caches.
#[derive(Debug, Default)]
pub struct LabelResolver {
    labels: Mutex<LabelCache>,
    primary_names: OnceMap,
    record_names: OnceMap,
    cache_failed_lookups: bool,
}

impl LabelResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache the raw value when a record name lookup fails or is empty, so the
    /// lookup is not repeated for the rest of the session.
    #[must_use]
    pub fn with_cache_failed_lookups(mut self, enabled: bool) -> Self {
        self.cache_failed_lookups = enabled;
        self
    }

    fn labels(&self) -> MutexGuard<'_, LabelCache> {
        self.labels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Labels of `names` for `entity_type`, fetching the uncached ones.
    ///
    /// Switching entity type drops all cached labels first. Cached names and
    /// the unknown-field sentinel are skipped; the rest go out in one batch.
    /// The returned map belongs to the caller and holds every requested name,
    /// falling back to the logical name. Fetched labels are only stored when
    /// the cache is still scoped to `entity_type` once the call returns.
    pub async fn ensure_labels<M: MetadataSource>(
        &self,
        source: &M,
        entity_type: &str,
        names: &[String],
    ) -> HashMap<String, String> {
        let (mut page_labels, missing) = {
            let mut labels = self.labels();
            if labels.scope_to(entity_type) {
                tracing::debug!(entity_type, "entity type changed, label cache cleared");
            }
            (labels.known(names), labels.missing(names))
        };
        if missing.is_empty() {
            return page_labels;
        }

        let fetched = source.attribute_labels(entity_type, &missing).await;

        let mut labels = self.labels();
        let in_scope = labels.entity_type() == Some(entity_type);
        if !in_scope {
            tracing::debug!(entity_type, "entity type changed during label fetch, not caching result");
        }
        match fetched {
            Ok(mut map) => {
                tracing::debug!(entity_type, requested = missing.len(), resolved = map.len(), "attribute labels resolved");
                for name in missing {
                    match map.remove(&name) {
                        Some(label) => {
                            if in_scope {
                                labels.insert(name.clone(), label.clone());
                            }
                            page_labels.insert(name, label);
                        }
                        None => {
                            page_labels.insert(name.clone(), name);
                        }
                    }
                }
            }
            Err(error) => {
                tracing::warn!(entity_type, %error, "attribute label lookup failed, using logical names");
                for name in missing {
                    if in_scope {
                        labels.insert(name.clone(), name.clone());
                    }
                    page_labels.insert(name.clone(), name);
                }
            }
        }
        page_labels
    }

    /// Cached display label for `name` under `entity_type`, or the name itself
    /// when none is cached or the cache holds another entity type.
    #[must_use]
    pub fn label_for(&self, entity_type: &str, name: &str) -> String {
        let labels = self.labels();
        if labels.entity_type() != Some(entity_type) {
            return name.to_string();
        }
        labels
            .get(name)
            .map_or_else(|| name.to_string(), ToString::to_string)
    }

    /// Resolve a value to display text: the referenced record's name when the
    /// value is an `entity,guid` reference, else the value itself.
    pub async fn resolve_reference<S>(&self, source: &S, value: &str) -> String
    where
        S: MetadataSource + RecordSource,
    {
        match parse_entity_ref(value) {
            Some(reference) => self.resolve_entity_ref(source, &reference, value).await,
            None => value.to_string(),
        }
    }

    /// Resolve every reference-shaped old/new value in `changes` concurrently
    /// and rewrite it in place, keeping the decoded reference on the change.
    ///
    /// All lookups are awaited together; each one degrades to the raw value on
    /// its own, so one failure never affects its siblings. Returns the number
    /// of values that were references.
    pub async fn resolve_batch<'a, S, I>(&self, source: &S, changes: I) -> usize
    where
        S: MetadataSource + RecordSource,
        I: IntoIterator<Item = &'a mut ParsedChange>,
    {
        let mut lookups = Vec::new();
        for change in changes {
            let ParsedChange {
                old_value,
                new_value,
                old_ref,
                new_ref,
                ..
            } = change;

            if let Some(reference) = parse_entity_ref(old_value) {
                *old_ref = Some(reference.clone());
                lookups.push(self.resolve_into(source, reference, old_value));
            }
            if let Some(reference) = parse_entity_ref(new_value) {
                *new_ref = Some(reference.clone());
                lookups.push(self.resolve_into(source, reference, new_value));
            }
        }

        let count = lookups.len();
        join_all(lookups).await;
        count
    }

    async fn resolve_into<S>(&self, source: &S, reference: EntityRef, slot: &mut String)
    where
        S: MetadataSource + RecordSource,
    {
        let resolved = self.resolve_entity_ref(source, &reference, slot.as_str()).await;
        *slot = resolved;
    }

    async fn resolve_entity_ref<S>(&self, source: &S, reference: &EntityRef, raw: &str) -> String
    where
        S: MetadataSource + RecordSource,
    {
        let key = reference.cache_key();
        if let Some(name) = self.record_names.get(&key) {
            return name;
        }

        let Some(primary) = self.primary_name_attribute(source, &reference.entity).await else {
            return raw.to_string();
        };

        let resolved = self
            .record_names
            .get_or_try_init(&key, move || async move {
                match source
                    .retrieve_field(&reference.entity, &reference.id, &primary)
                    .await
                {
                    Ok(value) => {
                        let name = value.to_text();
                        if !name.is_empty() {
                            return Ok(name);
                        }
                        tracing::debug!(entity = %reference.entity, id = %reference.id, "record has no display name");
                    }
                    Err(error) => {
                        tracing::warn!(entity = %reference.entity, id = %reference.id, %error, "record name lookup failed");
                    }
                }
                if self.cache_failed_lookups {
                    Ok(raw.to_string())
                } else {
                    Err(Unresolved)
                }
            })
            .await;

        resolved.unwrap_or_else(|Unresolved| raw.to_string())
    }

    /// Primary display attribute of `entity`, fetched at most once per type.
    async fn primary_name_attribute<M: MetadataSource>(
        &self,
        source: &M,
        entity: &str,
    ) -> Option<String> {
        self.primary_names
            .get_or_try_init(entity, move || async move {
                match source.primary_name_attribute(entity).await {
                    Ok(Some(primary)) => Ok(primary),
                    Ok(None) => {
                        tracing::debug!(entity, "entity has no primary name attribute");
                        Err(Unresolved)
                    }
                    Err(error) => {
                        tracing::warn!(entity, %error, "primary name attribute lookup failed");
                        Err(Unresolved)
                    }
                }
            })
            .await
            .ok()
    }

    /// Number of cached record display names.
    #[must_use]
    pub fn cached_record_names(&self) -> usize {
        self.record_names.len()
    }
}
