//! Pagination controller.
//!
//! Owns the accumulated rows, the continuation cursor and the load state of
//! one timeline. Every page goes through the same pipeline:
//!
//! ```text
//! retrieve → parse payloads → field labels → reference names → group → merge
//! ```
//!
//! At most one page fetch is in flight. Each refresh bumps a generation
//! counter; a page completing under an older generation is dropped.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chron_config::TimelineConfig;
use chron_core::{AuditRow, AuditSource, EntityRef, MetadataSource, RecordSource, sanitize_guid};
use serde::Serialize;

use crate::grouping::{ParsedEntry, distinct_field_names, group_page, merge_rows};
use crate::navigation::{LogNavigator, Navigator};
use crate::query::{AUDIT_ENTITY, AuditQuery, continuation_query};
use crate::resolver::LabelResolver;

/// Error shown when the host supplies no record id.
pub const NO_RECORD_MESSAGE: &str = "No record ID detected. Bind the control \"Value\" to a text field containing the entity ID to retrieve the record ID";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// What the host knows about the record being shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordContext {
    /// Value of the bound text field, if any.
    pub bound_value: Option<String>,
    /// Id of the record the control is hosted on.
    pub context_entity_id: Option<String>,
    /// Logical name of the hosting entity.
    pub entity_type: Option<String>,
}

impl RecordContext {
    /// Record id to load: the bound value wins over the ambient context id.
    #[must_use]
    pub fn record_id(&self) -> Option<String> {
        [&self.bound_value, &self.context_entity_id]
            .into_iter()
            .flatten()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| sanitize_guid(raw))
            .find(|id| !id.is_empty())
    }

    #[must_use]
    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Everything a presentation layer needs for one render pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineSnapshot {
    pub rows: Vec<AuditRow>,
    pub state: LoadState,
    pub is_loading: bool,
    pub error: Option<String>,
    pub height: u32,
    pub has_next_page: bool,
    pub enable_sort: bool,
    pub enable_column_sizing: bool,
}

#[derive(Debug, Default)]
struct ControllerState {
    state: LoadState,
    rows: Vec<AuditRow>,
    next_link: Option<String>,
    error: Option<String>,
    loaded_id: Option<String>,
    entity_type: Option<String>,
    generation: u64,
}

type RenderHook = Box<dyn Fn() + Send + Sync>;

/// One timeline instance. Caches live as long as the controller.
pub struct TimelineController<S> {
    source: S,
    config: TimelineConfig,
    resolver: LabelResolver,
    state: Mutex<ControllerState>,
    on_render: Option<RenderHook>,
    navigator: Box<dyn Navigator>,
}

impl<S> TimelineController<S>
where
    S: AuditSource + RecordSource + MetadataSource + Sync,
{
    #[must_use]
    pub fn new(source: S, config: TimelineConfig) -> Self {
        let resolver = LabelResolver::new().with_cache_failed_lookups(config.cache_failed_lookups);
        Self {
            source,
            config,
            resolver,
            state: Mutex::new(ControllerState::default()),
            on_render: None,
            navigator: Box::new(LogNavigator),
        }
    }

    /// Called whenever visible state changes (loading started, page applied,
    /// error set).
    #[must_use]
    pub fn with_render_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_render = Some(Box::new(hook));
        self
    }

    #[must_use]
    pub fn with_navigator(mut self, navigator: impl Navigator + 'static) -> Self {
        self.navigator = Box::new(navigator);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn resolver(&self) -> &LabelResolver {
        &self.resolver
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn render(&self) {
        if let Some(hook) = &self.on_render {
            hook();
        }
    }

    /// Drop all rows and load the first page for `record_id`.
    pub async fn refresh(&self, record_id: &str, entity_type: Option<&str>) {
        let (generation, query) = self.begin_refresh(record_id, entity_type);
        self.render();
        self.load_page(generation, query).await;
    }

    /// Reset state to `Loading` for a new first page. Returns the generation
    /// and query of that page.
    fn begin_refresh(&self, record_id: &str, entity_type: Option<&str>) -> (u64, String) {
        let mut state = self.state();
        state.generation += 1;
        state.state = LoadState::Loading;
        state.rows.clear();
        state.next_link = None;
        state.error = None;
        state.loaded_id = Some(record_id.to_string());
        state.entity_type = entity_type.map(ToString::to_string);

        let query = AuditQuery {
            record_id: record_id.to_string(),
            page_size: self.config.page_size,
            include_change_data: self.config.include_change_data,
        };
        tracing::info!(record_id, generation = state.generation, "loading audit history");
        (state.generation, query.to_query_string())
    }

    /// Fetch the next page through the host cursor.
    ///
    /// Returns `false` without any call when there is no cursor or a fetch is
    /// already in flight.
    pub async fn load_more(&self) -> bool {
        let (generation, query) = {
            let mut state = self.state();
            if state.state == LoadState::Loading {
                tracing::debug!("page fetch in flight, load more ignored");
                return false;
            }
            let Some(link) = state.next_link.as_deref() else {
                return false;
            };
            let query = continuation_query(link);
            state.state = LoadState::Loading;
            state.error = None;
            (state.generation, query)
        };
        self.render();
        self.load_page(generation, query).await;
        true
    }

    /// Render pass: (re)load when the requested record differs from the
    /// loaded one, then snapshot.
    ///
    /// Waits for the first page, so the returned snapshot is never `Loading`
    /// after a record switch; use [`Self::start_view`] or the render hook to
    /// show the loading state. Without a record id this yields the fixed
    /// "No record ID detected" error snapshot and issues no call.
    pub async fn update_view(&self, context: &RecordContext) -> TimelineSnapshot {
        match self.start_view(context) {
            (_, Some(load)) => {
                load.await;
                self.snapshot()
            }
            (snapshot, None) => snapshot,
        }
    }

    /// Non-waiting render pass. On a record switch the state moves to
    /// `Loading` right away and the returned future drives the first page;
    /// the snapshot reflects that loading state.
    pub fn start_view(
        &self,
        context: &RecordContext,
    ) -> (TimelineSnapshot, Option<impl Future<Output = ()> + '_>) {
        let Some(record_id) = context.record_id() else {
            return (self.no_record_snapshot(), None);
        };

        let changed = self.state().loaded_id.as_deref() != Some(record_id.as_str());
        if !changed {
            return (self.snapshot(), None);
        }
        let (generation, query) = self.begin_refresh(&record_id, context.entity_type());
        self.render();
        (self.snapshot(), Some(self.load_page(generation, query)))
    }

    #[must_use]
    pub fn snapshot(&self) -> TimelineSnapshot {
        let state = self.state();
        TimelineSnapshot {
            rows: state.rows.clone(),
            state: state.state,
            is_loading: state.state == LoadState::Loading,
            error: state.error.clone(),
            height: self.config.height,
            has_next_page: self.config.show_load_more && state.next_link.is_some(),
            enable_sort: self.config.enable_sort,
            enable_column_sizing: self.config.enable_column_sizing,
        }
    }

    fn no_record_snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            rows: Vec::new(),
            state: LoadState::Error,
            is_loading: false,
            error: Some(NO_RECORD_MESSAGE.to_string()),
            height: self.config.height,
            has_next_page: false,
            enable_sort: self.config.enable_sort,
            enable_column_sizing: self.config.enable_column_sizing,
        }
    }

    /// Whether the host reported another page, regardless of `show_load_more`.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.state().next_link.is_some()
    }

    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.state().state
    }

    pub fn open_reference(&self, reference: &EntityRef) {
        self.navigator.open_record(&reference.entity, &reference.id);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.state().generation == generation
    }

    async fn load_page(&self, generation: u64, query: String) {
        let entity_type = self.state().entity_type.clone();
        let result = self.fetch_page(generation, entity_type.as_deref(), &query).await;

        {
            let mut state = self.state();
            if state.generation != generation {
                tracing::debug!(generation, current = state.generation, "discarding stale page");
                return;
            }
            match result {
                Ok(Some((rows, next_link))) => {
                    tracing::info!(rows = rows.len(), has_more = next_link.is_some(), "audit page applied");
                    merge_rows(&mut state.rows, rows);
                    state.next_link = next_link;
                    state.state = LoadState::Loaded;
                }
                Ok(None) => return,
                Err(message) => {
                    tracing::warn!(error = %message, "audit page failed");
                    state.error = Some(message);
                    state.state = LoadState::Error;
                }
            }
        }
        self.render();
    }

    /// Retrieve and normalize one page. Nothing is committed here.
    ///
    /// Yields `Ok(None)` when the page went stale before label resolution;
    /// such a page never touches the resolver caches.
    async fn fetch_page(
        &self,
        generation: u64,
        entity_type: Option<&str>,
        query: &str,
    ) -> Result<Option<(Vec<AuditRow>, Option<String>)>, String> {
        let page = self
            .source
            .retrieve_multiple(AUDIT_ENTITY, query)
            .await
            .map_err(|error| error.to_string())?;

        if !self.is_current(generation) {
            tracing::debug!(generation, "page went stale before label resolution");
            return Ok(None);
        }

        let include_change_data = self.config.include_change_data;
        let mut entries: Vec<ParsedEntry> = page
            .records
            .into_iter()
            .map(|record| ParsedEntry::from_record(record, include_change_data))
            .collect();

        let labels = match entity_type {
            Some(entity_type) => {
                let names = distinct_field_names(&entries);
                self.resolver.ensure_labels(&self.source, entity_type, &names).await
            }
            None => HashMap::new(),
        };

        let references = self
            .resolver
            .resolve_batch(&self.source, entries.iter_mut().flat_map(|e| e.changes.iter_mut()))
            .await;
        tracing::debug!(records = entries.len(), references, "page normalized");

        let rows = group_page(entries, |name| {
            labels
                .get(name)
                .cloned()
                .unwrap_or_else(|| name.to_string())
        });
        Ok(Some((rows, page.next_link)))
    }
}
