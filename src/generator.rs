//! Generation pass: raw records in, ordered and styled tasks out.
//!
//! One pass walks the records in hierarchy pre-order. For every record it
//! classifies the node, aggregates the span of projects, takes the depth,
//! attaches cached predecessors (and dispatches their refresh), resolves the
//! color theme, and emits the task. Records missing a required field are
//! skipped; a record that cannot be turned into a task aborts the pass and
//! nothing from it is returned.

use crate::cache::{DependencyCache, ExpansionStore};
use crate::config::Config;
use crate::error::{ErrorCode, GenerateError, GenerateResult, SkipReason};
use crate::hierarchy::Hierarchy;
use crate::logging::NotificationChannel;
use crate::schedule::{Span, apply_offset, parse_timestamp};
use crate::store::RecordStore;
use crate::theme::{ColorThemeResolver, ThemeCache, ThemeRequest};
use crate::types::{Record, RecordId, StylingBundle, Task, TaskKind};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Where a pass currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Sorting,
    Classify,
    Aggregate,
    Depth,
    AttachDependencies,
    ResolveColor,
    Emit,
    Done,
}

/// Everything a pass produced besides the tasks themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassOutput {
    pub tasks: Vec<Task>,
    /// Records left out for a missing field, in traversal order.
    pub skipped: Vec<(RecordId, SkipReason)>,
    /// Records left out because their parent chain loops.
    pub detached: Vec<RecordId>,
    /// Records dropped for exceeding `records.max_records`.
    pub truncated: usize,
}

/// Drives generation passes over a record store.
///
/// The dependency cache and expansion store are shared handles: the host can
/// keep clones to toggle projects or wait for refreshes between passes.
pub struct TaskGenerator {
    store: Arc<dyn RecordStore>,
    dependencies: DependencyCache,
    expansion: ExpansionStore,
    themes: ColorThemeResolver,
    config: Config,
}

impl TaskGenerator {
    /// Build a generator with fresh caches.
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn NotificationChannel>,
        config: Config,
    ) -> Self {
        let dependencies = DependencyCache::new(store.clone(), notifier.clone());
        Self::with_caches(store, notifier, config, dependencies, ExpansionStore::new())
    }

    /// Build a generator around existing caches.
    pub fn with_caches(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn NotificationChannel>,
        config: Config,
        dependencies: DependencyCache,
        expansion: ExpansionStore,
    ) -> Self {
        let themes = ColorThemeResolver::new(store.clone(), notifier, &config);
        Self {
            store,
            dependencies,
            expansion,
            themes,
            config,
        }
    }

    pub fn dependencies(&self) -> &DependencyCache {
        &self.dependencies
    }

    pub fn expansion(&self) -> &ExpansionStore {
        &self.expansion
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one pass and return only the tasks.
    pub async fn generate(&self) -> GenerateResult<Vec<Task>> {
        self.generate_pass().await.map(|pass| pass.tasks)
    }

    /// Run one pass.
    pub async fn generate_pass(&self) -> GenerateResult<PassOutput> {
        let mut state = PassState::Idle;
        let mut records = self.store.records();

        let max = self.config.records.max_records;
        let truncated = records.len().saturating_sub(max);
        if truncated > 0 {
            warn!(total = records.len(), max, "Record set exceeds limit; truncating");
            records.truncate(max);
        }

        transition(&mut state, PassState::Sorting, None);
        let hierarchy = Hierarchy::build(&records);
        let spans = hierarchy.spans();

        let mut output = PassOutput {
            tasks: Vec::with_capacity(hierarchy.len()),
            skipped: Vec::new(),
            detached: hierarchy.detached_ids().into_iter().map(String::from).collect(),
            truncated,
        };
        let mut theme_cache = ThemeCache::new();

        for &node in hierarchy.preorder() {
            let record = hierarchy.record(node);
            let id = Some(record.id.as_str());

            transition(&mut state, PassState::Classify, id);
            let kind = hierarchy.kind(node);

            let span = match kind {
                TaskKind::Project => {
                    transition(&mut state, PassState::Aggregate, id);
                    spans.get(node)
                }
                TaskKind::Leaf => None,
            };

            transition(&mut state, PassState::Depth, id);
            let level = hierarchy.depth(node).unwrap_or(0);

            transition(&mut state, PassState::AttachDependencies, id);
            let dependencies = self.dependencies.lookup(&record.id);
            self.dependencies.refresh(&record.id);

            let schedule = match required_fields(record, kind, span) {
                Ok(schedule) => schedule,
                Err(reason) => {
                    debug!(record_id = %record.id, code = %reason.code(), "Skipping record: {}", reason);
                    output.skipped.push((record.id.clone(), reason));
                    continue;
                }
            };

            transition(&mut state, PassState::ResolveColor, id);
            let styles = self
                .themes
                .resolve(
                    &mut theme_cache,
                    ThemeRequest {
                        entity_type: &record.entity_type,
                        color_override: record.color_override(),
                        option_code: record.color_option_code(),
                        kind,
                    },
                )
                .await;

            transition(&mut state, PassState::Emit, id);
            let parent = hierarchy
                .parent(node)
                .map(|p| hierarchy.record(p).id.clone());
            let task = self.construct(record, kind, level, schedule, dependencies, styles, parent)?;
            output.tasks.push(task);
        }

        transition(&mut state, PassState::Done, None);
        info!(
            tasks = output.tasks.len(),
            skipped = output.skipped.len(),
            detached = output.detached.len(),
            truncated = output.truncated,
            themes = theme_cache.len(),
            "Generation pass complete"
        );
        Ok(output)
    }

    #[allow(clippy::too_many_arguments)]
    fn construct(
        &self,
        record: &Record,
        kind: TaskKind,
        level: u32,
        schedule: Schedule<'_>,
        dependencies: Vec<RecordId>,
        styles: StylingBundle,
        parent: Option<RecordId>,
    ) -> GenerateResult<Task> {
        let fail = |code: ErrorCode, reason: String| GenerateError::Construction {
            code,
            id: record.id.clone(),
            name: schedule.name.to_string(),
            start: schedule.start_text(),
            end: schedule.end_text(),
            progress: record
                .progress
                .map(|p| p.to_string())
                .unwrap_or_else(|| "none".to_string()),
            reason,
        };

        let (start, end) = match schedule.when {
            When::Span(span) => (span.start, span.end),
            When::Text { start, end } => {
                let start = parse_timestamp(start).ok_or_else(|| {
                    fail(ErrorCode::MalformedTimestamp, format!("invalid start time '{}'", start))
                })?;
                let end = parse_timestamp(end).ok_or_else(|| {
                    fail(ErrorCode::MalformedTimestamp, format!("invalid end time '{}'", end))
                })?;
                (start, end)
            }
        };

        let progress = if self.config.records.progress_enabled {
            let raw = record.progress.unwrap_or(0.0);
            if !raw.is_finite() {
                return Err(fail(ErrorCode::InvalidProgress, format!("progress is not a number: {}", raw)));
            }
            raw.clamp(0.0, 1.0)
        } else {
            0.0
        };

        let offset = self.config.display.time_offset_minutes;
        let shift = |instant: DateTime<Utc>| {
            apply_offset(instant, offset).ok_or_else(|| {
                fail(
                    ErrorCode::MalformedTimestamp,
                    format!("time offset of {} minutes is out of range", offset),
                )
            })
        };
        let (start, end) = (shift(start)?, shift(end)?);

        let hide_children = match kind {
            TaskKind::Project => Some(self.expansion.is_collapsed(&record.id)),
            TaskKind::Leaf => None,
        };

        Ok(Task {
            id: record.id.clone(),
            name: schedule.name.to_string(),
            start,
            end,
            progress,
            kind,
            level,
            dependencies,
            styles,
            parent,
            hide_children,
            is_disabled: self.config.display.readonly,
            entity_type: record.entity_type.clone(),
        })
    }
}

fn transition(state: &mut PassState, next: PassState, record_id: Option<&str>) {
    trace!(from = ?*state, to = ?next, record_id, "Pass state");
    *state = next;
}

/// Where a task's dates come from.
enum When<'a> {
    /// Aggregated from leaf descendants.
    Span(Span),
    /// The record's own text, parsed at construction.
    Text { start: &'a str, end: &'a str },
}

/// Fields a record must have to become a task.
struct Schedule<'a> {
    name: &'a str,
    when: When<'a>,
}

impl Schedule<'_> {
    fn start_text(&self) -> String {
        match self.when {
            When::Span(span) => format_instant(span.start),
            When::Text { start, .. } => start.to_string(),
        }
    }

    fn end_text(&self) -> String {
        match self.when {
            When::Span(span) => format_instant(span.end),
            When::Text { end, .. } => end.to_string(),
        }
    }
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn required_fields(
    record: &Record,
    kind: TaskKind,
    span: Option<Span>,
) -> Result<Schedule<'_>, SkipReason> {
    let name = non_blank(record.name.as_deref()).ok_or(SkipReason::MissingName)?;
    let when = match kind {
        TaskKind::Project => When::Span(span.ok_or(SkipReason::EmptySpan)?),
        TaskKind::Leaf => When::Text {
            start: non_blank(record.start.as_deref()).ok_or(SkipReason::MissingStart)?,
            end: non_blank(record.end.as_deref()).ok_or(SkipReason::MissingEnd)?,
        },
    };
    Ok(Schedule { name, when })
}
