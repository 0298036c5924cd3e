//! Integration tests for generation passes.
//!
//! These drive `TaskGenerator` end to end over in-memory record stores.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gantt_tree::config::Config;
use gantt_tree::error::{ErrorCode, GenerateError, LookupFailure, SkipReason, StoreError};
use gantt_tree::generator::TaskGenerator;
use gantt_tree::logging::Notifier;
use gantt_tree::schedule::parse_timestamp;
use gantt_tree::store::{ColorOption, MemoryRecordStore, RecordStore};
use gantt_tree::theme::{Rgb, palette};
use gantt_tree::types::{Record, RecordId, Task, TaskKind};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc::UnboundedReceiver;

/// Wraps a memory store, failing predecessor lookups for chosen ids and
/// counting metadata fetches.
struct FlakyStore {
    inner: MemoryRecordStore,
    failing: HashSet<String>,
    metadata_fetches: AtomicUsize,
}

impl FlakyStore {
    fn new(inner: MemoryRecordStore) -> Self {
        Self {
            inner,
            failing: HashSet::new(),
            metadata_fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    fn records(&self) -> Vec<Record> {
        self.inner.records()
    }

    async fn fetch_predecessors(&self, id: &str) -> Result<Vec<RecordId>, StoreError> {
        if self.failing.contains(id) {
            return Err(StoreError::Network(format!("lookup for {} timed out", id)));
        }
        self.inner.fetch_predecessors(id).await
    }

    async fn fetch_entity_color(
        &self,
        entity_type: &str,
        option: Option<&ColorOption>,
    ) -> Result<Option<String>, StoreError> {
        self.metadata_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_entity_color(entity_type, option).await
    }
}

fn ts(s: &str) -> DateTime<Utc> {
    parse_timestamp(s).expect("valid timestamp")
}

fn leaf(id: &str, parent: Option<&str>, start: &str, end: &str) -> Record {
    let record = Record::new(id, "task")
        .with_name(format!("Task {}", id))
        .with_schedule(start, end);
    match parent {
        Some(p) => record.with_parent(p),
        None => record,
    }
}

fn example_records() -> Vec<Record> {
    vec![
        leaf("A", None, "2024-01-10", "2024-01-12"),
        leaf("B", Some("A"), "2024-01-01", "2024-01-05"),
        leaf("C", Some("A"), "2024-01-15", "2024-01-20"),
    ]
}

fn setup(store: MemoryRecordStore) -> TaskGenerator {
    setup_with(store, Config::default())
}

fn setup_with(store: MemoryRecordStore, config: Config) -> TaskGenerator {
    TaskGenerator::new(Arc::new(store), Arc::new(Notifier::new()), config)
}

fn setup_flaky(store: FlakyStore) -> (TaskGenerator, Arc<FlakyStore>, UnboundedReceiver<LookupFailure>) {
    setup_flaky_with(store, Config::default())
}

fn setup_flaky_with(
    store: FlakyStore,
    config: Config,
) -> (TaskGenerator, Arc<FlakyStore>, UnboundedReceiver<LookupFailure>) {
    let store = Arc::new(store);
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let generator = TaskGenerator::new(
        store.clone(),
        Arc::new(Notifier::new().with_sender(tx)),
        config,
    );
    (generator, store, rx)
}

fn shade(base: &str, index: usize) -> String {
    palette::generate(Rgb::parse(base).unwrap())[index].to_hex()
}

fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.id.as_str()).collect()
}

#[tokio::test]
async fn project_aggregates_leaf_children() {
    let generator = setup(MemoryRecordStore::new(example_records()));
    let tasks = generator.generate().await.unwrap();

    assert_eq!(ids(&tasks), vec!["A", "B", "C"]);

    let a = &tasks[0];
    assert_eq!(a.kind, TaskKind::Project);
    assert_eq!(a.start, ts("2024-01-01"));
    assert_eq!(a.end, ts("2024-01-20"));
    assert_eq!(a.level, 0);
    assert_eq!(a.hide_children, Some(false));
    assert_eq!(a.parent, None);
    assert_eq!(a.styles.background_color, "#ffa940");

    for child in &tasks[1..] {
        assert_eq!(child.kind, TaskKind::Leaf);
        assert_eq!(child.level, 1);
        assert_eq!(child.parent.as_deref(), Some("A"));
        assert_eq!(child.hide_children, None);
        assert_eq!(child.styles.background_color, "#bae637");
    }
    assert_eq!(tasks[1].start, ts("2024-01-01"));
    assert_eq!(tasks[2].end, ts("2024-01-20"));
}

#[tokio::test]
async fn record_missing_end_is_skipped_not_fatal() {
    let mut records = example_records();
    let mut no_end = Record::new("D", "task").with_name("No end").with_parent("A");
    no_end.start = Some("2024-01-02".to_string());
    records.push(no_end);
    records[2].start = None;
    let generator = setup(MemoryRecordStore::new(records));

    let pass = generator.generate_pass().await.unwrap();
    assert_eq!(ids(&pass.tasks), vec!["A", "B"]);
    assert_eq!(
        pass.skipped,
        vec![
            ("C".to_string(), SkipReason::MissingStart),
            ("D".to_string(), SkipReason::MissingEnd),
        ]
    );
    // The project span ignores the unscheduled leaves.
    assert_eq!(pass.tasks[0].end, ts("2024-01-05"));
}

#[tokio::test]
async fn malformed_date_aborts_whole_pass() {
    let mut records = example_records();
    records.push(leaf("Z", None, "2024-02-01", "31/02/2024"));
    let generator = setup(MemoryRecordStore::new(records));

    let err = generator.generate().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::MalformedTimestamp);
    assert_eq!(err.record_id(), "Z");
    let GenerateError::Construction { name, start, end, .. } = &err;
    assert_eq!(name, "Task Z");
    assert_eq!(start, "2024-02-01");
    assert_eq!(end, "31/02/2024");
    assert!(err.to_string().contains("Record id: Z"));
}

#[tokio::test]
async fn non_numeric_progress_aborts_pass() {
    let records = vec![leaf("A", None, "2024-01-01", "2024-01-02").with_progress(f64::NAN)];
    let generator = setup(MemoryRecordStore::new(records));

    let err = generator.generate().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidProgress);
}

#[tokio::test]
async fn progress_is_clamped_or_disabled() {
    let records = vec![
        leaf("A", None, "2024-01-01", "2024-01-02").with_progress(1.7),
        leaf("B", None, "2024-01-01", "2024-01-02").with_progress(0.25),
    ];

    let tasks = setup(MemoryRecordStore::new(records.clone()))
        .generate()
        .await
        .unwrap();
    assert_eq!(tasks[0].progress, 1.0);
    assert_eq!(tasks[1].progress, 0.25);

    let mut config = Config::default();
    config.records.progress_enabled = false;
    let tasks = setup_with(MemoryRecordStore::new(records), config)
        .generate()
        .await
        .unwrap();
    assert!(tasks.iter().all(|t| t.progress == 0.0));
}

#[tokio::test]
async fn dependencies_lag_one_pass() {
    let mut store = MemoryRecordStore::new(example_records());
    store.add_predecessor("C", "B");
    let generator = setup(store);

    let first = generator.generate().await.unwrap();
    assert!(first.iter().all(|t| t.dependencies.is_empty()));

    generator.dependencies().settle().await;

    let second = generator.generate().await.unwrap();
    let c = second.iter().find(|t| t.id == "C").unwrap();
    assert_eq!(c.dependencies, vec!["B"]);
}

#[tokio::test]
async fn dependency_failure_is_reported_and_pass_continues() {
    let mut inner = MemoryRecordStore::new(example_records());
    inner.add_predecessor("C", "B");
    inner.set_entity_color("task", "#2975B2");
    let mut flaky = FlakyStore::new(inner);
    flaky.failing.insert("C".to_string());
    let (generator, _store, mut failures) = setup_flaky(flaky);

    let tasks = generator.generate().await.unwrap();
    assert_eq!(tasks.len(), 3);
    generator.dependencies().settle().await;

    let tasks = generator.generate().await.unwrap();
    assert!(tasks[2].dependencies.is_empty());

    let failure = failures.try_recv().unwrap();
    assert_eq!(failure.code, ErrorCode::DependencyLookupFailed);
    assert_eq!(failure.subject, "C");
}

#[tokio::test]
async fn collapse_state_survives_passes() {
    let generator = setup(MemoryRecordStore::new(example_records()));

    let first = generator.generate().await.unwrap();
    assert_eq!(first[0].hide_children, Some(false));
    assert!(generator.expansion().contains("A"));
    assert!(!generator.expansion().contains("B"));

    let ui = generator.expansion().clone();
    ui.set_collapsed("A", true);

    let second = generator.generate().await.unwrap();
    assert_eq!(second[0].hide_children, Some(true));
}

#[tokio::test]
async fn empty_projects_are_dropped() {
    let records = vec![
        Record::new("P", "task").with_name("Empty project"),
        Record::new("Q", "task").with_name("Empty child").with_parent("P"),
        Record::new("R", "task").with_name("Unscheduled").with_parent("Q"),
        leaf("S", None, "2024-03-01", "2024-03-02"),
    ];
    let generator = setup(MemoryRecordStore::new(records));

    let pass = generator.generate_pass().await.unwrap();
    assert_eq!(ids(&pass.tasks), vec!["S"]);
    assert_eq!(pass.skipped[0], ("P".to_string(), SkipReason::EmptySpan));
    assert_eq!(pass.skipped[1], ("Q".to_string(), SkipReason::EmptySpan));
}

#[tokio::test]
async fn cyclic_records_are_left_out() {
    let mut records = example_records();
    records.push(leaf("X", Some("Y"), "2024-01-01", "2024-01-02"));
    records.push(leaf("Y", Some("X"), "2024-01-01", "2024-01-02"));
    let generator = setup(MemoryRecordStore::new(records));

    let pass = generator.generate_pass().await.unwrap();
    assert_eq!(ids(&pass.tasks), vec!["A", "B", "C"]);
    assert_eq!(pass.detached, vec!["X", "Y"]);
}

#[tokio::test]
async fn color_override_wins_over_metadata() {
    let mut store = MemoryRecordStore::new(vec![
        leaf("A", None, "2024-01-01", "2024-01-02")
            .with_color("#ff0000")
            .with_color_option("blue"),
        leaf("B", None, "2024-01-01", "2024-01-02").with_color_option("blue"),
        leaf("C", None, "2024-01-01", "2024-01-02"),
    ]);
    store.set_entity_color("task", "#2975B2");
    store.set_option_color("task", "status", "blue", "#1890ff");
    let mut config = Config::default();
    config.records.color_option_field = Some("status".to_string());

    let tasks = setup_with(store, config).generate().await.unwrap();

    assert_eq!(tasks[0].styles.background_selected_color, shade("#ff0000", 3));
    assert_eq!(tasks[1].styles.background_selected_color, "#69c0ff");
    assert_eq!(tasks[2].styles.background_selected_color, "#70a9cc");
    assert_eq!(tasks[0].styles.progress_selected_color, "#ff0000");
}

#[tokio::test]
async fn entity_metadata_fetched_once_per_pass() {
    let mut inner = MemoryRecordStore::new(example_records());
    inner.set_entity_color("task", "#2975B2");
    let (generator, store, _failures) = setup_flaky(FlakyStore::new(inner));

    generator.generate().await.unwrap();
    assert_eq!(store.metadata_fetches.load(Ordering::SeqCst), 1);

    // Theme cache does not persist across passes.
    generator.generate().await.unwrap();
    assert_eq!(store.metadata_fetches.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn missing_metadata_falls_back_to_default_color() {
    let (generator, _store, mut failures) =
        setup_flaky(FlakyStore::new(MemoryRecordStore::new(example_records())));

    let tasks = generator.generate().await.unwrap();
    assert_eq!(tasks[1].styles.progress_selected_color, "#2975b2");

    let failure = failures.try_recv().unwrap();
    assert_eq!(failure.code, ErrorCode::MetadataLookupFailed);
    assert_eq!(failure.subject, "task");
}

#[tokio::test]
async fn display_config_applies_offset_and_readonly() {
    let mut config = Config::default();
    config.display.time_offset_minutes = 60;
    config.display.readonly = true;
    let tasks = setup_with(MemoryRecordStore::new(example_records()), config)
        .generate()
        .await
        .unwrap();

    assert_eq!(tasks[1].start, ts("2024-01-01T01:00:00Z"));
    assert_eq!(tasks[0].end, ts("2024-01-20T01:00:00Z"));
    assert!(tasks.iter().all(|t| t.is_disabled));
    assert_eq!(tasks[1].indent(10), 10);
}

#[tokio::test]
async fn unmatched_option_uses_default_after_one_fetch() {
    let mut inner = MemoryRecordStore::new(vec![
        leaf("A", None, "2024-01-01", "2024-01-02").with_color_option("nomatch"),
    ]);
    inner.set_entity_color("task", "#1890ff");
    inner.set_option_color("task", "status", "blue", "#1890ff");
    let mut config = Config::default();
    config.records.color_option_field = Some("status".to_string());
    let (generator, store, _failures) = setup_flaky_with(FlakyStore::new(inner), config);

    let tasks = generator.generate().await.unwrap();
    assert_eq!(store.metadata_fetches.load(Ordering::SeqCst), 1);
    assert_eq!(tasks[0].styles.progress_selected_color, "#2975b2");
}

#[tokio::test]
async fn overflowing_time_offset_fails_the_pass() {
    let mut config = Config::default();
    config.display.time_offset_minutes = 1_000_000_000_000;
    let generator = setup_with(MemoryRecordStore::new(example_records()), config);

    let err = generator.generate().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::MalformedTimestamp);
    assert_eq!(err.record_id(), "A");
    assert!(err.to_string().contains("out of range"));
}

#[tokio::test]
async fn record_limit_truncates_input() {
    let mut config = Config::default();
    config.records.max_records = 2;
    let generator = setup_with(MemoryRecordStore::new(example_records()), config);

    let pass = generator.generate_pass().await.unwrap();
    assert_eq!(pass.truncated, 1);
    assert_eq!(ids(&pass.tasks), vec!["A", "B"]);
    assert_eq!(pass.tasks[0].end, ts("2024-01-05"));
}

#[tokio::test]
async fn deep_hierarchy_levels_and_order() {
    let records = vec![
        leaf("g", Some("c"), "2024-04-10", "2024-04-12"),
        leaf("c", Some("a"), "2024-01-01", "2024-01-02"),
        leaf("b", Some("a"), "2024-02-01", "2024-02-03"),
        leaf("a", None, "2024-01-01", "2024-01-02"),
        leaf("h", Some("c"), "2024-04-01", "2024-04-02"),
        leaf("r", None, "2024-05-01", "2024-05-02"),
    ];
    let tasks = setup(MemoryRecordStore::new(records)).generate().await.unwrap();

    assert_eq!(ids(&tasks), vec!["a", "c", "g", "h", "b", "r"]);
    let levels: Vec<u32> = tasks.iter().map(|t| t.level).collect();
    assert_eq!(levels, vec![0, 1, 2, 2, 1, 0]);

    let a = &tasks[0];
    assert_eq!(a.start, ts("2024-02-01"));
    assert_eq!(a.end, ts("2024-04-12"));
    let c = &tasks[1];
    assert_eq!(c.kind, TaskKind::Project);
    assert_eq!(c.start, ts("2024-04-01"));
}
