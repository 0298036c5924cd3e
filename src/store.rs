//! Record store abstraction and an in-memory implementation.
//!
//! The generator never talks to a data source directly; it goes through
//! [`RecordStore`]. Hosts plug in their own store (a web API, a database),
//! while [`MemoryRecordStore`] serves files and tests.

use crate::error::StoreError;
use crate::types::{Record, RecordId};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Metadata key plus a record's option code, used to pick an option color.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorOption {
    /// Metadata field holding the option set.
    pub key: String,
    /// The record's selected option code.
    pub value: String,
}

impl ColorOption {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Source of records, predecessor links, and entity color metadata.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Current records in host order.
    fn records(&self) -> Vec<Record>;

    /// Parent id of a record, if it has one.
    fn parent_of(&self, id: &str) -> Option<RecordId> {
        self.records()
            .into_iter()
            .find(|r| r.id == id)
            .and_then(|r| r.parent)
    }

    /// Predecessor ids of `id`, in store order.
    async fn fetch_predecessors(&self, id: &str) -> Result<Vec<RecordId>, StoreError>;

    /// Color for an entity type, or for one of its option values when
    /// `option` is given. `Ok(None)` means the metadata carries no color.
    async fn fetch_entity_color(
        &self,
        entity_type: &str,
        option: Option<&ColorOption>,
    ) -> Result<Option<String>, StoreError>;
}

/// Predecessor link as stored in a record file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyLink {
    pub successor: RecordId,
    pub predecessor: RecordId,
}

/// Color metadata for one entity type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityMetadata {
    #[serde(default)]
    pub color: Option<String>,
    /// Option key -> option code -> color.
    #[serde(default)]
    pub options: HashMap<String, HashMap<String, String>>,
}

/// On-disk layout for [`MemoryRecordStore`] (YAML or JSON).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordFile {
    #[serde(default)]
    pub records: Vec<Record>,
    #[serde(default)]
    pub dependencies: Vec<DependencyLink>,
    #[serde(default)]
    pub entities: HashMap<String, EntityMetadata>,
}

impl RecordFile {
    /// Load from `.json`, otherwise YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading records file {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let file = if is_json {
            serde_json::from_str(&content)
                .with_context(|| format!("parsing JSON records file {}", path.display()))?
        } else {
            serde_yaml::from_str(&content)
                .with_context(|| format!("parsing YAML records file {}", path.display()))?
        };
        Ok(file)
    }
}

/// In-memory record store.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Vec<Record>,
    predecessors: HashMap<RecordId, Vec<RecordId>>,
    entities: HashMap<String, EntityMetadata>,
}

impl MemoryRecordStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    pub fn from_file(file: RecordFile) -> Self {
        let mut store = Self::new(file.records);
        for link in file.dependencies {
            store.add_predecessor(&link.successor, &link.predecessor);
        }
        store.entities = file.entities;
        store
    }

    pub fn add_predecessor(&mut self, successor: &str, predecessor: &str) {
        self.predecessors
            .entry(successor.to_string())
            .or_default()
            .push(predecessor.to_string());
    }

    pub fn set_entity_color(&mut self, entity_type: &str, color: &str) {
        self.entities.entry(entity_type.to_string()).or_default().color = Some(color.to_string());
    }

    pub fn set_option_color(&mut self, entity_type: &str, key: &str, value: &str, color: &str) {
        self.entities
            .entry(entity_type.to_string())
            .or_default()
            .options
            .entry(key.to_string())
            .or_default()
            .insert(value.to_string(), color.to_string());
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn records(&self) -> Vec<Record> {
        self.records.clone()
    }

    fn parent_of(&self, id: &str) -> Option<RecordId> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| r.parent.clone())
    }

    async fn fetch_predecessors(&self, id: &str) -> Result<Vec<RecordId>, StoreError> {
        Ok(self.predecessors.get(id).cloned().unwrap_or_default())
    }

    async fn fetch_entity_color(
        &self,
        entity_type: &str,
        option: Option<&ColorOption>,
    ) -> Result<Option<String>, StoreError> {
        let meta = self.entities.get(entity_type).ok_or_else(|| {
            StoreError::Metadata(format!("no metadata for entity type '{}'", entity_type))
        })?;
        Ok(match option {
            Some(opt) => meta
                .options
                .get(&opt.key)
                .and_then(|values| values.get(&opt.value))
                .cloned(),
            None => meta.color.clone(),
        })
    }
}
