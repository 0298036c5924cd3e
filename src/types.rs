//! Core types for records, tasks, and styling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque record identifier.
pub type RecordId = String;

/// A raw record as held by the record store.
///
/// Records arrive in arbitrary order; `parent` may point at a record outside
/// the current set, in which case the record is treated as a root.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(default)]
    pub parent: Option<RecordId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    /// Explicit color text, e.g. `#ff8800`. Wins over every metadata lookup.
    #[serde(default)]
    pub color: Option<String>,
    /// Option-set code used to pick a color from entity metadata.
    #[serde(default)]
    pub color_option: Option<String>,
    pub entity_type: String,
}

impl Record {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            ..Default::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_schedule(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self.end = Some(end.into());
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_color_option(mut self, code: impl Into<String>) -> Self {
        self.color_option = Some(code.into());
        self
    }

    /// Non-blank explicit color text.
    pub fn color_override(&self) -> Option<&str> {
        non_blank(self.color.as_deref())
    }

    /// Non-blank option code.
    pub fn color_option_code(&self) -> Option<&str> {
        non_blank(self.color_option.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Whether a task is a leaf or a project synthesized from its descendants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// No children in the current record set. Rendered as a plain task bar.
    #[serde(rename = "task")]
    Leaf,
    Project,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Leaf => "task",
            TaskKind::Project => "project",
        }
    }
}

/// The four colors that drive a task bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StylingBundle {
    pub background_color: String,
    pub background_selected_color: String,
    pub progress_color: String,
    pub progress_selected_color: String,
}

/// A task ready for a Gantt renderer.
///
/// Built fresh on every generation pass from the record it mirrors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RecordId,
    pub name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub progress: f64,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    /// Hierarchy depth; roots are 0.
    pub level: u32,
    /// Predecessor ids as of the previous completed lookup.
    pub dependencies: Vec<RecordId>,
    pub styles: StylingBundle,
    /// Parent task id, present only when the parent is part of the same pass.
    #[serde(rename = "project", skip_serializing_if = "Option::is_none")]
    pub parent: Option<RecordId>,
    /// Collapsed state; always set on projects, never on leaves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_children: Option<bool>,
    pub is_disabled: bool,
    pub entity_type: String,
}

impl Task {
    /// Horizontal indentation for a renderer that shifts each level by `step`.
    pub fn indent(&self, step: u32) -> u32 {
        self.level * step
    }
}
