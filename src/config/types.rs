//! Configuration types.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Fallback base color when neither the record nor metadata supplies one.
pub const DEFAULT_ENTITY_COLOR: &str = "#2975B2";

/// Background forced onto project bars.
pub const DEFAULT_PROJECT_BACKGROUND: &str = "#ffa940";

/// Background forced onto leaf task bars.
pub const DEFAULT_TASK_BACKGROUND: &str = "#bae637";

/// Largest record set the host is expected to hand over in one pass.
pub const DEFAULT_MAX_RECORDS: usize = 5000;

/// Largest accepted `display.time_offset_minutes`, either sign (14 days).
pub const MAX_TIME_OFFSET_MINUTES: i64 = 14 * 24 * 60;

/// Explicit colors that replace the palette-derived ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomColors {
    #[serde(default)]
    pub background: Option<String>,
    #[serde(default)]
    pub background_selected: Option<String>,
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub progress_selected: Option<String>,
}

/// Color theme configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorsConfig {
    /// Base color used when metadata has none or cannot be fetched.
    #[serde(default = "default_entity_color")]
    pub default_entity: String,

    /// Background of project bars, applied after the palette.
    #[serde(default = "default_project_background")]
    pub project_background: String,

    /// Background of leaf bars, applied after the palette.
    #[serde(default = "default_task_background")]
    pub task_background: String,

    #[serde(default)]
    pub custom: CustomColors,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            default_entity: default_entity_color(),
            project_background: default_project_background(),
            task_background: default_task_background(),
            custom: CustomColors::default(),
        }
    }
}

fn default_entity_color() -> String {
    DEFAULT_ENTITY_COLOR.to_string()
}

fn default_project_background() -> String {
    DEFAULT_PROJECT_BACKGROUND.to_string()
}

fn default_task_background() -> String {
    DEFAULT_TASK_BACKGROUND.to_string()
}

/// How records are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordsConfig {
    /// Records beyond this count are dropped before the pass (default: 5000).
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Metadata option key matched against each record's option code.
    #[serde(default)]
    pub color_option_field: Option<String>,

    /// When false every task reports zero progress.
    #[serde(default = "default_true")]
    pub progress_enabled: bool,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
            color_option_field: None,
            progress_enabled: true,
        }
    }
}

fn default_max_records() -> usize {
    DEFAULT_MAX_RECORDS
}

fn default_true() -> bool {
    true
}

/// Display adjustments applied to every task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Minutes added to every emitted start and end (user time zone shift).
    #[serde(default)]
    pub time_offset_minutes: i64,

    /// Mark every task disabled for editing.
    #[serde(default)]
    pub readonly: bool,

    /// Pixels of indentation per hierarchy level.
    #[serde(default = "default_indent_step")]
    pub indent_step: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_offset_minutes: 0,
            readonly: false,
            indent_step: default_indent_step(),
        }
    }
}

fn default_indent_step() -> u32 {
    10
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub colors: ColorsConfig,

    #[serde(default)]
    pub records: RecordsConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Reject values no pass could work with.
    pub fn validate(&self) -> Result<()> {
        if self.records.max_records == 0 {
            return Err(anyhow!("records.max_records must be greater than zero"));
        }
        let offset = self.display.time_offset_minutes;
        if !(-MAX_TIME_OFFSET_MINUTES..=MAX_TIME_OFFSET_MINUTES).contains(&offset) {
            return Err(anyhow!(
                "display.time_offset_minutes must be within ±{} (got {})",
                MAX_TIME_OFFSET_MINUTES,
                offset
            ));
        }
        for (field, value) in [
            ("colors.default_entity", &self.colors.default_entity),
            ("colors.project_background", &self.colors.project_background),
            ("colors.task_background", &self.colors.task_background),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow!("{} must not be empty", field));
            }
        }
        Ok(())
    }
}
