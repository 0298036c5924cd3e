//! Layered configuration.
//!
//! Merged field-by-field from, lowest priority first:
//! 1. **Defaults** - [`Config::default`]
//! 2. **Project** - `$CWD/gantt-tree/config.yaml`
//! 3. **User** - `~/.gantt-tree/config.yaml`
//! 4. **Environment** - individual overrides
//!
//! ## Environment Variables
//! - `GANTT_TREE_CONFIG_PATH` - Explicit config file (replaces project and user tiers)
//! - `GANTT_TREE_PROJECT_DIR` - Project config dir (default: `./gantt-tree`)
//! - `GANTT_TREE_USER_DIR` - User config dir (default: `~/.gantt-tree`)
//! - `GANTT_TREE_MAX_RECORDS` - `records.max_records`
//! - `GANTT_TREE_TIME_OFFSET_MINUTES` - `display.time_offset_minutes`
//! - `GANTT_TREE_READONLY` - `display.readonly`

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all, merge_into};
pub use types::*;
