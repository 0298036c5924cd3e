//! Configuration loader with tier-based merging.
//!
//! Tiers, lowest priority first: embedded defaults, project
//! `./gantt-tree/config.yaml`, user `~/.gantt-tree/config.yaml`, then
//! environment variables. `GANTT_TREE_CONFIG_PATH` replaces the file tiers.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Explicit config file, bypassing tier discovery.
pub const ENV_CONFIG_PATH: &str = "GANTT_TREE_CONFIG_PATH";
pub const ENV_USER_DIR: &str = "GANTT_TREE_USER_DIR";
pub const ENV_PROJECT_DIR: &str = "GANTT_TREE_PROJECT_DIR";
pub const ENV_MAX_RECORDS: &str = "GANTT_TREE_MAX_RECORDS";
pub const ENV_TIME_OFFSET: &str = "GANTT_TREE_TIME_OFFSET_MINUTES";
pub const ENV_READONLY: &str = "GANTT_TREE_READONLY";

const CONFIG_FILE: &str = "config.yaml";

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    Project = 1,
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Where each tier lives.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
    /// Single file that replaces project and user tiers.
    pub explicit_file: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover tier locations from the environment and home directory.
    pub fn discover() -> Self {
        let user_dir = std::env::var(ENV_USER_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".gantt-tree")));

        let project_dir = std::env::var(ENV_PROJECT_DIR)
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("gantt-tree")));

        let explicit_file = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);

        Self {
            project_dir,
            user_dir,
            explicit_file,
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
            explicit_file: None,
        }
    }

    pub fn with_explicit_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }
}

/// Loads and merges configuration tiers.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-priority file that contributed.
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load from discovered paths and the process environment.
    pub fn load() -> Result<Self> {
        Self::load_with(ConfigPaths::discover(), |key| std::env::var(key).ok())
    }

    /// Load from explicit paths, ignoring environment overrides.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        Self::load_with(paths, |_| None)
    }

    /// Load from explicit paths with a custom environment lookup.
    pub fn load_with<F>(paths: ConfigPaths, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config_path = None;

        let mut config = if let Some(ref explicit) = paths.explicit_file {
            config_path = Some(explicit.clone());
            let tiers = vec![
                serde_json::to_value(Config::default())?,
                read_yaml_tier(explicit)?
                    .with_context(|| format!("config file not found: {}", explicit.display()))?,
            ];
            serde_json::from_value::<Config>(deep_merge_all(tiers))?
        } else {
            let mut tiers: Vec<Value> = vec![serde_json::to_value(Config::default())?];

            for (tier, dir) in [
                (ConfigTier::Project, paths.project_dir.as_deref()),
                (ConfigTier::User, paths.user_dir.as_deref()),
            ] {
                let Some(dir) = dir else { continue };
                let file = dir.join(CONFIG_FILE);
                match read_yaml_tier(&file) {
                    Ok(Some(value)) => {
                        debug!(%tier, path = %file.display(), "Loaded config tier");
                        tiers.push(value);
                        config_path = Some(file);
                    }
                    Ok(None) => {}
                    Err(e) => warn!(%tier, path = %file.display(), "Skipping unreadable config: {:#}", e),
                }
            }

            serde_json::from_value::<Config>(deep_merge_all(tiers))?
        };

        apply_env_overrides(&mut config, env);
        config.validate()?;

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

/// Read a YAML file as a merge tier. `Ok(None)` when the file does not exist.
fn read_yaml_tier(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&content)
        .with_context(|| format!("invalid YAML in {}", path.display()))?;
    Ok(Some(value))
}

fn apply_env_overrides<F>(config: &mut Config, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = env(ENV_MAX_RECORDS) {
        match raw.trim().parse::<usize>() {
            Ok(n) => config.records.max_records = n,
            Err(_) => warn!(tier = %ConfigTier::Environment, "Ignoring {}={}", ENV_MAX_RECORDS, raw),
        }
    }

    if let Some(raw) = env(ENV_TIME_OFFSET) {
        match raw.trim().parse::<i64>() {
            Ok(n) => config.display.time_offset_minutes = n,
            Err(_) => warn!(tier = %ConfigTier::Environment, "Ignoring {}={}", ENV_TIME_OFFSET, raw),
        }
    }

    if let Some(raw) = env(ENV_READONLY) {
        match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => config.display.readonly = true,
            "0" | "false" | "no" => config.display.readonly = false,
            _ => warn!(tier = %ConfigTier::Environment, "Ignoring {}={}", ENV_READONLY, raw),
        }
    }
}
