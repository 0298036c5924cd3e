//! Render subcommand.
//!
//! Runs several passes so that predecessor links fetched during one pass are
//! visible in the printed one.

use crate::format::OutputFormat;
use anyhow::{Result, anyhow};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the render subcommand
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Records file (YAML, or JSON by extension)
    #[arg(value_name = "FILE")]
    pub records: PathBuf,

    /// Output format: json or markdown
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Generation passes to run; only the last one is printed
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..))]
    pub passes: u32,

    /// Project id to show collapsed (repeatable)
    #[arg(long, value_name = "ID")]
    pub collapse: Vec<String>,
}

impl RenderArgs {
    pub fn output_format(&self) -> Result<OutputFormat> {
        OutputFormat::from_str(&self.format)
            .ok_or_else(|| anyhow!("unknown output format '{}' (expected json or markdown)", self.format))
    }
}
