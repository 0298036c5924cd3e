//! CLI definitions for the gantt-tree host.
//!
//! The binary is a thin shell around the library: it loads config and a
//! records file, runs generation passes, and prints the result.

pub mod render;

use clap::{Parser, Subcommand};
use render::RenderArgs;

/// Build ordered Gantt task trees from flat parent-pointer records
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (replaces project and user config tiers)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate the task list for a records file
    Render(RenderArgs),
}
