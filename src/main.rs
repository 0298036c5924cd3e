//! gantt-tree command-line host.

use anyhow::Result;
use clap::Parser;
use gantt_tree::cli::render::RenderArgs;
use gantt_tree::cli::{Cli, Command};
use gantt_tree::config::{Config, ConfigLoader, ConfigPaths};
use gantt_tree::format::format_tasks;
use gantt_tree::generator::TaskGenerator;
use gantt_tree::logging::{self, LogTarget, Notifier};
use gantt_tree::store::{MemoryRecordStore, RecordFile, RecordStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let mut paths = ConfigPaths::discover();
    if let Some(config_path) = &cli.config {
        paths = paths.with_explicit_file(config_path);
    }
    let loader = ConfigLoader::load_with(paths, |key| std::env::var(key).ok())?;
    if let Some(path) = loader.config_path() {
        debug!(path = %path.display(), "Using config");
    }
    let config = loader.into_config();

    match cli.command {
        Command::Render(args) => render(args, config).await,
    }
}

async fn render(args: RenderArgs, config: Config) -> Result<()> {
    let format = args.output_format()?;
    let file = RecordFile::load(&args.records)?;
    info!(
        records = file.records.len(),
        path = %args.records.display(),
        "Loaded records"
    );

    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::from_file(file));
    let (tx, mut failures) = tokio::sync::mpsc::unbounded_channel();
    let notifier = Arc::new(Notifier::new().with_name("render").with_sender(tx));
    let generator = TaskGenerator::new(store, notifier, config);

    for id in &args.collapse {
        generator.expansion().set_collapsed(id, true);
    }

    let mut tasks = Vec::new();
    for pass in 1..=args.passes {
        tasks = generator.generate().await?;
        generator.dependencies().settle().await;
        debug!(pass, tasks = tasks.len(), "Pass finished");
    }

    let mut failed_lookups = 0usize;
    while failures.try_recv().is_ok() {
        failed_lookups += 1;
    }
    if failed_lookups > 0 {
        warn!(failed_lookups, "Some lookups failed; defaults were used");
    }

    println!("{}", format_tasks(&tasks, format)?);
    Ok(())
}
