//! Output formatting for generated task lists.

use crate::types::Task;
use anyhow::Result;
use chrono::SecondsFormat;

/// Output format for rendered task lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Render tasks in the requested format.
pub fn format_tasks(tasks: &[Task], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(tasks)?),
        OutputFormat::Markdown => Ok(format_tasks_markdown(tasks)),
    }
}

/// Format one task as a markdown bullet, indented by level.
pub fn format_task_markdown(task: &Task) -> String {
    let mut line = String::new();
    line.push_str(&"  ".repeat(task.level as usize));

    match task.hide_children {
        Some(true) => line.push_str("- [+] "),
        Some(false) => line.push_str("- [-] "),
        None => line.push_str("- "),
    }

    line.push_str(&format!(
        "**{}** `{}` ({}) {} → {}, {:.0}%",
        task.name,
        task.id,
        task.kind.as_str(),
        task.start.to_rfc3339_opts(SecondsFormat::Secs, true),
        task.end.to_rfc3339_opts(SecondsFormat::Secs, true),
        task.progress * 100.0
    ));

    if !task.dependencies.is_empty() {
        let deps: Vec<String> = task.dependencies.iter().map(|id| format!("`{}`", id)).collect();
        line.push_str(&format!(", after {}", deps.join(", ")));
    }

    line
}

/// Format a whole task list as markdown.
pub fn format_tasks_markdown(tasks: &[Task]) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Tasks ({})\n\n", tasks.len()));
    for task in tasks {
        md.push_str(&format_task_markdown(task));
        md.push('\n');
    }
    md
}
