//! Logging setup and the notification channel for non-fatal failures.
//!
//! Two outputs:
//! - tracing (stdout/stderr/file), configured once by the host via [`init`]
//! - an optional mpsc sender, so a host can surface lookup failures to users

use crate::error::LookupFailure;
use anyhow::Result;
use std::fs::OpenOptions;
use tokio::sync::mpsc::UnboundedSender;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stdout,
    Stderr,
    File(String),
}

impl LogTarget {
    /// Parse the `--log` value: `0`/`off`, `1`/`stdout`, `2`/`stderr`, or a filename.
    pub fn parse(s: &str) -> Self {
        match s {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            filename => LogTarget::File(filename.to_string()),
        }
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `verbose` when set.
pub fn init(target: &LogTarget, verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    match target {
        LogTarget::Off => {}
        LogTarget::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::File(filename) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

/// Receiver of non-fatal lookup failures.
pub trait NotificationChannel: Send + Sync {
    fn report_error(&self, failure: &LookupFailure);
}

/// Notification channel that logs every failure and optionally forwards it.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    sender: Option<UnboundedSender<LookupFailure>>,
    name: Option<String>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward failures to `sender` in addition to logging them.
    pub fn with_sender(mut self, sender: UnboundedSender<LookupFailure>) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Tag log lines with a host-chosen name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl NotificationChannel for Notifier {
    fn report_error(&self, failure: &LookupFailure) {
        match self.name {
            Some(ref name) => tracing::warn!(
                logger = %name,
                code = %failure.code,
                subject = %failure.subject,
                "{}",
                failure.source
            ),
            None => tracing::warn!(
                code = %failure.code,
                subject = %failure.subject,
                "{}",
                failure.source
            ),
        }

        if let Some(ref sender) = self.sender {
            // Receiver gone means nobody is listening anymore.
            let _ = sender.send(failure.clone());
        }
    }
}
