//! Structured error types for generation passes and record-store lookups.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation (record skipped, pass continues)
    MissingRequiredField,

    // Construction (pass aborted)
    MalformedTimestamp,
    InvalidProgress,

    // Lookup (reported, cache or default kept)
    DependencyLookupFailed,
    MetadataLookupFailed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingRequiredField => "MISSING_REQUIRED_FIELD",
            ErrorCode::MalformedTimestamp => "MALFORMED_TIMESTAMP",
            ErrorCode::InvalidProgress => "INVALID_PROGRESS",
            ErrorCode::DependencyLookupFailed => "DEPENDENCY_LOOKUP_FAILED",
            ErrorCode::MetadataLookupFailed => "METADATA_LOOKUP_FAILED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a [`RecordStore`](crate::store::RecordStore) lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("metadata error: {0}")]
    Metadata(String),
}

/// A non-fatal lookup failure, delivered to the notification channel.
///
/// The generation pass keeps going: the dependency cache keeps its previous
/// entry and color resolution falls back to the default color.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{code} for {subject}: {source}")]
pub struct LookupFailure {
    pub code: ErrorCode,
    /// Record id for dependency lookups, entity type for metadata lookups.
    pub subject: String,
    #[source]
    pub source: StoreError,
}

impl LookupFailure {
    pub fn dependencies(record_id: &str, source: StoreError) -> Self {
        Self {
            code: ErrorCode::DependencyLookupFailed,
            subject: record_id.to_string(),
            source,
        }
    }

    pub fn metadata(entity_type: &str, source: StoreError) -> Self {
        Self {
            code: ErrorCode::MetadataLookupFailed,
            subject: entity_type.to_string(),
            source,
        }
    }
}

/// Which required field made a record ineligible for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingName,
    MissingStart,
    MissingEnd,
    /// A project whose subtree has no leaf with a usable schedule.
    EmptySpan,
}

impl SkipReason {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::MissingRequiredField
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::MissingName => "name is required",
            SkipReason::MissingStart => "start is required",
            SkipReason::MissingEnd => "end is required",
            SkipReason::EmptySpan => "project has no scheduled leaf descendants",
        };
        f.write_str(s)
    }
}

/// Aggregate failure of a generation pass.
///
/// Any variant discards every task built so far in the pass.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GenerateError {
    #[error(
        "Create task error. Record id: {id}, name: {name}, start time: {start}, end time: {end}, progress: {progress}. Error text {reason}"
    )]
    Construction {
        code: ErrorCode,
        id: String,
        name: String,
        start: String,
        end: String,
        progress: String,
        reason: String,
    },
}

impl GenerateError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GenerateError::Construction { code, .. } => *code,
        }
    }

    /// Id of the record whose construction failed.
    pub fn record_id(&self) -> &str {
        match self {
            GenerateError::Construction { id, .. } => id,
        }
    }
}

/// Result type for generation passes.
pub type GenerateResult<T> = std::result::Result<T, GenerateError>;
