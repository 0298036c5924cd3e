//! Timestamp parsing and schedule spans.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Parse a record timestamp.
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC), or a
/// bare `YYYY-MM-DD` (midnight UTC). Returns `None` for anything else.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Shift an instant by a whole number of minutes. `None` when the result
/// leaves the representable range.
pub fn apply_offset(instant: DateTime<Utc>, offset_minutes: i64) -> Option<DateTime<Utc>> {
    instant.checked_add_signed(TimeDelta::try_minutes(offset_minutes)?)
}

/// Earliest start and latest end over a set of leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Span {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Span of a single leaf, if both ends parse.
    pub fn from_text(start: Option<&str>, end: Option<&str>) -> Option<Self> {
        let start = parse_timestamp(start?)?;
        let end = parse_timestamp(end?)?;
        Some(Self { start, end })
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Merge an optional span into an optional accumulator.
    pub fn merge_opt(acc: Option<Span>, next: Option<Span>) -> Option<Span> {
        match (acc, next) {
            (Some(a), Some(b)) => Some(a.merge(b)),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_supported_formats() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-10"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-10T00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-10T02:00:00+02:00"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-10 00:00:00.000"), Some(midnight));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2024-13-40"), None);
    }

    #[test]
    fn offset_shifts_or_reports_overflow() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(
            apply_offset(midnight, -90),
            Some(Utc.with_ymd_and_hms(2024, 1, 9, 22, 30, 0).unwrap())
        );
        assert_eq!(apply_offset(midnight, 0), Some(midnight));
        assert_eq!(apply_offset(midnight, 1_000_000_000_000), None);
        assert_eq!(apply_offset(midnight, i64::MIN), None);
    }

    #[test]
    fn merge_takes_min_start_and_max_end() {
        let a = Span::from_text(Some("2024-01-10"), Some("2024-01-12")).unwrap();
        let b = Span::from_text(Some("2024-01-01"), Some("2024-01-05")).unwrap();
        let merged = a.merge(b);
        assert_eq!(merged.start, b.start);
        assert_eq!(merged.end, a.end);
    }

    #[test]
    fn merge_opt_keeps_defined_side() {
        let a = Span::from_text(Some("2024-01-10"), Some("2024-01-12"));
        assert_eq!(Span::merge_opt(None, a), a);
        assert_eq!(Span::merge_opt(a, None), a);
        assert_eq!(Span::merge_opt(None, None), None);
    }
}
