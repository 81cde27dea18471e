//! Time-window resolution.
//!
//! A duration expression like `7d` or `24h` is anchored to "now" (or an
//! explicit reference instant) and resolved into a concrete `[start, end]`
//! pair. The window is immutable once resolved; every query adapter is
//! constructed against one window and scopes all of its queries to it.

use crate::error::{QueryError, Result};
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn duration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)([dh])$").expect("static regex is valid"))
}

/// A resolved reporting window. All timestamps are UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    /// Window start, `end - duration`.
    pub start: DateTime<Utc>,
    /// Window end, the reference instant.
    pub end: DateTime<Utc>,
    /// The original duration expression, e.g. `7d`. Templates receive this
    /// as `time_selection` and query builders splice it into range vectors.
    pub label: String,
}

impl TimeWindow {
    /// Resolve a duration expression against an explicit reference instant.
    ///
    /// The grammar is `<integer><unit>` with unit `d` (days) or `h` (hours)
    /// and a strictly positive integer.
    pub fn resolve(expr: &str, now: DateTime<Utc>) -> Result<Self> {
        let invalid = || QueryError::InvalidDuration {
            expr: expr.to_string(),
        };

        let caps = duration_re().captures(expr).ok_or_else(invalid)?;
        let n: i64 = caps[1].parse().map_err(|_| invalid())?;
        if n <= 0 {
            return Err(invalid());
        }

        let duration = match &caps[2] {
            "d" => Duration::try_days(n),
            "h" => Duration::try_hours(n),
            _ => unreachable!("regex restricts the unit"),
        }
        .ok_or_else(invalid)?;

        let start = now.checked_sub_signed(duration).ok_or_else(invalid)?;

        Ok(TimeWindow {
            start,
            end: now,
            label: expr.to_string(),
        })
    }

    /// Resolve a duration expression against the current UTC time.
    pub fn resolve_now(expr: &str) -> Result<Self> {
        Self::resolve(expr, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
    }

    #[test]
    fn resolves_days() {
        let now = reference();
        let w = TimeWindow::resolve("7d", now).unwrap();
        assert_eq!(w.end, now);
        assert_eq!(w.start, now - Duration::days(7));
        assert_eq!(w.label, "7d");
    }

    #[test]
    fn resolves_hours() {
        let now = reference();
        let w = TimeWindow::resolve("24h", now).unwrap();
        assert_eq!(w.end, now);
        assert_eq!(w.start, now - Duration::hours(24));
    }

    #[test]
    fn single_unit_counts_work() {
        let now = reference();
        assert_eq!(
            TimeWindow::resolve("1d", now).unwrap().start,
            now - Duration::days(1)
        );
        assert_eq!(
            TimeWindow::resolve("1h", now).unwrap().start,
            now - Duration::hours(1)
        );
    }

    #[test]
    fn empty_expression_fails() {
        assert!(matches!(
            TimeWindow::resolve("", reference()),
            Err(QueryError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn zero_count_fails() {
        assert!(TimeWindow::resolve("0d", reference()).is_err());
    }

    #[test]
    fn negative_count_fails() {
        assert!(TimeWindow::resolve("-5d", reference()).is_err());
    }

    #[test]
    fn unknown_unit_fails() {
        assert!(TimeWindow::resolve("7w", reference()).is_err());
        assert!(TimeWindow::resolve("30m", reference()).is_err());
    }

    #[test]
    fn trailing_garbage_fails() {
        assert!(TimeWindow::resolve("7d ", reference()).is_err());
        assert!(TimeWindow::resolve("7dd", reference()).is_err());
        assert!(TimeWindow::resolve("d7", reference()).is_err());
    }

    #[test]
    fn absurdly_large_count_fails_instead_of_panicking() {
        assert!(TimeWindow::resolve("99999999999999999999d", reference()).is_err());
        assert!(TimeWindow::resolve("9223372036854775807d", reference()).is_err());
    }
}
