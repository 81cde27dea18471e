//! Pure value formatters exposed to templates as filters.
//!
//! All functions here are total on well-typed input: they never perform I/O
//! and never fail. Out-of-range timestamps render a placeholder instead of
//! erroring, so a single odd sample cannot abort a whole report.

use chrono::DateTime;

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

const BYTE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Render a byte count with the largest unit that keeps the scaled value in
/// `[1, 1024)`. KB and above use two decimals; the byte unit stays integral
/// when it can. Zero renders as `0 B`.
pub fn fmt_bytes(value: f64) -> String {
    if value == 0.0 {
        return "0 B".to_string();
    }

    let sign = if value < 0.0 { "-" } else { "" };
    let mut scaled = value.abs();
    let mut unit = 0;
    while scaled >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        scaled /= 1024.0;
        unit += 1;
    }

    if unit == 0 && scaled.fract() == 0.0 {
        format!("{sign}{scaled:.0} {}", BYTE_UNITS[0])
    } else {
        format!("{sign}{scaled:.2} {}", BYTE_UNITS[unit])
    }
}

/// Render an already-scaled percentage with two decimals and a `%` suffix.
///
/// The input is taken as a percentage, never as a fraction: `fmt_pct(12.5)`
/// is `"12.50%"`. Queries that produce ratios multiply by 100 in PromQL.
pub fn fmt_pct(value: f64) -> String {
    format!("{value:.2}%")
}

/// Render a duration in whole seconds as `{d}d {h}h {m}m`, dropping
/// zero-valued leading components and flooring at minutes. A zero (or
/// negative) duration renders as `0m`.
pub fn fmt_timedelta(total_seconds: i64) -> String {
    let seconds = total_seconds.max(0);
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{hours}h"));
    }
    parts.push(format!("{minutes}m"));

    parts.join(" ")
}

/// Interpret a number as UTC seconds since the epoch and render it as
/// `YYYY-MM-DD HH:MM:SS`.
pub fn from_epoch(value: f64) -> String {
    match DateTime::from_timestamp(value.trunc() as i64, 0) {
        Some(ts) => ts.format(DATETIME_FMT).to_string(),
        None => format!("invalid epoch {value}"),
    }
}

/// Interpret a number as a count of seconds, truncated to a whole-second
/// duration consumable by [`fmt_timedelta`].
pub fn to_timedelta(value: f64) -> i64 {
    value.trunc() as i64
}
