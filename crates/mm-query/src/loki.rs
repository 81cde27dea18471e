//! Loki query adapter.
//!
//! Three query shapes over the resolved window:
//! - aggregate counts grouped by the `message` label
//! - top-N counts grouped by an arbitrary label
//! - raw log lines, newest first
//!
//! Aggregate and top-N results are re-sorted locally (count descending,
//! then the grouping value ascending) so equal counts order the same way
//! regardless of what the backend happened to return.

use crate::error::{QueryError, Result};
use crate::http::{ApiResponse, Backend, StreamChunk, VectorSample, INSTANT_TIMEOUT, RANGE_TIMEOUT};
use crate::window::TimeWindow;
use chrono::{DateTime, Utc};
use mm_config::BackendSettings;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::debug;

/// How many message groups an aggregate query keeps.
const AGGREGATE_TOP_K: usize = 5;

/// Fallback when a grouped series lacks the expected label.
const NO_MESSAGE_LABEL: &str = "No message label found";
const NO_LABEL_VALUE: &str = "Unknown";

/// One group of an aggregate (count-by-message) query.
#[derive(Debug, Clone, Serialize)]
pub struct LogAggregateEntry {
    pub message: String,
    pub count: u64,
}

/// One group of a top-N-by-label query.
#[derive(Debug, Clone, Serialize)]
pub struct LogTopEntry {
    pub label_value: String,
    pub count: u64,
}

/// One raw log line with its stream labels.
#[derive(Debug, Clone, Serialize)]
pub struct LogRawEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub labels: BTreeMap<String, String>,
}

/// Blocking Loki client bound to one [`TimeWindow`].
pub struct LokiClient {
    backend: Backend,
    window: TimeWindow,
}

impl LokiClient {
    pub fn new(settings: &BackendSettings, window: TimeWindow) -> Self {
        LokiClient {
            backend: Backend::new(settings),
            window,
        }
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Count log lines grouped by the `message` label over the window.
    ///
    /// Wraps the selector in
    /// `topk(5, sum by (message) (count_over_time(<logql> [<window>])))`.
    pub fn query_aggregate(&self, logql: &str) -> Result<Vec<LogAggregateEntry>> {
        let query = format!(
            "topk({AGGREGATE_TOP_K}, sum by (message) (count_over_time({logql} [{}])))",
            self.window.label
        );
        let mut entries: Vec<LogAggregateEntry> = self
            .instant(&query)?
            .into_iter()
            .map(|sample| {
                Ok(LogAggregateEntry {
                    message: label_or(&sample.metric, "message", NO_MESSAGE_LABEL),
                    count: parse_count(&sample.value.1)?,
                })
            })
            .collect::<Result<_>>()?;

        entries.sort_by(|a, b| {
            Reverse(a.count)
                .cmp(&Reverse(b.count))
                .then_with(|| a.message.cmp(&b.message))
        });
        Ok(entries)
    }

    /// Top `limit` values of `label` for lines matching `selector`.
    ///
    /// Wraps the selector in
    /// `topk(<limit>, sum by (<label>) (count_over_time(<selector> [<window>])))`.
    pub fn query_top(&self, selector: &str, label: &str, limit: usize) -> Result<Vec<LogTopEntry>> {
        if limit == 0 {
            return Err(QueryError::InvalidArgument(
                "top-N limit must be a positive integer".to_string(),
            ));
        }

        let query = format!(
            "topk({limit}, sum by ({label}) (count_over_time({selector} [{}])))",
            self.window.label
        );
        let mut entries: Vec<LogTopEntry> = self
            .instant(&query)?
            .into_iter()
            .map(|sample| {
                Ok(LogTopEntry {
                    label_value: label_or(&sample.metric, label, NO_LABEL_VALUE),
                    count: parse_count(&sample.value.1)?,
                })
            })
            .collect::<Result<_>>()?;

        entries.sort_by(|a, b| {
            Reverse(a.count)
                .cmp(&Reverse(b.count))
                .then_with(|| a.label_value.cmp(&b.label_value))
        });
        entries.truncate(limit);
        Ok(entries)
    }

    /// Fetch up to `limit` raw log lines over the window, newest first.
    pub fn query_raw(&self, logql: &str, limit: usize) -> Result<Vec<LogRawEntry>> {
        if limit == 0 {
            return Err(QueryError::InvalidArgument(
                "raw log limit must be a positive integer".to_string(),
            ));
        }

        debug!(logql, limit, "loki range query");

        let params = [
            ("query", logql.to_string()),
            ("start", unix_ns(self.window.start).to_string()),
            ("end", unix_ns(self.window.end).to_string()),
            ("limit", limit.to_string()),
            ("direction", "BACKWARD".to_string()),
        ];
        let response: ApiResponse<StreamChunk> = self
            .backend
            .get_json("/loki/api/v1/query_range", &params, RANGE_TIMEOUT)
            .map_err(|e| QueryError::Log(e.to_string()))?;

        let mut entries = Vec::new();
        for chunk in response.into_result().map_err(QueryError::Log)? {
            for (ns, line) in chunk.values {
                entries.push(LogRawEntry {
                    timestamp: parse_ns(&ns)?,
                    message: line,
                    labels: chunk.stream.clone(),
                });
            }
        }

        entries.sort_by_key(|e| Reverse(e.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    fn instant(&self, query: &str) -> Result<Vec<VectorSample>> {
        debug!(query, at = %self.window.end, "loki instant query");

        let params = [
            ("query", query.to_string()),
            ("time", unix_ns(self.window.end).to_string()),
        ];
        let response: ApiResponse<VectorSample> = self
            .backend
            .get_json("/loki/api/v1/query", &params, INSTANT_TIMEOUT)
            .map_err(|e| QueryError::Log(e.to_string()))?;

        response.into_result().map_err(QueryError::Log)
    }
}

fn label_or(labels: &BTreeMap<String, String>, name: &str, fallback: &str) -> String {
    labels
        .get(name)
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}

/// Loki serializes counts as float strings ("3" or "3.0").
fn parse_count(raw: &str) -> Result<u64> {
    raw.parse::<f64>()
        .map(|v| v as u64)
        .map_err(|_| QueryError::Log(format!("non-numeric count value '{raw}'")))
}

/// Unix nanoseconds, the timestamp format Loki's API expects.
fn unix_ns(ts: DateTime<Utc>) -> i128 {
    ts.timestamp() as i128 * 1_000_000_000 + ts.timestamp_subsec_nanos() as i128
}

fn parse_ns(raw: &str) -> Result<DateTime<Utc>> {
    let ns: i128 = raw
        .parse()
        .map_err(|_| QueryError::Log(format!("invalid entry timestamp '{raw}'")))?;
    let secs = (ns / 1_000_000_000) as i64;
    let nanos = (ns % 1_000_000_000) as u32;
    DateTime::from_timestamp(secs, nanos)
        .ok_or_else(|| QueryError::Log(format!("entry timestamp '{raw}' out of range")))
}
