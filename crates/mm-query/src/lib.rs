//! Query layer for MetricMemo.
//!
//! This crate provides:
//! - Time-window resolution from duration expressions (`7d`, `24h`)
//! - A Prometheus adapter for instant queries (scalar and raw vector shape)
//! - A Loki adapter for aggregate, top-N, and raw log-line queries
//!
//! Every adapter call issues exactly one blocking HTTP request scoped to the
//! resolved [`TimeWindow`]; there is no caching and no retry. Failures map to
//! [`QueryError`] and propagate to the caller.

pub mod error;
mod http;
pub mod loki;
pub mod prom;
pub mod window;

pub use error::{QueryError, Result};
pub use loki::{LogAggregateEntry, LogRawEntry, LogTopEntry, LokiClient};
pub use prom::{MetricSample, PromClient};
pub use window::TimeWindow;
