//! Report rendering for MetricMemo.
//!
//! This crate turns a resolved time window plus the two query adapters into
//! an HTML document:
//!
//! - [`format`] holds the pure value formatters exposed as template filters
//! - [`context`] binds the template namespace (time variables, query
//!   functions, filters) into a `minijinja` environment
//! - [`render`] loads a template from disk and renders it
//!
//! The namespace guaranteed to template authors: the globals
//! `time_selection`, `now`, `date`, `start_date`, `end_date`; the functions
//! `query_prom`, `query_prom_raw`, `query_loki`, `query_loki_top`,
//! `query_loki_raw`; and the filters `fmt_bytes`, `fmt_pct`,
//! `fmt_timedelta`, `from_epoch`, `to_timedelta`.

pub mod context;
pub mod error;
pub mod format;
pub mod render;

pub use context::ReportContext;
pub use error::{ReportError, Result};
pub use render::Renderer;
