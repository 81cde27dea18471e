//! Template context binding.
//!
//! [`ReportContext`] is the single provider of everything a template can
//! see. It owns the query adapters (shared into the template closures via
//! `Arc`) and the resolved window, and produces a fully bound
//! `minijinja::Environment` per render. Nothing in the namespace outlives
//! one render invocation.

use crate::format;
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, ErrorKind};
use mm_config::Settings;
use mm_query::{LokiClient, PromClient, QueryError, TimeWindow};
use std::sync::Arc;

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

const DEFAULT_TOP_LIMIT: usize = 10;
const DEFAULT_RAW_LIMIT: usize = 50;

/// The namespace provider for one render invocation.
pub struct ReportContext {
    window: TimeWindow,
    prom: Arc<PromClient>,
    loki: Arc<LokiClient>,
}

impl ReportContext {
    /// Bind both adapters to the resolved window.
    pub fn new(settings: &Settings, window: TimeWindow) -> Self {
        let prom = Arc::new(PromClient::new(&settings.prometheus, window.clone()));
        let loki = Arc::new(LokiClient::new(&settings.loki, window.clone()));
        ReportContext { window, prom, loki }
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Build the HTML template environment: time globals, query functions,
    /// formatter filters. Auto-escaping is always on; reports are HTML.
    pub fn environment(&self) -> Environment<'static> {
        let mut env = self.subject_environment();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        let prom = Arc::clone(&self.prom);
        env.add_function(
            "query_prom",
            move |query: String| -> Result<f64, minijinja::Error> {
                prom.query_scalar(&query).map_err(template_error)
            },
        );

        let prom = Arc::clone(&self.prom);
        env.add_function(
            "query_prom_raw",
            move |query: String| -> Result<Value, minijinja::Error> {
                let samples = prom.query_raw(&query).map_err(template_error)?;
                Ok(Value::from_serialize(&samples))
            },
        );

        let loki = Arc::clone(&self.loki);
        env.add_function(
            "query_loki",
            move |logql: String| -> Result<Value, minijinja::Error> {
                let entries = loki.query_aggregate(&logql).map_err(template_error)?;
                Ok(Value::from_serialize(&entries))
            },
        );

        let loki = Arc::clone(&self.loki);
        env.add_function(
            "query_loki_top",
            move |selector: String,
                  label: String,
                  limit: Option<usize>|
                  -> Result<Value, minijinja::Error> {
                let entries = loki
                    .query_top(&selector, &label, limit.unwrap_or(DEFAULT_TOP_LIMIT))
                    .map_err(template_error)?;
                Ok(Value::from_serialize(&entries))
            },
        );

        let loki = Arc::clone(&self.loki);
        env.add_function(
            "query_loki_raw",
            move |logql: String, limit: Option<usize>| -> Result<Value, minijinja::Error> {
                let entries = loki
                    .query_raw(&logql, limit.unwrap_or(DEFAULT_RAW_LIMIT))
                    .map_err(template_error)?;
                Ok(Value::from_serialize(&entries))
            },
        );

        env.add_filter("fmt_bytes", format::fmt_bytes);
        env.add_filter("fmt_pct", format::fmt_pct);
        env.add_filter("fmt_timedelta", format::fmt_timedelta);
        env.add_filter("from_epoch", format::from_epoch);
        env.add_filter("to_timedelta", format::to_timedelta);

        env
    }

    /// A minimal environment with the time globals only; used for the email
    /// subject line, which is plain text and must not hit the backends.
    pub fn subject_environment(&self) -> Environment<'static> {
        let mut env = Environment::new();
        env.add_global("time_selection", Value::from(self.window.label.clone()));
        env.add_global(
            "now",
            Value::from(self.window.end.format(DATETIME_FMT).to_string()),
        );
        env.add_global(
            "date",
            Value::from(self.window.end.format(DATE_FMT).to_string()),
        );
        env.add_global(
            "start_date",
            Value::from(self.window.start.format(DATETIME_FMT).to_string()),
        );
        env.add_global(
            "end_date",
            Value::from(self.window.end.format(DATETIME_FMT).to_string()),
        );
        env
    }
}

/// Wrap an adapter failure so minijinja reports it with template location
/// context while keeping the original error as the source.
fn template_error(err: QueryError) -> minijinja::Error {
    minijinja::Error::new(ErrorKind::InvalidOperation, "query failed during render")
        .with_source(err)
}
