//! Prometheus query adapter.
//!
//! Instant queries only: the report window enters the query through the
//! evaluation timestamp (the window end) and through range vectors the
//! template author writes into the PromQL itself.

use crate::error::{QueryError, Result};
use crate::http::{ApiResponse, Backend, VectorSample, INSTANT_TIMEOUT};
use crate::window::TimeWindow;
use mm_config::BackendSettings;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// One series of an instant-query result.
#[derive(Debug, Clone, Serialize)]
pub struct MetricSample {
    /// Label set of the series.
    pub labels: BTreeMap<String, String>,
    /// Sample value at the evaluation timestamp.
    pub value: f64,
}

/// Blocking Prometheus client bound to one [`TimeWindow`].
pub struct PromClient {
    backend: Backend,
    window: TimeWindow,
}

impl PromClient {
    pub fn new(settings: &BackendSettings, window: TimeWindow) -> Self {
        PromClient {
            backend: Backend::new(settings),
            window,
        }
    }

    pub fn window(&self) -> &TimeWindow {
        &self.window
    }

    /// Execute an instant query that must yield exactly one series, and
    /// return its value.
    pub fn query_scalar(&self, query: &str) -> Result<f64> {
        let samples = self.instant(query)?;
        match samples.as_slice() {
            [sample] => Ok(sample.value),
            _ => Err(QueryError::ScalarShape {
                query: query.to_string(),
                count: samples.len(),
            }),
        }
    }

    /// Execute an instant query and return every series in backend order.
    pub fn query_raw(&self, query: &str) -> Result<Vec<MetricSample>> {
        self.instant(query)
    }

    fn instant(&self, query: &str) -> Result<Vec<MetricSample>> {
        debug!(query, at = %self.window.end, "prometheus instant query");

        let params = [
            ("query", query.to_string()),
            ("time", self.window.end.timestamp().to_string()),
        ];
        let response: ApiResponse<VectorSample> = self
            .backend
            .get_json("/api/v1/query", &params, INSTANT_TIMEOUT)
            .map_err(|e| QueryError::Metric(e.to_string()))?;

        response
            .into_result()
            .map_err(QueryError::Metric)?
            .into_iter()
            .map(|sample| {
                let value = sample.value.1.parse::<f64>().map_err(|_| {
                    QueryError::Metric(format!("non-numeric sample value '{}'", sample.value.1))
                })?;
                Ok(MetricSample {
                    labels: sample.metric,
                    value,
                })
            })
            .collect()
    }
}
