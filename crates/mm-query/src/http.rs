//! Shared blocking HTTP plumbing for the backend adapters.
//!
//! Both backends speak the same envelope: a JSON object with a `status`
//! field and a `data.result` payload, errors carried in `error`. The
//! adapters differ only in endpoint paths and result shapes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use mm_config::BackendSettings;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const INSTANT_TIMEOUT: Duration = Duration::from_secs(15);
pub(crate) const RANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Proxies in front of the backends tend to answer auth failures with HTML
/// pages; cap how much of that ends up in error messages.
const ERROR_BODY_LIMIT: usize = 300;

/// One configured backend connection: agent, base URL, optional auth.
pub(crate) struct Backend {
    agent: ureq::Agent,
    base_url: String,
    auth_header: Option<String>,
}

/// Low-level request failure, mapped by the adapters into the crate error.
#[derive(Debug)]
pub(crate) enum HttpError {
    Status { code: u16, body: String },
    Transport(String),
    Decode(String),
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::Status { code, body } if body.is_empty() => {
                write!(f, "HTTP {code}")
            }
            HttpError::Status { code, body } => write!(f, "HTTP {code}: {body}"),
            HttpError::Transport(msg) => write!(f, "transport error: {msg}"),
            HttpError::Decode(msg) => write!(f, "unexpected response body: {msg}"),
        }
    }
}

impl Backend {
    pub(crate) fn new(settings: &BackendSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .build();
        let auth_header = settings.auth.as_ref().map(|auth| {
            format!(
                "Basic {}",
                STANDARD.encode(format!("{}:{}", auth.user, auth.password))
            )
        });

        Backend {
            agent,
            base_url: settings.url.clone(),
            auth_header,
        }
    }

    /// Issue one GET request and decode the JSON response body.
    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        timeout: Duration,
    ) -> Result<T, HttpError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.agent.get(&url).timeout(timeout);
        for (name, value) in params {
            request = request.query(name, value);
        }
        if let Some(header) = &self.auth_header {
            request = request.set("Authorization", header);
        }

        match request.call() {
            Ok(response) => response
                .into_json::<T>()
                .map_err(|e| HttpError::Decode(e.to_string())),
            Err(ureq::Error::Status(code, response)) => {
                let body: String = response
                    .into_string()
                    .unwrap_or_default()
                    .chars()
                    .take(ERROR_BODY_LIMIT)
                    .collect();
                Err(HttpError::Status { code, body })
            }
            Err(err) => Err(HttpError::Transport(err.to_string())),
        }
    }
}

/// The `{"status": ..., "data": {"result": [...]}}` envelope both backends
/// share. `error` is populated when `status` is `"error"`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub status: String,
    #[serde(default)]
    pub data: Option<ApiData<T>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiData<T> {
    #[serde(default = "Vec::new")]
    pub result: Vec<T>,
}

/// One series of a vector-typed result: label set plus `[timestamp, value]`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct VectorSample {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    pub value: (f64, String),
}

/// One stream of a streams-typed result: label set plus `[ns, line]` pairs.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct StreamChunk {
    #[serde(default)]
    pub stream: BTreeMap<String, String>,
    #[serde(default)]
    pub values: Vec<(String, String)>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the envelope: backend-reported errors become `Err`, a missing
    /// `data` block is an empty result.
    pub(crate) fn into_result(self) -> Result<Vec<T>, String> {
        if self.status != "success" {
            return Err(self
                .error
                .unwrap_or_else(|| format!("backend returned status '{}'", self.status)));
        }
        Ok(self.data.map(|d| d.result).unwrap_or_default())
    }
}
