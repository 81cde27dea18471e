//! Typed settings resolved from environment variables.
//!
//! The variable surface:
//!
//! | Variable          | Meaning                                      |
//! |-------------------|----------------------------------------------|
//! | `PROM_URL`        | Prometheus base URL (required)               |
//! | `PROM_USE_AUTH`   | `true` to send basic auth to Prometheus      |
//! | `PROM_USER`/`PROM_PASS` | credentials when auth is enabled       |
//! | `LOKI_URL`        | Loki base URL (required)                     |
//! | `LOKI_USE_AUTH`   | `true` to send basic auth to Loki            |
//! | `LOKI_USER`/`LOKI_PASS` | credentials when auth is enabled       |
//! | `SMTP_SERVER`     | SMTP host (required for delivery)            |
//! | `SMTP_PORT`       | SMTP port (required for delivery)            |
//! | `SMTP_USER`/`SMTP_PASS` | SMTP credentials (required)            |
//! | `SMTP_FROM_NAME`  | display name for the From header             |
//! | `SMTP_USE_STARTTLS` | `true` for STARTTLS, otherwise implicit TLS|
//! | `EMAIL_TO`        | comma-separated recipient list (required)    |

use crate::error::{ConfigError, Result};

/// HTTP basic-auth credentials for a query backend.
#[derive(Debug, Clone)]
pub struct BasicAuth {
    pub user: String,
    pub password: String,
}

/// Connection settings for one query backend (Prometheus or Loki).
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Base URL, e.g. `https://prometheus.example.org`.
    pub url: String,
    /// Optional basic-auth credentials.
    pub auth: Option<BasicAuth>,
}

/// How the SMTP session is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpEncryption {
    /// Implicit TLS from the first byte (SMTPS, usually port 465).
    Tls,
    /// Plaintext connection upgraded via STARTTLS (usually port 587).
    StartTls,
}

/// Settings for SMTP report delivery.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Display name used in the From header, e.g. `Reports <user@host>`.
    pub from_name: String,
    pub encryption: SmtpEncryption,
    /// Recipient addresses, already split on commas.
    pub recipients: Vec<String>,
}

/// All settings for one invocation.
///
/// Constructed once at startup and passed by reference into the adapters;
/// there is no global configuration state.
#[derive(Debug, Clone)]
pub struct Settings {
    pub prometheus: BackendSettings,
    pub loki: BackendSettings,
    /// Present only when the delivery variables are set. `send-email`
    /// requires this; `template-dev-server` ignores it.
    pub smtp: Option<SmtpSettings>,
}

impl Settings {
    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load settings through an injected lookup. Tests use this to avoid
    /// mutating process-wide environment state.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prometheus = backend_from_lookup(
            &lookup,
            "PROM_URL",
            "PROM_USE_AUTH",
            "PROM_USER",
            "PROM_PASS",
        )?;
        let loki = backend_from_lookup(
            &lookup,
            "LOKI_URL",
            "LOKI_USE_AUTH",
            "LOKI_USER",
            "LOKI_PASS",
        )?;
        let smtp = smtp_from_lookup(&lookup)?;

        Ok(Settings {
            prometheus,
            loki,
            smtp,
        })
    }

    /// Return the SMTP settings, failing if the delivery variables were
    /// absent. `send-email` calls this before issuing any query.
    pub fn require_smtp(&self) -> Result<&SmtpSettings> {
        self.smtp
            .as_ref()
            .ok_or(ConfigError::MissingVar("SMTP_SERVER"))
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name)),
    }
}

fn flag<F>(lookup: &F, name: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).is_some_and(|v| v == "true")
}

fn backend_from_lookup<F>(
    lookup: &F,
    url_var: &'static str,
    auth_flag_var: &'static str,
    user_var: &'static str,
    pass_var: &'static str,
) -> Result<BackendSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let url = required(lookup, url_var)?;
    let auth = if flag(lookup, auth_flag_var) {
        Some(BasicAuth {
            user: required(lookup, user_var)?,
            password: required(lookup, pass_var)?,
        })
    } else {
        None
    };

    Ok(BackendSettings {
        url: url.trim_end_matches('/').to_string(),
        auth,
    })
}

fn smtp_from_lookup<F>(lookup: &F) -> Result<Option<SmtpSettings>>
where
    F: Fn(&str) -> Option<String>,
{
    // SMTP_SERVER decides whether delivery is configured at all; once it is
    // set, the rest of the delivery variables become mandatory.
    let server = match lookup("SMTP_SERVER") {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(None),
    };

    let port_raw = required(lookup, "SMTP_PORT")?;
    let port: u16 = port_raw
        .parse()
        .map_err(|_| ConfigError::InvalidVar {
            name: "SMTP_PORT",
            reason: format!("'{port_raw}' is not a valid port number"),
        })?;

    let user = required(lookup, "SMTP_USER")?;
    let password = required(lookup, "SMTP_PASS")?;
    let from_name = lookup("SMTP_FROM_NAME").unwrap_or_else(|| "MetricMemo".to_string());

    let encryption = if flag(lookup, "SMTP_USE_STARTTLS") {
        SmtpEncryption::StartTls
    } else {
        SmtpEncryption::Tls
    };

    let to_raw = required(lookup, "EMAIL_TO")?;
    let recipients: Vec<String> = to_raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if recipients.is_empty() {
        return Err(ConfigError::InvalidVar {
            name: "EMAIL_TO",
            reason: "no recipient addresses found".to_string(),
        });
    }

    Ok(Some(SmtpSettings {
        server,
        port,
        user,
        password,
        from_name,
        encryption,
        recipients,
    }))
}
