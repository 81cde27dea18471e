//! MetricMemo configuration loading and validation.
//!
//! Settings come from environment variables (a `.env` file is loaded by the
//! binary before this crate is consulted). Backend settings are always
//! required; SMTP settings are only required by the `send-email` command and
//! are validated eagerly there, before any query is issued.

pub mod error;
pub mod settings;

pub use error::{ConfigError, Result};
pub use settings::{BackendSettings, BasicAuth, Settings, SmtpEncryption, SmtpSettings};
