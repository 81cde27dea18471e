//! SMTP delivery of the rendered report.
//!
//! One message per invocation, HTML body, delivered synchronously. Delivery
//! failures are fatal and never retried; cron provides the next attempt.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use mm_config::{SmtpEncryption, SmtpSettings};
use thiserror::Error;
use tracing::info;

/// Errors that can occur while building or delivering the email.
#[derive(Error, Debug)]
pub enum MailError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Send the rendered HTML to every configured recipient in one message.
pub fn send(settings: &SmtpSettings, subject: &str, html: String) -> Result<(), MailError> {
    let from: Mailbox = format!("{} <{}>", settings.from_name, settings.user).parse()?;

    let mut builder = Message::builder().from(from).subject(subject);
    for recipient in &settings.recipients {
        builder = builder.to(recipient.parse()?);
    }
    let message = builder.header(ContentType::TEXT_HTML).body(html)?;

    let transport = match settings.encryption {
        SmtpEncryption::Tls => SmtpTransport::relay(&settings.server)?,
        SmtpEncryption::StartTls => SmtpTransport::starttls_relay(&settings.server)?,
    }
    .port(settings.port)
    .credentials(Credentials::new(
        settings.user.clone(),
        settings.password.clone(),
    ))
    .build();

    transport.send(&message)?;
    info!(
        recipients = settings.recipients.len(),
        subject, "report delivered"
    );
    Ok(())
}
