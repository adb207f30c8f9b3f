//! Outbound newsletter mail.
//!
//! Handlers hand a fully built `EmailMessage` to an `EmailSender`. Rendering
//! the message body is left to whatever sits behind the sender; the default
//! `LogEmailSender` only records the recipient and the links so local runs can
//! follow the double opt-in flow from the logs.

use anyhow::Result;
use std::sync::Mutex;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub to_email: String,
    pub template: String,
    pub locale: String,
    pub confirm_url: String,
    pub unsubscribe_url: String,
}

/// Email delivery abstraction used by the subscribe endpoint.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error; the caller decides whether it is fatal.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the links instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            template = %message.template,
            locale = %message.locale,
            confirm_url = %message.confirm_url,
            unsubscribe_url = %message.unsubscribe_url,
            "newsletter email send stub"
        );
        Ok(())
    }
}

/// Keeps every message in memory; used by tests to pick up emailed tokens.
#[derive(Debug, Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingEmailSender {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl EmailSender for RecordingEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow::anyhow!("email recorder lock poisoned"))?
            .push(message.clone());
        Ok(())
    }
}
