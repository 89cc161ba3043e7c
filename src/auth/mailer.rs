//! Delivering password reset emails.

use email_address::EmailAddress;

use crate::Error;

/// Sends plain text emails.
pub trait Mailer: Send + Sync {
    /// Send an email with `subject` and `body` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [Error::MailDelivery] if the message could not be sent.
    fn send(&self, to: &EmailAddress, subject: &str, body: &str) -> Result<(), Error>;
}

/// A [Mailer] that writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, to: &EmailAddress, subject: &str, body: &str) -> Result<(), Error> {
        tracing::info!("Email to {to} with subject {subject:?}:\n{body}");

        Ok(())
    }
}
