//! Email provider trait.

use super::BoxFuture;
use serde::{Deserialize, Serialize};

/// A rendered email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// Plain-text body
    pub body: String,
}

/// Email provider.
///
/// This trait abstracts over email delivery (SMTP, console, test doubles).
/// Callers treat delivery as best-effort: an `Err` is logged, never
/// surfaced to the API client.
pub trait Mailer: Send + Sync {
    /// Send one email.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure if:
    /// - The address is invalid
    /// - The transport rejects the message
    fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<(), String>>;
}
