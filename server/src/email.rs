//! Email delivery and notification templates.
//!
//! [`SmtpMailer`] sends through an SMTP relay with Lettre. When no relay is
//! configured, [`ConsoleMailer`] logs each message instead so development
//! setups need no mail server.

use crate::config::EmailConfig;
use eventhub_core::providers::{BoxFuture, EmailMessage, Mailer};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tracing::info;

/// SMTP mailer using Lettre's async transport.
///
/// # Configuration
///
/// - `SMTP_HOST` / `SMTP_PORT`: relay address (STARTTLS/TLS negotiated by Lettre)
/// - `SMTP_USERNAME` / `SMTP_PASSWORD`: optional credentials
/// - `EMAIL_FROM` / `EMAIL_FROM_NAME`: sender
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    /// Build a mailer for `host`.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host or sender address is invalid.
    pub fn new(host: &str, config: &EmailConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| anyhow::anyhow!("SMTP relay error: {e}"))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = Mailbox::new(
            Some(config.from_name.clone()),
            config
                .from_email
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid EMAIL_FROM address: {e}"))?,
        );

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<(), String>> {
        Box::pin(async move {
            let to: Mailbox = message
                .to
                .parse()
                .map_err(|e| format!("Invalid to address: {e}"))?;

            let email = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject(message.subject)
                .header(ContentType::TEXT_PLAIN)
                .body(message.body)
                .map_err(|e| format!("Failed to build email: {e}"))?;

            self.transport
                .send(email)
                .await
                .map(|_| ())
                .map_err(|e| format!("Failed to send email: {e}"))
        })
    }
}

/// Console mailer (logs messages instead of sending them).
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMailer;

impl Mailer for ConsoleMailer {
    fn send(&self, message: EmailMessage) -> BoxFuture<'_, Result<(), String>> {
        Box::pin(async move {
            info!(
                to = %message.to,
                subject = %message.subject,
                "\n{}",
                message.body
            );
            Ok(())
        })
    }
}

/// Pick the mailer for this configuration.
///
/// # Errors
///
/// Returns error if SMTP is configured but invalid.
pub fn build_mailer(config: &EmailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match &config.smtp_host {
        Some(host) => {
            info!(%host, port = config.smtp_port, "Using SMTP mailer");
            Ok(Arc::new(SmtpMailer::new(host, config)?))
        }
        None => {
            info!("SMTP_HOST not set, emails will be logged");
            Ok(Arc::new(ConsoleMailer))
        }
    }
}

/// Notification bodies.
pub mod templates {
    use eventhub_core::providers::EmailMessage;
    use eventhub_core::{Event, User};

    fn when(event: &Event) -> String {
        event.starts_at.format("%Y-%m-%d %H:%M UTC").to_string()
    }

    fn message(to: &User, subject: String, body: String) -> EmailMessage {
        EmailMessage {
            to: to.email.clone(),
            subject,
            body,
        }
    }

    /// The attendee holds a confirmed spot.
    #[must_use]
    pub fn registration_confirmed(to: &User, event: &Event) -> EmailMessage {
        message(
            to,
            format!("You're registered: {}", event.title),
            format!(
                "Hi {},\n\nYour spot at \"{}\" is confirmed.\n\nWhen: {}\nWhere: {}\n\nSee you there!\n",
                to.name,
                event.title,
                when(event),
                event.location
            ),
        )
    }

    /// The registration awaits organizer approval.
    #[must_use]
    pub fn registration_pending(to: &User, event: &Event) -> EmailMessage {
        message(
            to,
            format!("Registration received: {}", event.title),
            format!(
                "Hi {},\n\nWe received your registration for \"{}\" ({}). \
                 The organizer reviews each request; you will get another email once it is confirmed.\n",
                to.name,
                event.title,
                when(event)
            ),
        )
    }

    /// The registration was cancelled.
    #[must_use]
    pub fn registration_cancelled(to: &User, event: &Event) -> EmailMessage {
        message(
            to,
            format!("Registration cancelled: {}", event.title),
            format!(
                "Hi {},\n\nYour registration for \"{}\" ({}) has been cancelled.\n",
                to.name,
                event.title,
                when(event)
            ),
        )
    }

    /// The event itself was called off.
    #[must_use]
    pub fn event_cancelled(to: &User, event: &Event) -> EmailMessage {
        message(
            to,
            format!("Event cancelled: {}", event.title),
            format!(
                "Hi {},\n\nUnfortunately \"{}\", planned for {} at {}, has been cancelled by the organizer.\n",
                to.name,
                event.title,
                when(event),
                event.location
            ),
        )
    }
}
