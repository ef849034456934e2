//! Business metrics for EventHub.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `eventhub_users_registered_total` - Accounts created
//! - `eventhub_logins_total{outcome}` - Login attempts (success, failure)
//! - `eventhub_events_created_total` - Events created
//! - `eventhub_event_transitions_total{status}` - Event status changes by target status
//! - `eventhub_registrations_total{status}` - Registration writes by resulting status
//! - `eventhub_capacity_rejections_total` - Registrations refused because the event was full
//!   (recorded by the `PostgreSQL` registration repository)
//! - `eventhub_emails_total{outcome}` - Notification deliveries (sent, failed)

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize and register all business metrics descriptions.
///
/// This should be called once at application startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "eventhub_users_registered_total",
        "Total number of user accounts created"
    );
    describe_counter!(
        "eventhub_logins_total",
        "Total number of login attempts by outcome (success, failure)"
    );
    describe_counter!(
        "eventhub_events_created_total",
        "Total number of events created"
    );
    describe_counter!(
        "eventhub_event_transitions_total",
        "Total number of event status changes by target status"
    );
    describe_counter!(
        "eventhub_registrations_total",
        "Total number of registration writes by resulting status"
    );
    describe_counter!(
        "eventhub_capacity_rejections_total",
        "Total number of registrations refused because the event was full"
    );
    describe_counter!(
        "eventhub_emails_total",
        "Total number of notification emails by outcome (sent, failed)"
    );

    tracing::info!("Business metrics registered");
}

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must run inside a Tokio runtime; the exporter spawns its HTTP listener there.
///
/// # Errors
///
/// Returns an error if a recorder is already installed or the listener cannot bind.
pub fn install_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {e}"))?;
    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}

// ============================================================================
// Metric Recording Functions
// ============================================================================

/// Record a new account.
pub fn record_user_registered() {
    metrics::counter!("eventhub_users_registered_total").increment(1);
}

/// Record a login attempt.
pub fn record_login(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!("eventhub_logins_total", "outcome" => outcome).increment(1);
}

/// Record an event created.
pub fn record_event_created() {
    metrics::counter!("eventhub_events_created_total").increment(1);
    tracing::debug!("Recorded event_created metric");
}

/// Record an event status change.
///
/// # Arguments
///
/// * `status` - Status the event moved to
pub fn record_event_transition(status: &'static str) {
    metrics::counter!("eventhub_event_transitions_total", "status" => status).increment(1);
}

/// Record a registration write.
///
/// # Arguments
///
/// * `status` - Status the registration ended up in
pub fn record_registration(status: &'static str) {
    metrics::counter!("eventhub_registrations_total", "status" => status).increment(1);
    tracing::debug!(status, "Recorded registration metric");
}

/// Record a notification delivery attempt.
///
/// # Arguments
///
/// * `sent` - Whether the mailer accepted the message
pub fn record_email(sent: bool) {
    let outcome = if sent { "sent" } else { "failed" };
    metrics::counter!("eventhub_emails_total", "outcome" => outcome).increment(1);
}
