//! Notifier trait definition and shared error types.

use std::collections::HashMap;

use charterops_core::{Alert, Flight};

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint rejected notification ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    /// Alert identity and classification (alert_id, flight_id, type, ...).
    pub metadata: HashMap<String, String>,
}

impl Notification {
    /// Render an alert, with the flight's tail and route when known.
    pub fn for_alert(alert: &Alert, flight: Option<&Flight>) -> Self {
        let subject = match flight {
            Some(f) => format!("[{}] {} {}", alert.kind, f.tail_number, f.route()),
            None => format!("[{}] flight {}", alert.kind, alert.flight_id),
        };

        let mut metadata = HashMap::from([
            ("alert_id".to_string(), alert.id.to_string()),
            ("flight_id".to_string(), alert.flight_id.to_string()),
            ("type".to_string(), alert.kind.to_string()),
            ("triggered_at".to_string(), alert.triggered_at.to_rfc3339()),
        ]);
        if let Some(f) = flight {
            metadata.insert("tail_number".to_string(), f.tail_number.clone());
            metadata.insert("status".to_string(), f.status.to_string());
        }

        Self {
            subject,
            body: alert.message.clone(),
            metadata,
        }
    }
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "webhook").
    fn channel_name(&self) -> &str;
}

/// Result of dispatching a notification to a single channel.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DispatchResult {
    pub channel: String,
    pub alert_id: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
