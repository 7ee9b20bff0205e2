//! Routes alert notifications to configured channels.
//!
//! The dispatcher receives an alert and delivers it to all channels
//! configured for that alert type, falling back to the default channels.
//! Individual channel failures don't block other channels.

use std::collections::HashMap;

use charterops_core::{Alert, AlertKind, Flight};

use crate::traits::{DispatchResult, Notification, Notifier};

/// Dispatches notifications to multiple channels, organized per alert type.
pub struct Dispatcher {
    kind_channels: HashMap<AlertKind, Vec<Box<dyn Notifier>>>,
    /// Used when no type-specific channels exist.
    default_channels: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    pub fn new(kind_channels: HashMap<AlertKind, Vec<Box<dyn Notifier>>>) -> Self {
        Self {
            kind_channels,
            default_channels: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(HashMap::new())
    }

    /// Channels shared across all alert types.
    pub fn with_defaults(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self {
            kind_channels: HashMap::new(),
            default_channels: channels,
        }
    }

    pub fn set_kind_channels(&mut self, kind: AlertKind, channels: Vec<Box<dyn Notifier>>) {
        self.kind_channels.insert(kind, channels);
    }

    pub fn is_empty(&self) -> bool {
        self.default_channels.is_empty() && self.kind_channels.values().all(Vec::is_empty)
    }

    /// Render `alert` and deliver it to its channels.
    pub async fn notify_alert(&self, alert: &Alert, flight: Option<&Flight>) -> Vec<DispatchResult> {
        let notification = Notification::for_alert(alert, flight);
        self.dispatch(alert.kind, &notification).await
    }

    /// Deliver a notification to every channel for `kind`.
    ///
    /// Returns results for each channel delivery.
    pub async fn dispatch(&self, kind: AlertKind, notification: &Notification) -> Vec<DispatchResult> {
        let channels = self
            .kind_channels
            .get(&kind)
            .unwrap_or(&self.default_channels);

        if channels.is_empty() {
            tracing::debug!(kind = %kind, "no notification channels configured");
            return Vec::new();
        }

        let alert_id = notification
            .metadata
            .get("alert_id")
            .cloned()
            .unwrap_or_default();
        let mut results = Vec::with_capacity(channels.len());

        for channel in channels {
            let start = std::time::Instant::now();
            let result = channel.send(notification).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::info!(
                        kind = %kind,
                        channel = channel.channel_name(),
                        duration_ms,
                        "notification delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        kind = %kind,
                        channel = channel.channel_name(),
                        error = %e,
                        duration_ms,
                        "notification delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                channel: channel.channel_name().to_string(),
                alert_id: alert_id.clone(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }
}
