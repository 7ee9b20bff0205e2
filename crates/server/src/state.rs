//! Shared application state, wired once at startup.

use std::sync::Arc;

use tracing::{info, warn};

use charterops_core::{Config, ReferenceData};
use charterops_monitor::DisruptionMonitor;
use charterops_notify::{Dispatcher, Notifier, WebhookNotifier};
use charterops_rules::audit_log::AuditLog;
use charterops_rules::{BackupResolver, DisruptionDetector, DutyTracker, WeatherSource};
use charterops_storage::Store;

pub struct AppState {
    pub monitor: Arc<DisruptionMonitor>,
    pub config: Config,
}

impl AppState {
    /// Build every component over `store` and `weather`.
    pub fn build(
        config: Config,
        store: Arc<dyn Store>,
        weather: Arc<dyn WeatherSource>,
        reference: ReferenceData,
    ) -> anyhow::Result<Self> {
        let reference = Arc::new(reference);
        let audit = Arc::new(AuditLog::new());
        let window = u32::try_from(config.monitor.duty_window_hours).unwrap_or(u32::MAX);

        let duty = Arc::new(DutyTracker::new(Arc::clone(&store)).with_window_hours(window));
        let detector = Arc::new(
            DisruptionDetector::new(Arc::clone(&store), weather, Arc::clone(&reference))
                .with_audit_log(Arc::clone(&audit)),
        );
        let backups = Arc::new(
            BackupResolver::new(Arc::clone(&store), Arc::clone(&duty), reference)
                .with_audit_log(audit),
        );

        let monitor = DisruptionMonitor::new(store, detector, duty, backups)
            .with_config(&config.monitor)
            .with_dispatcher(Arc::new(build_dispatcher(&config)?));

        Ok(Self {
            monitor: Arc::new(monitor),
            config,
        })
    }
}

fn build_dispatcher(config: &Config) -> anyhow::Result<Dispatcher> {
    let Some(url) = &config.notify.webhook_url else {
        info!("no alert webhook configured, notifications disabled");
        return Ok(Dispatcher::empty());
    };
    match WebhookNotifier::from_config(url.clone(), None, None) {
        Ok(webhook) => {
            info!(channel = webhook.channel_name(), "alert webhook configured");
            let channels: Vec<Box<dyn Notifier>> = vec![Box::new(webhook)];
            Ok(Dispatcher::with_defaults(channels))
        }
        Err(e) => {
            warn!(error = %e, "alert webhook misconfigured");
            Err(e.into())
        }
    }
}
