//! [`PeriodicTask`] adapters driving the monitor's two loops.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use charterops_rules::PeriodicTask;

use super::MonitorCore;

pub(crate) struct DetectionTask {
    core: Arc<MonitorCore>,
}

impl DetectionTask {
    pub(crate) fn new(core: Arc<MonitorCore>) -> Self {
        Self { core }
    }
}

#[async_trait]
impl PeriodicTask for DetectionTask {
    fn name(&self) -> &str {
        "disruption-detector"
    }

    async fn tick(&self) {
        if let Err(e) = self.core.detect(Utc::now()).await {
            warn!(error = %e, "detection cycle failed");
        }
    }
}

pub(crate) struct SweepTask {
    core: Arc<MonitorCore>,
}

impl SweepTask {
    pub(crate) fn new(core: Arc<MonitorCore>) -> Self {
        Self { core }
    }
}

#[async_trait]
impl PeriodicTask for SweepTask {
    fn name(&self) -> &str {
        "comprehensive-sweep"
    }

    async fn tick(&self) {
        if let Err(e) = self.core.sweep(Utc::now()).await {
            warn!(error = %e, "comprehensive sweep failed");
        }
    }
}
