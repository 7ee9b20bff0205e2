//! [`Ticker`]: owns the background loop for one [`PeriodicTask`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// A unit of work the ticker runs on every period.
#[async_trait]
pub trait PeriodicTask: Send + Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Run one evaluation. Failures are the task's to log.
    async fn tick(&self);
}

struct Running {
    stop: Arc<Notify>,
    // Never aborted: an in-flight tick runs to completion.
    _handle: JoinHandle<()>,
}

/// Shortest accepted period; `tokio::time::interval` rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

pub struct Ticker {
    task: Arc<dyn PeriodicTask>,
    period: Duration,
    running: Mutex<Option<Running>>,
    ticks: Arc<AtomicU64>,
    last_tick: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl Ticker {
    pub fn new(task: Arc<dyn PeriodicTask>, period: Duration) -> Self {
        Self {
            task,
            period: period.max(MIN_PERIOD),
            running: Mutex::new(None),
            ticks: Arc::new(AtomicU64::new(0)),
            last_tick: Arc::new(Mutex::new(None)),
        }
    }

    pub fn name(&self) -> &str {
        self.task.name()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Number of completed ticks, scheduled or manual.
    pub fn tick_count(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Completion time of the latest tick.
    pub fn last_tick(&self) -> Option<DateTime<Utc>> {
        *self.last_tick.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Spawn the loop. The first tick fires immediately. Returns `false`
    /// if the ticker was already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return false;
        }

        let stop = Arc::new(Notify::new());
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.task),
            self.period,
            Arc::clone(&stop),
            Arc::clone(&self.ticks),
            Arc::clone(&self.last_tick),
        ));
        *running = Some(Running {
            stop,
            _handle: handle,
        });
        info!(
            task = self.task.name(),
            period_secs = self.period.as_secs_f64(),
            "ticker started"
        );
        true
    }

    /// Prevent further ticks. Returns `false` if the ticker was not running.
    pub fn stop(&self) -> bool {
        let taken = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match taken {
            Some(running) => {
                // notify_one stores a permit, so a loop busy in a tick sees it next iteration.
                running.stop.notify_one();
                info!(task = self.task.name(), "ticker stopped");
                true
            }
            None => false,
        }
    }

    /// Run one tick inline, independent of the background loop.
    pub async fn tick_now(&self) {
        run_tick(self.task.as_ref(), &self.ticks, &self.last_tick).await;
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_tick(
    task: &dyn PeriodicTask,
    ticks: &AtomicU64,
    last_tick: &Mutex<Option<DateTime<Utc>>>,
) {
    debug!(task = task.name(), "tick");
    task.tick().await;
    ticks.fetch_add(1, Ordering::Relaxed);
    *last_tick.lock().unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
}

async fn run_loop(
    task: Arc<dyn PeriodicTask>,
    period: Duration,
    stop: Arc<Notify>,
    ticks: Arc<AtomicU64>,
    last_tick: Arc<Mutex<Option<DateTime<Utc>>>>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop.notified() => break,
            _ = interval.tick() => {
                run_tick(task.as_ref(), &ticks, &last_tick).await;
            }
        }
    }
    debug!(task = task.name(), "ticker loop exited");
}
