//! In-memory per-flight audit trail for detection and activation.
//!
//! Stores per-flight entries capped at a configurable maximum (default 200)
//! with FIFO eviction. Uses `std::sync::RwLock` so it can be written from
//! async tasks without holding a guard across an `.await`.

use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use charterops_core::FlightId;

/// Severity level for audit entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Numeric severity for comparison (higher = more severe).
    pub fn as_severity(&self) -> u8 {
        match self {
            LogLevel::Debug => 0,
            LogLevel::Info => 1,
            LogLevel::Warning => 2,
            LogLevel::Error => 3,
        }
    }
}

/// Which operation produced the entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Detection,
    Dedup,
    Ingestion,
    Suggestion,
    Validation,
    Activation,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub flight_id: FlightId,
    pub level: LogLevel,
    pub phase: Phase,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Query parameters for filtering entries.
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    /// Minimum level (inclusive).
    pub level: Option<LogLevel>,
    pub phase: Option<Phase>,
    /// Maximum number of entries to return (default 100).
    pub limit: Option<u32>,
}

pub struct AuditLog {
    entries: RwLock<HashMap<FlightId, VecDeque<LogEntry>>>,
    max_entries_per_flight: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_max_entries(200)
    }

    pub fn with_max_entries(max: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries_per_flight: max,
        }
    }

    pub fn log(&self, flight_id: FlightId, level: LogLevel, phase: Phase, message: impl Into<String>) {
        self.log_with_details(flight_id, level, phase, message, None);
    }

    pub fn log_with_details(
        &self,
        flight_id: FlightId,
        level: LogLevel,
        phase: Phase,
        message: impl Into<String>,
        details: Option<serde_json::Value>,
    ) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            flight_id,
            level,
            phase,
            message: message.into(),
            details,
        };

        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let deque = guard.entry(flight_id).or_default();
        deque.push_back(entry);
        while deque.len() > self.max_entries_per_flight {
            deque.pop_front();
        }
    }

    /// Entries for a flight, newest first.
    pub fn query(&self, flight_id: FlightId, query: &LogQuery) -> Vec<LogEntry> {
        let guard = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let Some(deque) = guard.get(&flight_id) else {
            return Vec::new();
        };

        let min_severity = query.level.map(|l| l.as_severity()).unwrap_or(0);
        let limit = query.limit.unwrap_or(100) as usize;

        deque
            .iter()
            .rev()
            .filter(|e| e.level.as_severity() >= min_severity)
            .filter(|e| query.phase.map_or(true, |p| e.phase == p))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn clear(&self, flight_id: FlightId) {
        let mut guard = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        guard.remove(&flight_id);
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}
