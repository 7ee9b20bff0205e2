//! Disruption monitor: the orchestrator over the charterops rules.
//!
//! [`DisruptionMonitor`] owns two periodic tasks, the fast detector loop
//! and the slower comprehensive sweep, and serves the read APIs
//! (`status`, `summary`, `flight_details`) the operations boundary needs.

pub mod monitor;
pub mod summary;

pub use monitor::{DisruptionMonitor, MonitorError};
pub use summary::{CheckReport, FlightDetails, FlightSummary, MonitorStatus, SweepReport};
