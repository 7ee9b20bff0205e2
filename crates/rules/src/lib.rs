//! Disruption rules for charter operations.
//!
//! This crate provides:
//! - Crew duty/rest compliance tracking ([`duty`])
//! - Per-flight disruption detection with create-if-absent alerts ([`detector`])
//! - Backup plan suggestion, validation and activation ([`backup`])
//! - Severity aggregation for summaries ([`severity`])
//! - The weather lookup boundary ([`weather`])
//! - A cancellable periodic [`scheduler`]
//! - A per-flight [`audit_log`] of detection and activation decisions

pub mod audit_log;
pub mod backup;
pub mod detector;
pub mod duty;
pub mod scheduler;
pub mod severity;
pub mod weather;

pub use backup::{ActivationError, ActivationOutcome, BackupResolver, CandidateValidation};
pub use detector::{DetectionReport, DetectorError, DisruptionCheck, DisruptionDetector};
pub use duty::{ComplianceReport, DutyError, DutyState, DutyTracker, RestOutcome, Violation};
pub use scheduler::{PeriodicTask, Ticker};
pub use weather::{FallbackWeather, StaticWeather, WeatherError, WeatherReport, WeatherSource};
