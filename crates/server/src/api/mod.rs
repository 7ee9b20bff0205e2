//! HTTP handlers, grouped by resource.

mod alerts;
mod crew;
mod flights;
mod monitor;

pub use alerts::{resolve_alert, submit_alert};
pub use crew::{compliance, end_rest, start_rest, update_duty};
pub use flights::{activate_backup, create_backup, flight_details, list_backups, suggest_backups};
pub use monitor::{check, health, start, status, stop, summary};
