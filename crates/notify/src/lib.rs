//! Alert notification delivery.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable notification channels
//! - Webhook notifier posting alert payloads as JSON
//! - Dispatcher that routes alerts to the channels configured per alert type

pub mod dispatcher;
pub mod traits;
pub mod webhook;

pub use dispatcher::Dispatcher;
pub use traits::{DispatchResult, Notification, Notifier, NotifyError};
pub use webhook::WebhookNotifier;
