//! Domain model shared by every charterops crate.
//!
//! Records mirror the rows of the external data store (flights, crew,
//! duty records, alerts, backup plans). Mutation rules live in
//! `charterops-rules`; this crate only defines shapes, ids, and the
//! static reference tables the rules consult.

pub mod alert;
pub mod backup;
pub mod config;
pub mod crew;
pub mod error;
pub mod flight;
pub mod reference;

pub use alert::*;
pub use backup::*;
pub use config::Config;
pub use crew::*;
pub use error::*;
pub use flight::*;
pub use reference::{CurfewWindow, ReferenceData};
