//! Static reference tables consulted by the rules: airport curfews, the
//! available-aircraft pool, and airport allowlists.
//!
//! Loaded from a TOML document; [`ReferenceData::default`] carries the
//! tables the operations team started with.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Daily curfew window in whole local hours.
///
/// `start_hour == end_hour` means no curfew. When `start_hour > end_hour`
/// the window wraps midnight and covers hours `>= start_hour` or
/// `<= end_hour`. Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurfewWindow {
    pub start_hour: u32,
    pub end_hour: u32,
    /// Offset of airport local time from UTC.
    #[serde(default)]
    pub utc_offset_hours: i32,
}

impl CurfewWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
            utc_offset_hours: 0,
        }
    }

    pub fn is_open_all_day(&self) -> bool {
        self.start_hour == self.end_hour
    }

    /// Whether a local hour of day falls inside the curfew.
    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.is_open_all_day() {
            return false;
        }
        if self.start_hour > self.end_hour {
            hour >= self.start_hour || hour <= self.end_hour
        } else {
            hour >= self.start_hour && hour <= self.end_hour
        }
    }

    /// Whether the instant `at` falls inside the curfew in airport local time.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        let local = at + Duration::hours(i64::from(self.utc_offset_hours));
        self.contains_hour(local.hour())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    /// Airport ICAO code → curfew window.
    pub curfews: BTreeMap<String, CurfewWindow>,
    /// Aircraft currently available as replacements.
    pub available_aircraft: Vec<String>,
    /// Airports acceptable as a fallback destination.
    pub suitable_airports: Vec<String>,
    /// Ordered alternates proposed by backup suggestions.
    pub alternate_airports: Vec<String>,
}

impl Default for ReferenceData {
    fn default() -> Self {
        let curfews = BTreeMap::from([
            ("KTEB".to_string(), CurfewWindow::new(23, 6)),
            ("KJFK".to_string(), CurfewWindow::new(0, 0)),
            ("KLAX".to_string(), CurfewWindow::new(23, 6)),
        ]);
        Self {
            curfews,
            available_aircraft: to_strings(&["N550BA", "N550BB", "N550BC"]),
            suitable_airports: to_strings(&["KTEB", "KJFK", "KLAX", "KSFO", "KORD", "KMIA"]),
            alternate_airports: to_strings(&["KTEB", "KJFK", "KLAX", "KSFO"]),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ReferenceData {
    pub fn from_toml_str(s: &str) -> Result<Self, CoreError> {
        toml::from_str(s).map_err(|e| CoreError::Config(format!("invalid reference data: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn curfew(&self, airport: &str) -> Option<&CurfewWindow> {
        self.curfews.get(airport)
    }

    pub fn is_aircraft_available(&self, aircraft_id: &str) -> bool {
        self.available_aircraft.iter().any(|a| a == aircraft_id)
    }

    pub fn is_airport_suitable(&self, airport: &str) -> bool {
        self.suitable_airports.iter().any(|a| a == airport)
    }
}
