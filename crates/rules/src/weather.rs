//! Weather lookup boundary.
//!
//! The detector only needs `get_weather(airport_code)`. Real providers live
//! outside this crate; [`StaticWeather`] serves a fixed table and
//! [`FallbackWeather`] chains a primary source with a fallback used when
//! the primary fails.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone)]
pub enum WeatherError {
    #[error("weather provider unavailable: {0}")]
    Unavailable(String),
}

/// Conditions at one airport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Knots.
    pub wind_speed: f64,
    /// Statute miles.
    pub visibility: f64,
    /// Cloud ceiling in feet.
    pub ceiling: f64,
    /// Millimetres per hour.
    pub precipitation: f64,
    /// 0 (none) to 10 (severe).
    pub turbulence: f64,
    /// Percent.
    pub humidity: f64,
    /// Hectopascals.
    pub pressure: f64,
    pub conditions: String,
}

impl WeatherReport {
    /// A report with only the fields the detector checks set.
    pub fn basic(visibility: f64, ceiling: f64, wind_speed: f64) -> Self {
        Self {
            temperature: 15.0,
            wind_speed,
            visibility,
            ceiling,
            precipitation: 0.0,
            turbulence: 0.0,
            humidity: 50.0,
            pressure: 1013.0,
            conditions: "clear".to_string(),
        }
    }
}

#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current conditions, `Ok(None)` when the source has nothing for the airport.
    async fn get_weather(&self, airport: &str) -> Result<Option<WeatherReport>, WeatherError>;

    fn source_name(&self) -> &str;
}

/// Fixed per-airport table.
#[derive(Debug, Clone, Default)]
pub struct StaticWeather {
    reports: HashMap<String, WeatherReport>,
}

impl StaticWeather {
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo table: KTEB clear, KLAX fogged in, KJFK gusty.
    pub fn demo() -> Self {
        Self::new()
            .with("KTEB", WeatherReport::basic(10.0, 2500.0, 15.0))
            .with("KLAX", WeatherReport::basic(0.5, 200.0, 8.0))
            .with("KJFK", WeatherReport::basic(8.0, 1500.0, 22.0))
    }

    pub fn with(mut self, airport: impl Into<String>, report: WeatherReport) -> Self {
        self.reports.insert(airport.into(), report);
        self
    }

    pub fn set(&mut self, airport: impl Into<String>, report: WeatherReport) {
        self.reports.insert(airport.into(), report);
    }
}

#[async_trait]
impl WeatherSource for StaticWeather {
    async fn get_weather(&self, airport: &str) -> Result<Option<WeatherReport>, WeatherError> {
        Ok(self.reports.get(airport).cloned())
    }

    fn source_name(&self) -> &str {
        "static"
    }
}

/// Try `primary`; on error, log and ask `fallback`.
pub struct FallbackWeather {
    primary: Arc<dyn WeatherSource>,
    fallback: Arc<dyn WeatherSource>,
}

impl FallbackWeather {
    pub fn new(primary: Arc<dyn WeatherSource>, fallback: Arc<dyn WeatherSource>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl WeatherSource for FallbackWeather {
    async fn get_weather(&self, airport: &str) -> Result<Option<WeatherReport>, WeatherError> {
        match self.primary.get_weather(airport).await {
            Ok(report) => Ok(report),
            Err(e) => {
                warn!(
                    airport,
                    primary = self.primary.source_name(),
                    fallback = self.fallback.source_name(),
                    error = %e,
                    "weather lookup failed, using fallback"
                );
                self.fallback.get_weather(airport).await
            }
        }
    }

    fn source_name(&self) -> &str {
        "fallback"
    }
}
