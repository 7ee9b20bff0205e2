use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::reference::ReferenceData;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub monitor: MonitorConfig,
    pub notify: NotifyConfig,
    pub reference: ReferenceConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CHARTEROPS_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("CHARTEROPS_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            monitor: MonitorConfig::from_env_profiled(p),
            notify: NotifyConfig::from_env_profiled(p),
            reference: ReferenceConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Load reference tables from the configured file, or the built-in defaults.
    pub fn reference_data(&self) -> Result<ReferenceData, CoreError> {
        match &self.reference.path {
            Some(path) => ReferenceData::from_file(path),
            None => Ok(ReferenceData::default()),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  monitor:     detector={}s, sweep={}s, duty_window={}h",
            self.monitor.detector_interval_secs,
            self.monitor.sweep_interval_secs,
            self.monitor.duty_window_hours
        );
        tracing::info!("  notify:      webhook={}", if self.notify.is_configured() { "configured" } else { "(none)" });
        tracing::info!(
            "  reference:   {}",
            self.reference.path.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "(built-in)".to_string())
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3001),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Monitor cadence ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Detector loop period (fast cadence).
    pub detector_interval_secs: u64,
    /// Comprehensive sweep period (slow cadence).
    pub sweep_interval_secs: u64,
    /// Trailing window for duty-hour accumulation.
    pub duty_window_hours: u64,
}

impl MonitorConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            detector_interval_secs: profiled_env_u64(p, "DETECTOR_INTERVAL_SECS", 30),
            sweep_interval_secs: profiled_env_u64(p, "SWEEP_INTERVAL_SECS", 60),
            duty_window_hours: profiled_env_u64(p, "DUTY_WINDOW_HOURS", 24),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            detector_interval_secs: 30,
            sweep_interval_secs: 60,
            duty_window_hours: 24,
        }
    }
}

// ── Alert notifications ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
}

impl NotifyConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            webhook_url: profiled_env_opt(p, "ALERT_WEBHOOK_URL"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }
}

// ── Reference data ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// TOML file with curfews and allowlists; built-in tables when unset.
    pub path: Option<PathBuf>,
}

impl ReferenceConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            path: profiled_env_opt(p, "REFERENCE_DATA").map(PathBuf::from),
        }
    }
}
