//! Service configuration

use anyhow::{Context, Result};
use detector_lib::anomaly::{
    DetectorConfig, DEFAULT_BASELINE_DAYS, DEFAULT_DROP_THRESHOLD, DEFAULT_EVENT_NAME,
    DEFAULT_SPIKE_THRESHOLD,
};
use detector_lib::source::DEFAULT_LOOKBACK_DAYS;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration, read from `ANOMALY_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Trailing window averaged into the baseline
    #[serde(default = "default_baseline_days")]
    pub baseline_days: usize,

    /// Minimum ratio flagged as a spike
    #[serde(default = "default_spike_ratio")]
    pub spike_ratio: f64,

    /// Maximum ratio flagged as a drop
    #[serde(default = "default_drop_ratio")]
    pub drop_ratio: f64,

    /// Days fetched per pass
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Event whose daily count is monitored
    #[serde(default = "default_event_name")]
    pub event_name: String,

    /// Observation file read by each pass
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,

    /// JSON-lines file anomalies are appended to
    #[serde(default = "default_sink_path")]
    pub sink_path: PathBuf,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Seconds between detection passes
    #[serde(default = "default_run_interval")]
    pub run_interval_secs: u64,
}

fn default_baseline_days() -> usize {
    DEFAULT_BASELINE_DAYS
}

fn default_spike_ratio() -> f64 {
    DEFAULT_SPIKE_THRESHOLD
}

fn default_drop_ratio() -> f64 {
    DEFAULT_DROP_THRESHOLD
}

fn default_lookback_days() -> u32 {
    DEFAULT_LOOKBACK_DAYS
}

fn default_event_name() -> String {
    DEFAULT_EVENT_NAME.to_string()
}

fn default_source_path() -> PathBuf {
    PathBuf::from("observations.json")
}

fn default_sink_path() -> PathBuf {
    PathBuf::from("anomalies.jsonl")
}

fn default_api_port() -> u16 {
    8080
}

fn default_run_interval() -> u64 {
    3600
}

impl ServiceConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        Self::from_source(config::Environment::with_prefix("ANOMALY").try_parsing(true))
    }

    /// Load from any `config` source; used by tests to avoid touching the environment
    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let loaded: Self = config::Config::builder()
            .add_source(source)
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid ANOMALY_* configuration")?;

        loaded
            .detector_config()
            .validate()
            .context("Invalid detector configuration")?;

        Ok(loaded)
    }

    /// Detector settings derived from this configuration
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig::for_event(self.event_name.clone())
            .with_baseline_days(self.baseline_days)
            .with_thresholds(self.spike_ratio, self.drop_ratio)
    }

    pub fn run_interval(&self) -> Duration {
        Duration::from_secs(self.run_interval_secs)
    }
}
