//! Detector configuration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default trailing window (days)
pub const DEFAULT_BASELINE_DAYS: usize = 7;

/// Default minimum ratio to flag a spike
pub const DEFAULT_SPIKE_THRESHOLD: f64 = 2.0;

/// Default maximum ratio to flag a drop
pub const DEFAULT_DROP_THRESHOLD: f64 = 0.5;

/// Default event whose daily count is monitored
pub const DEFAULT_EVENT_NAME: &str = "order.completed";

/// Configuration rejected before any computation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("baseline_days must be at least 1")]
    ZeroBaselineDays,
    #[error("metric_name must not be empty")]
    EmptyMetricName,
}

/// Configuration for [`super::BaselineDetector`]
///
/// `spike_threshold` and `drop_threshold` only gate whether a point is
/// flagged. They are expected to satisfy `drop < 1 < spike`, but other
/// values are accepted and simply change which points flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Number of preceding days averaged into the baseline
    pub baseline_days: usize,
    /// A ratio at or above this is a spike
    pub spike_threshold: f64,
    /// A ratio at or below this is a drop
    pub drop_threshold: f64,
    /// Label attached to every emitted anomaly
    pub metric_name: String,
    /// Event identity recorded in anomaly details, falls back to `metric_name`
    #[serde(default)]
    pub event_name: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::for_event(DEFAULT_EVENT_NAME)
    }
}

impl DetectorConfig {
    /// Configuration for the daily count of `event`, with default thresholds
    pub fn for_event(event: impl Into<String>) -> Self {
        let event = event.into();
        Self {
            baseline_days: DEFAULT_BASELINE_DAYS,
            spike_threshold: DEFAULT_SPIKE_THRESHOLD,
            drop_threshold: DEFAULT_DROP_THRESHOLD,
            metric_name: daily_count_metric(&event),
            event_name: Some(event),
        }
    }

    /// Set the trailing window size
    pub fn with_baseline_days(mut self, days: usize) -> Self {
        self.baseline_days = days;
        self
    }

    /// Set both flagging thresholds
    pub fn with_thresholds(mut self, spike: f64, drop: f64) -> Self {
        self.spike_threshold = spike;
        self.drop_threshold = drop;
        self
    }

    /// Identity written into anomaly details
    pub fn event_label(&self) -> &str {
        self.event_name.as_deref().unwrap_or(&self.metric_name)
    }

    /// Reject configurations the detector cannot index with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.baseline_days == 0 {
            return Err(ConfigError::ZeroBaselineDays);
        }
        if self.metric_name.trim().is_empty() {
            return Err(ConfigError::EmptyMetricName);
        }
        Ok(())
    }
}

/// Metric name for the daily count of an event
pub fn daily_count_metric(event: &str) -> String {
    format!("events.{}.daily_count", event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DetectorConfig::default();
        assert_eq!(config.baseline_days, 7);
        assert_eq!(config.spike_threshold, 2.0);
        assert_eq!(config.drop_threshold, 0.5);
        assert_eq!(config.metric_name, "events.order.completed.daily_count");
        assert_eq!(config.event_label(), "order.completed");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_baseline_days_rejected() {
        let config = DetectorConfig::default().with_baseline_days(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroBaselineDays));
    }

    #[test]
    fn test_empty_metric_name_rejected() {
        let config = DetectorConfig {
            metric_name: "  ".to_string(),
            ..DetectorConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyMetricName));
    }

    #[test]
    fn test_degenerate_thresholds_accepted() {
        let config = DetectorConfig::default().with_thresholds(0.5, 2.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_event_label_falls_back_to_metric() {
        let config = DetectorConfig {
            event_name: None,
            ..DetectorConfig::default()
        };
        assert_eq!(config.event_label(), "events.order.completed.daily_count");
    }
}
