//! Anomaly detection for daily per-tenant event counts
//!
//! This module provides:
//! - Trailing-baseline spike/drop detection
//! - Severity bucketing of flagged ratios
//! - Ranking of anomalies for reporting

mod baseline_detector;
mod config;
mod ranking;
mod severity;

pub use baseline_detector::{detect, BaselineDetector};
pub use config::{
    daily_count_metric, ConfigError, DetectorConfig, DEFAULT_BASELINE_DAYS, DEFAULT_DROP_THRESHOLD,
    DEFAULT_EVENT_NAME, DEFAULT_SPIKE_THRESHOLD,
};
pub use ranking::{rank_anomalies, top_for_day, DEFAULT_TOP_LIMIT};
pub use severity::severity_from_ratio;
