//! Observability infrastructure for the anomaly detector
//!
//! Provides:
//! - Prometheus metrics (pass latency, input size, anomalies by direction/severity, errors)
//! - Structured JSON logging with tracing

use crate::anomaly::DetectorConfig;
use crate::models::{Anomaly, Severity};
use chrono::NaiveDate;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    register_int_gauge, GaugeVec, Histogram, IntCounter, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{error, info, warn};

/// Histogram buckets for pass latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DetectorMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct DetectorMetricsInner {
    run_latency_seconds: Histogram,
    runs_total: IntCounter,
    observations_processed: IntGauge,
    tenants_evaluated: IntGauge,
    anomalies_detected: IntCounterVec,
    source_errors: IntCounter,
    sink_errors: IntCounter,
    last_success_timestamp: IntGauge,
    config_info: GaugeVec,
}

impl DetectorMetricsInner {
    fn new() -> Self {
        Self {
            run_latency_seconds: register_histogram!(
                "anomaly_detector_run_latency_seconds",
                "Time spent on one fetch/detect/write pass",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register run_latency_seconds"),

            runs_total: register_int_counter!(
                "anomaly_detector_runs_total",
                "Total number of completed detection passes"
            )
            .expect("Failed to register runs_total"),

            observations_processed: register_int_gauge!(
                "anomaly_detector_observations_processed",
                "Observations evaluated in the most recent pass"
            )
            .expect("Failed to register observations_processed"),

            tenants_evaluated: register_int_gauge!(
                "anomaly_detector_tenants_evaluated",
                "Distinct tenants evaluated in the most recent pass"
            )
            .expect("Failed to register tenants_evaluated"),

            anomalies_detected: register_int_counter_vec!(
                "anomaly_detector_anomalies_detected_total",
                "Total number of anomalies detected",
                &["direction", "severity"]
            )
            .expect("Failed to register anomalies_detected"),

            source_errors: register_int_counter!(
                "anomaly_detector_source_errors_total",
                "Total number of failed observation fetches"
            )
            .expect("Failed to register source_errors"),

            sink_errors: register_int_counter!(
                "anomaly_detector_sink_errors_total",
                "Total number of failed anomaly writes"
            )
            .expect("Failed to register sink_errors"),

            last_success_timestamp: register_int_gauge!(
                "anomaly_detector_last_success_timestamp_seconds",
                "Unix time of the last successful pass"
            )
            .expect("Failed to register last_success_timestamp"),

            config_info: register_gauge_vec!(
                "anomaly_detector_config_info",
                "Active detector configuration",
                &["metric", "baseline_days", "spike_threshold", "drop_threshold"]
            )
            .expect("Failed to register config_info"),
        }
    }
}

/// Detector metrics for Prometheus exposition
///
/// Lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct DetectorMetrics {
    _private: (),
}

impl Default for DetectorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DetectorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DetectorMetricsInner {
        GLOBAL_METRICS.get_or_init(DetectorMetricsInner::new)
    }

    /// Record a completed pass
    pub fn observe_run(&self, duration_secs: f64, observations: usize, tenants: usize) {
        let inner = self.inner();
        inner.run_latency_seconds.observe(duration_secs);
        inner.runs_total.inc();
        inner.observations_processed.set(observations as i64);
        inner.tenants_evaluated.set(tenants as i64);
        inner
            .last_success_timestamp
            .set(chrono::Utc::now().timestamp());
    }

    /// Count emitted anomalies by direction and severity
    pub fn record_anomalies(&self, anomalies: &[Anomaly]) {
        for anomaly in anomalies {
            let direction = anomaly.direction.to_string();
            let severity = anomaly.severity.to_string();
            self.inner()
                .anomalies_detected
                .with_label_values(&[direction.as_str(), severity.as_str()])
                .inc();
        }
    }

    pub fn inc_source_errors(&self) {
        self.inner().source_errors.inc();
    }

    pub fn inc_sink_errors(&self) {
        self.inner().sink_errors.inc();
    }

    /// Publish the active configuration as an info metric
    pub fn set_config(&self, config: &DetectorConfig) {
        let baseline_days = config.baseline_days.to_string();
        let spike = config.spike_threshold.to_string();
        let drop = config.drop_threshold.to_string();

        let info = &self.inner().config_info;
        // Only the active configuration is exported
        info.reset();
        info.with_label_values(&[
            config.metric_name.as_str(),
            baseline_days.as_str(),
            spike.as_str(),
            drop.as_str(),
        ])
        .set(1.0);
    }
}

/// Structured logger for detector events
///
/// Emits consistent JSON-friendly fields for passes, anomalies and
/// collaborator failures.
#[derive(Clone)]
pub struct StructuredLogger {
    service_name: String,
}

impl StructuredLogger {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    /// Log a single detected anomaly; high severity is logged at warn
    pub fn log_anomaly(&self, anomaly: &Anomaly) {
        match anomaly.severity {
            Severity::High => {
                warn!(
                    event = "anomaly_detected",
                    service = %self.service_name,
                    tenant_id = %anomaly.tenant_id,
                    day = %anomaly.day,
                    metric = %anomaly.metric,
                    value = anomaly.value,
                    baseline = anomaly.baseline,
                    ratio = anomaly.ratio,
                    direction = %anomaly.direction,
                    severity = %anomaly.severity,
                    "High severity anomaly detected"
                );
            }
            _ => {
                info!(
                    event = "anomaly_detected",
                    service = %self.service_name,
                    tenant_id = %anomaly.tenant_id,
                    day = %anomaly.day,
                    metric = %anomaly.metric,
                    value = anomaly.value,
                    baseline = anomaly.baseline,
                    ratio = anomaly.ratio,
                    direction = %anomaly.direction,
                    severity = %anomaly.severity,
                    "Anomaly detected"
                );
            }
        }
    }

    /// Log the outcome of a pass
    pub fn log_run_completed(
        &self,
        metric: &str,
        as_of: NaiveDate,
        observations: usize,
        tenants: usize,
        anomalies: usize,
        duration_ms: u64,
    ) {
        info!(
            event = "detection_run_completed",
            service = %self.service_name,
            metric = %metric,
            as_of = %as_of,
            observations = observations,
            tenants = tenants,
            anomalies = anomalies,
            duration_ms = duration_ms,
            "Detection pass completed"
        );
    }

    pub fn log_source_failure(&self, metric: &str, error: &anyhow::Error) {
        error!(
            event = "source_failed",
            service = %self.service_name,
            metric = %metric,
            error = %format!("{:#}", error),
            "Failed to fetch observations"
        );
    }

    pub fn log_sink_failure(&self, metric: &str, pending: usize, error: &anyhow::Error) {
        error!(
            event = "sink_failed",
            service = %self.service_name,
            metric = %metric,
            pending_anomalies = pending,
            error = %format!("{:#}", error),
            "Failed to write anomalies"
        );
    }

    /// Log service startup with the active detector configuration
    pub fn log_startup(&self, version: &str, config: &DetectorConfig) {
        info!(
            event = "service_started",
            service = %self.service_name,
            version = %version,
            metric = %config.metric_name,
            baseline_days = config.baseline_days,
            spike_threshold = config.spike_threshold,
            drop_threshold = config.drop_threshold,
            "Anomaly service started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service_name,
            reason = %reason,
            "Anomaly service shutting down"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Direction;
    use std::collections::BTreeMap;

    #[test]
    fn test_detector_metrics_recording() {
        // Metrics live in the global Prometheus registry and are registered once
        let metrics = DetectorMetrics::new();
        let other = metrics.clone();

        metrics.observe_run(0.05, 120, 4);
        other.inc_source_errors();
        other.inc_sink_errors();
        metrics.set_config(&DetectorConfig::default());
        metrics.record_anomalies(&[Anomaly {
            tenant_id: "t1".to_string(),
            day: NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
            metric: "events.order.completed.daily_count".to_string(),
            value: 50,
            baseline: 10.0,
            ratio: 5.0,
            direction: Direction::Spike,
            severity: Severity::High,
            details: BTreeMap::new(),
        }]);

        let families = prometheus::gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "anomaly_detector_anomalies_detected_total"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("anomaly-service");
        assert_eq!(logger.service_name, "anomaly-service");
    }
}
