//! Trailing-baseline spike/drop detection
//!
//! Each tenant's series is sorted by day, and every point with at least
//! `baseline_days` predecessors is compared against the mean of exactly
//! those predecessors.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::{ConfigError, DetectorConfig};
use crate::models::{Anomaly, Direction, Observation, Severity};

/// Detail key carrying the metric identity
const EVENT_NAME_DETAIL: &str = "event_name";

/// Detects daily spikes and drops against a trailing mean
#[derive(Debug, Clone)]
pub struct BaselineDetector {
    config: DetectorConfig,
}

impl BaselineDetector {
    /// Create a detector, rejecting unusable configuration up front
    pub fn new(config: DetectorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Detect anomalies across all tenants in `observations`
    ///
    /// Input order does not matter. Output is grouped by tenant in the order
    /// tenants first appear, and by day within a tenant.
    pub fn detect(&self, observations: &[Observation]) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();

        for (tenant_id, mut series) in group_by_tenant(observations) {
            // Stable: same-day duplicates keep input order
            series.sort_by_key(|obs| obs.day);
            let before = anomalies.len();
            self.detect_series(tenant_id, &series, &mut anomalies);
            debug!(
                tenant_id = %tenant_id,
                points = series.len(),
                flagged = anomalies.len() - before,
                "Evaluated tenant series"
            );
        }

        anomalies
    }

    /// Evaluate one tenant's chronologically sorted series
    fn detect_series(&self, tenant_id: &str, series: &[&Observation], out: &mut Vec<Anomaly>) {
        let window_len = self.config.baseline_days;

        for i in window_len..series.len() {
            let window = &series[i - window_len..i];
            let baseline = window.iter().map(|obs| obs.value as f64).sum::<f64>() / window_len as f64;

            // All-zero history would give an infinite ratio
            if baseline == 0.0 {
                continue;
            }

            let current = series[i];
            let ratio = current.value as f64 / baseline;

            let Some(direction) = self.classify(ratio) else {
                continue;
            };

            out.push(self.build_anomaly(tenant_id, current, baseline, ratio, direction));
        }
    }

    /// Spike is checked before drop, so degenerate thresholds favour spikes
    fn classify(&self, ratio: f64) -> Option<Direction> {
        if ratio >= self.config.spike_threshold {
            Some(Direction::Spike)
        } else if ratio <= self.config.drop_threshold {
            Some(Direction::Drop)
        } else {
            None
        }
    }

    fn build_anomaly(
        &self,
        tenant_id: &str,
        current: &Observation,
        baseline: f64,
        ratio: f64,
        direction: Direction,
    ) -> Anomaly {
        let mut details = BTreeMap::new();
        details.insert(
            EVENT_NAME_DETAIL.to_string(),
            serde_json::Value::String(self.config.event_label().to_string()),
        );

        Anomaly {
            tenant_id: tenant_id.to_string(),
            day: current.day,
            metric: self.config.metric_name.clone(),
            value: current.value,
            baseline,
            ratio,
            direction,
            severity: Severity::from_ratio(ratio, direction),
            details,
        }
    }
}

/// Run a single detection pass with `config`
pub fn detect(
    observations: &[Observation],
    config: &DetectorConfig,
) -> Result<Vec<Anomaly>, ConfigError> {
    let detector = BaselineDetector::new(config.clone())?;
    Ok(detector.detect(observations))
}

/// Group by tenant, keeping tenants in first-seen order
fn group_by_tenant(observations: &[Observation]) -> Vec<(&str, Vec<&Observation>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(&str, Vec<&Observation>)> = Vec::new();

    for obs in observations {
        let slot = *index.entry(obs.tenant_id.as_str()).or_insert_with(|| {
            groups.push((obs.tenant_id.as_str(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(obs);
    }

    groups
}
