//! Batch detection pipeline
//!
//! One pass fetches the lookback window from the metric source, runs the
//! detector over it and hands the anomalies to the sink. The pipeline can
//! also run passes on a fixed interval until shutdown.

use crate::anomaly::{BaselineDetector, DetectorConfig};
use crate::health::{components, HealthRegistry};
use crate::models::Anomaly;
use crate::observability::{DetectorMetrics, StructuredLogger};
use crate::sink::AnomalySink;
use crate::source::{MetricQuery, MetricSource, DEFAULT_LOOKBACK_DAYS};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Default time between passes (1 hour)
pub const DEFAULT_RUN_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Configuration for the pipeline around the detector
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Days before `as_of` requested from the source
    pub lookback_days: u32,
    /// Time between scheduled passes
    pub run_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            run_interval: DEFAULT_RUN_INTERVAL,
        }
    }
}

/// Outcome of a single pass
#[derive(Debug, Clone)]
pub struct RunReport {
    pub as_of: NaiveDate,
    pub observations: usize,
    pub tenants: usize,
    pub anomalies: Vec<Anomaly>,
    pub duration: Duration,
}

/// Fetch, detect and store, with health and metrics bookkeeping
pub struct DetectionPipeline {
    source: Arc<dyn MetricSource>,
    sink: Arc<dyn AnomalySink>,
    detector: BaselineDetector,
    config: PipelineConfig,
    health: HealthRegistry,
    metrics: DetectorMetrics,
    logger: StructuredLogger,
}

impl DetectionPipeline {
    pub fn builder() -> DetectionPipelineBuilder {
        DetectionPipelineBuilder::new()
    }

    pub fn detector(&self) -> &BaselineDetector {
        &self.detector
    }

    pub fn health(&self) -> &HealthRegistry {
        &self.health
    }

    /// Run one pass for the window ending at `as_of`
    pub async fn run_once(&self, as_of: NaiveDate) -> Result<RunReport> {
        let start = Instant::now();
        let detector_config = self.detector.config();
        let metric = detector_config.metric_name.as_str();
        let query = MetricQuery::new(detector_config.event_label(), as_of, self.config.lookback_days);

        let observations = match self.source.fetch(&query).await {
            Ok(observations) => {
                self.health.set_healthy(components::SOURCE).await;
                observations
            }
            Err(e) => {
                self.metrics.inc_source_errors();
                self.logger.log_source_failure(metric, &e);
                self.health
                    .set_unhealthy(components::SOURCE, format!("{:#}", e))
                    .await;
                return Err(e).context("Metric source fetch failed");
            }
        };

        let anomalies = self.detector.detect(&observations);
        self.health.set_healthy(components::DETECTOR).await;

        if let Err(e) = self.sink.write(&anomalies).await {
            self.metrics.inc_sink_errors();
            self.logger.log_sink_failure(metric, anomalies.len(), &e);
            self.health
                .set_unhealthy(components::SINK, format!("{:#}", e))
                .await;
            return Err(e).context("Anomaly sink write failed");
        }
        self.health.set_healthy(components::SINK).await;

        let tenants = observations
            .iter()
            .map(|obs| obs.tenant_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let duration = start.elapsed();

        for anomaly in &anomalies {
            self.logger.log_anomaly(anomaly);
        }
        self.metrics.record_anomalies(&anomalies);
        self.metrics
            .observe_run(duration.as_secs_f64(), observations.len(), tenants);
        self.logger.log_run_completed(
            metric,
            as_of,
            observations.len(),
            tenants,
            anomalies.len(),
            duration.as_millis() as u64,
        );

        Ok(RunReport {
            as_of,
            observations: observations.len(),
            tenants,
            anomalies,
            duration,
        })
    }

    /// Run a pass on every tick until shutdown; failed passes are retried
    /// on the next tick
    pub async fn run(self: Arc<Self>, mut shutdown: broadcast::Receiver<()>) {
        info!(
            interval_secs = self.config.run_interval.as_secs(),
            lookback_days = self.config.lookback_days,
            "Starting detection scheduler"
        );

        let mut ticker = interval(self.config.run_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let as_of = chrono::Utc::now().date_naive();
                    match self.run_once(as_of).await {
                        Ok(_) => self.health.set_ready(true).await,
                        Err(e) => warn!(as_of = %as_of, error = %format!("{:#}", e), "Detection pass failed"),
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down detection scheduler");
                    break;
                }
            }
        }
    }
}

/// Builder for [`DetectionPipeline`]
pub struct DetectionPipelineBuilder {
    source: Option<Arc<dyn MetricSource>>,
    sink: Option<Arc<dyn AnomalySink>>,
    detector_config: DetectorConfig,
    config: PipelineConfig,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
}

impl DetectionPipelineBuilder {
    pub fn new() -> Self {
        Self {
            source: None,
            sink: None,
            detector_config: DetectorConfig::default(),
            config: PipelineConfig::default(),
            health: None,
            logger: None,
        }
    }

    pub fn source(mut self, source: Arc<dyn MetricSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn AnomalySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn detector_config(mut self, config: DetectorConfig) -> Self {
        self.detector_config = config;
        self
    }

    pub fn lookback_days(mut self, days: u32) -> Self {
        self.config.lookback_days = days;
        self
    }

    pub fn run_interval(mut self, interval: Duration) -> Self {
        self.config.run_interval = interval;
        self
    }

    /// Share an existing registry, e.g. with the HTTP API
    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Build the pipeline; invalid detector configuration fails here
    pub fn build(self) -> Result<DetectionPipeline> {
        let source = self
            .source
            .ok_or_else(|| anyhow::anyhow!("Metric source is required"))?;
        let sink = self
            .sink
            .ok_or_else(|| anyhow::anyhow!("Anomaly sink is required"))?;
        if self.config.run_interval.is_zero() {
            anyhow::bail!("Run interval must be greater than zero");
        }
        let detector =
            BaselineDetector::new(self.detector_config).context("Invalid detector configuration")?;

        Ok(DetectionPipeline {
            source,
            sink,
            detector,
            config: self.config,
            health: self.health.unwrap_or_default(),
            metrics: DetectorMetrics::new(),
            logger: self
                .logger
                .unwrap_or_else(|| StructuredLogger::new("anomaly-detector")),
        })
    }
}

impl Default for DetectionPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
