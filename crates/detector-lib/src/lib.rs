//! Multi-tenant daily-count anomaly detection
//!
//! This crate provides the core functionality for:
//! - Trailing-baseline spike/drop detection per tenant
//! - Metric source and anomaly sink collaborators
//! - The batch fetch/detect/store pipeline
//! - Health checks and observability

pub mod anomaly;
pub mod health;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod sink;
pub mod source;

pub use anomaly::{detect, BaselineDetector, ConfigError, DetectorConfig};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{DetectorMetrics, StructuredLogger};
pub use pipeline::{DetectionPipeline, DetectionPipelineBuilder, PipelineConfig, RunReport};
pub use sink::{AnomalySink, JsonLinesSink, MemorySink};
pub use source::{JsonFileSource, MetricQuery, MetricSource, StaticSource};
