//! Anomaly Service - scheduled daily-count anomaly detection
//!
//! Runs a detection pass over the configured observation source on a fixed
//! interval, appends anomalies to the sink file, and serves health and
//! Prometheus endpoints.

use anomaly_service::{api, config::ServiceConfig};
use anyhow::Result;
use detector_lib::{
    health::HealthRegistry,
    observability::{DetectorMetrics, StructuredLogger},
    pipeline::DetectionPipeline,
    sink::JsonLinesSink,
    source::JsonFileSource,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVICE_NAME: &str = "anomaly-service";
const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting anomaly-service");

    let config = ServiceConfig::load()?;
    let detector_config = config.detector_config();
    info!(
        source = %config.source_path.display(),
        sink = %config.sink_path.display(),
        lookback_days = config.lookback_days,
        "Service configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register_pipeline().await;

    let metrics = DetectorMetrics::new();
    metrics.set_config(&detector_config);

    let logger = StructuredLogger::new(SERVICE_NAME);
    logger.log_startup(SERVICE_VERSION, &detector_config);

    let pipeline = Arc::new(
        DetectionPipeline::builder()
            .source(Arc::new(JsonFileSource::new(&config.source_path)))
            .sink(Arc::new(JsonLinesSink::new(&config.sink_path)))
            .detector_config(detector_config)
            .lookback_days(config.lookback_days)
            .run_interval(config.run_interval())
            .health(health_registry.clone())
            .logger(logger.clone())
            .build()?,
    );

    let app_state = Arc::new(api::AppState::new(health_registry, metrics));
    let api_port = config.api_port;
    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, app_state).await {
            error!(error = %e, "API server exited");
        }
    });

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let scheduler_handle = tokio::spawn(pipeline.run(shutdown_rx));

    tokio::signal::ctrl_c().await?;
    logger.log_shutdown("SIGINT received");

    let _ = shutdown_tx.send(());
    scheduler_handle.await?;
    api_handle.abort();

    info!("Shutdown complete");
    Ok(())
}
