//! Sinks receiving detected anomalies

use crate::models::Anomaly;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;

/// Trait for anomaly storage
#[async_trait]
pub trait AnomalySink: Send + Sync {
    /// Store a batch of anomalies. An empty batch must be a no-op.
    async fn write(&self, anomalies: &[Anomaly]) -> Result<()>;
}

/// Keeps written anomalies in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    stored: Arc<RwLock<Vec<Anomaly>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far
    pub async fn anomalies(&self) -> Vec<Anomaly> {
        self.stored.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.stored.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.stored.read().await.is_empty()
    }
}

#[async_trait]
impl AnomalySink for MemorySink {
    async fn write(&self, anomalies: &[Anomaly]) -> Result<()> {
        if anomalies.is_empty() {
            return Ok(());
        }
        self.stored.write().await.extend_from_slice(anomalies);
        Ok(())
    }
}

/// Appends anomalies to a JSON-lines file
#[derive(Debug, Clone)]
pub struct JsonLinesSink {
    path: PathBuf,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AnomalySink for JsonLinesSink {
    async fn write(&self, anomalies: &[Anomaly]) -> Result<()> {
        if anomalies.is_empty() {
            return Ok(());
        }

        let mut buffer = Vec::with_capacity(anomalies.len() * 256);
        for anomaly in anomalies {
            serde_json::to_writer(&mut buffer, anomaly).context("Failed to serialize anomaly")?;
            buffer.push(b'\n');
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("Failed to open anomaly sink {}", self.path.display()))?;

        file.write_all(&buffer)
            .await
            .with_context(|| format!("Failed to write anomalies to {}", self.path.display()))?;
        file.flush().await?;

        debug!(path = %self.path.display(), count = anomalies.len(), "Wrote anomalies");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Severity};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample(tenant: &str) -> Anomaly {
        let mut details = BTreeMap::new();
        details.insert("event_name".to_string(), serde_json::json!("order.completed"));
        Anomaly {
            tenant_id: tenant.to_string(),
            day: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            metric: "events.order.completed.daily_count".to_string(),
            value: 50,
            baseline: 10.0,
            ratio: 5.0,
            direction: Direction::Spike,
            severity: Severity::High,
            details,
        }
    }

    #[tokio::test]
    async fn test_memory_sink_accumulates() {
        let sink = MemorySink::new();
        sink.write(&[sample("t1")]).await.unwrap();
        sink.write(&[]).await.unwrap();
        sink.write(&[sample("t2"), sample("t3")]).await.unwrap();

        assert_eq!(sink.len().await, 3);
        assert_eq!(sink.anomalies().await[2].tenant_id, "t3");
    }

    #[tokio::test]
    async fn test_json_lines_sink_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("anomalies.jsonl");
        let sink = JsonLinesSink::new(&path);

        sink.write(&[sample("t1")]).await.unwrap();
        sink.write(&[sample("t2")]).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["tenant_id"], "t1");
        assert_eq!(first["direction"], "spike");
        assert_eq!(first["severity"], "high");
        assert_eq!(first["day"], "2024-03-04");
        assert_eq!(first["details"]["event_name"], "order.completed");

        let second: Anomaly = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second, sample("t2"));
    }

    #[tokio::test]
    async fn test_json_lines_sink_skips_empty_batch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("anomalies.jsonl");
        let sink = JsonLinesSink::new(&path);

        sink.write(&[]).await.unwrap();
        assert!(!path.exists());
    }
}
