//! Metric sources feeding the detector
//!
//! A source returns the daily counts of one event for every tenant over a
//! trailing lookback window ending at `as_of`.

use crate::models::Observation;
use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use async_trait::async_trait;

/// Default number of days fetched before `as_of`
pub const DEFAULT_LOOKBACK_DAYS: u32 = 14;

/// What a pass asks the source for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricQuery {
    /// Event whose daily count is requested
    pub event_name: String,
    /// Last day of the window (inclusive)
    pub as_of: NaiveDate,
    /// Days before `as_of` included in the window
    pub lookback_days: u32,
}

impl MetricQuery {
    pub fn new(event_name: impl Into<String>, as_of: NaiveDate, lookback_days: u32) -> Self {
        Self {
            event_name: event_name.into(),
            as_of,
            lookback_days,
        }
    }

    /// First day of the window (inclusive)
    pub fn window_start(&self) -> NaiveDate {
        self.as_of
            .checked_sub_days(Days::new(self.lookback_days as u64))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Whether `day` falls inside the window
    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.window_start() && day <= self.as_of
    }
}

/// Trait for observation providers
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Fetch observations for the query window
    async fn fetch(&self, query: &MetricQuery) -> Result<Vec<Observation>>;
}

/// In-memory source, filtered by the query window only
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    observations: Vec<Observation>,
}

impl StaticSource {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }
}

#[async_trait]
impl MetricSource for StaticSource {
    async fn fetch(&self, query: &MetricQuery) -> Result<Vec<Observation>> {
        Ok(self
            .observations
            .iter()
            .filter(|obs| query.contains(obs.day))
            .cloned()
            .collect())
    }
}

/// On-disk record; `event` is optional for single-event files
#[derive(Debug, Deserialize)]
struct ObservationRecord {
    #[serde(default)]
    event: Option<String>,
    #[serde(flatten)]
    observation: Observation,
}

/// Reads observations from a JSON array or JSON-lines file
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record of `event_name`, ignoring the query window.
    /// Records without an `event` field belong to every event.
    pub async fn read_event(&self, event_name: &str) -> Result<Vec<Observation>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read observations from {}", self.path.display()))?;

        let records = parse_records(&content)
            .with_context(|| format!("Failed to parse observations in {}", self.path.display()))?;

        Ok(records
            .into_iter()
            .filter(|r| r.event.as_deref().map_or(true, |e| e == event_name))
            .map(|r| r.observation)
            .collect())
    }
}

#[async_trait]
impl MetricSource for JsonFileSource {
    async fn fetch(&self, query: &MetricQuery) -> Result<Vec<Observation>> {
        let mut observations = self.read_event(&query.event_name).await?;
        let matching = observations.len();
        observations.retain(|obs| query.contains(obs.day));

        debug!(
            path = %self.path.display(),
            event = %query.event_name,
            matching_event = matching,
            in_window = observations.len(),
            "Loaded observations"
        );

        Ok(observations)
    }
}

/// Parse observation records from a file's contents
pub fn parse_observations(content: &str) -> Result<Vec<Observation>> {
    Ok(parse_records(content)?
        .into_iter()
        .map(|r| r.observation)
        .collect())
}

fn parse_records(content: &str) -> Result<Vec<ObservationRecord>> {
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).context("Invalid JSON array of observations");
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid observation on line {}", n + 1))
        })
        .collect()
}
