//! Offline detection over a local observation file

use anyhow::{Context, Result};
use chrono::NaiveDate;
use colored::Colorize;
use detector_lib::{
    anomaly::{detect, top_for_day},
    sink::{AnomalySink, JsonLinesSink},
    source::JsonFileSource,
    Anomaly, DetectorConfig,
};
use std::collections::HashSet;
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{
    format_direction, format_ratio, format_severity, print_info, print_items, print_success,
    print_warning, OutputFormat,
};

/// Options for a detection run
#[derive(Debug, Clone)]
pub struct DetectOptions {
    pub input: PathBuf,
    pub config: DetectorConfig,
    pub tenant: Option<String>,
    pub day: Option<NaiveDate>,
    pub limit: usize,
    pub output: Option<PathBuf>,
}

/// Row for anomalies table
#[derive(Tabled)]
struct AnomalyRow {
    #[tabled(rename = "Tenant")]
    tenant: String,
    #[tabled(rename = "Day")]
    day: String,
    #[tabled(rename = "Value")]
    value: i64,
    #[tabled(rename = "Baseline")]
    baseline: String,
    #[tabled(rename = "Ratio")]
    ratio: String,
    #[tabled(rename = "Direction")]
    direction: String,
    #[tabled(rename = "Severity")]
    severity: String,
}

impl From<&Anomaly> for AnomalyRow {
    fn from(a: &Anomaly) -> Self {
        Self {
            tenant: a.tenant_id.clone(),
            day: a.day.to_string(),
            value: a.value,
            baseline: format!("{:.2}", a.baseline),
            ratio: format_ratio(a.ratio),
            direction: format_direction(a.direction),
            severity: format_severity(a.severity).to_string(),
        }
    }
}

/// Narrow to a tenant and/or day; a tenant-day pair is ranked and limited
pub fn select(
    anomalies: Vec<Anomaly>,
    tenant: Option<&str>,
    day: Option<NaiveDate>,
    limit: usize,
) -> Vec<Anomaly> {
    match (tenant, day) {
        (Some(tenant), Some(day)) => top_for_day(&anomalies, tenant, day, limit),
        _ => anomalies
            .into_iter()
            .filter(|a| tenant.map_or(true, |t| a.tenant_id == t))
            .filter(|a| day.map_or(true, |d| a.day == d))
            .collect(),
    }
}

/// Run detection over the input file and print the anomalies
pub async fn run_detect(options: DetectOptions, format: OutputFormat) -> Result<()> {
    let source = JsonFileSource::new(&options.input);
    let event = options.config.event_label().to_string();
    let observations = source.read_event(&event).await?;

    let anomalies =
        detect(&observations, &options.config).context("Invalid detector settings")?;
    let total = anomalies.len();
    let selected = select(
        anomalies,
        options.tenant.as_deref(),
        options.day,
        options.limit,
    );

    if let Some(output) = &options.output {
        JsonLinesSink::new(output).write(&selected).await?;
    }

    if let OutputFormat::Table = format {
        let tenants: HashSet<&str> = observations.iter().map(|o| o.tenant_id.as_str()).collect();
        println!("{}", "Anomaly Detection".bold());
        println!("{}", "=".repeat(60));
        print_info(&format!(
            "{} observations across {} tenants, metric {}",
            observations.len(),
            tenants.len(),
            options.config.metric_name.cyan()
        ));
        if selected.len() < total {
            print_warning(&format!("Showing {} of {} anomalies", selected.len(), total));
        }
    }

    let rows: Vec<AnomalyRow> = selected.iter().map(AnomalyRow::from).collect();
    print_items(rows, &selected, format);

    if let (Some(output), OutputFormat::Table) = (&options.output, format) {
        if !selected.is_empty() {
            print_success(&format!(
                "Appended {} anomalies to {}",
                selected.len(),
                output.display()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use detector_lib::Observation;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, d).unwrap()
    }

    fn anomalies() -> Vec<Anomaly> {
        let mut observations = Vec::new();
        for tenant in ["acme", "globex"] {
            for (i, v) in [10, 10, 10, 50, 2].iter().enumerate() {
                observations.push(Observation::new(tenant, day(i as u32 + 1), *v));
            }
        }
        let config = DetectorConfig::for_event("order.completed").with_baseline_days(3);
        detect(&observations, &config).unwrap()
    }

    #[test]
    fn test_select_without_filters_keeps_everything() {
        let all = anomalies();
        assert_eq!(select(all.clone(), None, None, 1), all);
    }

    #[test]
    fn test_select_by_tenant() {
        let selected = select(anomalies(), Some("globex"), None, 20);
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|a| a.tenant_id == "globex"));
    }

    #[test]
    fn test_select_tenant_day_is_ranked_and_limited() {
        let selected = select(anomalies(), Some("acme"), Some(day(4)), 20);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, 50);

        assert!(select(anomalies(), Some("acme"), Some(day(4)), 0).is_empty());
    }

    #[tokio::test]
    async fn test_run_detect_writes_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("observations.jsonl");
        let output = dir.path().join("anomalies.jsonl");

        let lines: Vec<String> = [10, 10, 10, 50]
            .iter()
            .enumerate()
            .map(|(i, v)| {
                format!(
                    r#"{{"tenant_id":"acme","day":"2024-08-0{}","value":{}}}"#,
                    i + 1,
                    v
                )
            })
            .collect();
        std::fs::write(&input, lines.join("\n")).unwrap();

        let options = DetectOptions {
            input,
            config: DetectorConfig::for_event("order.completed").with_baseline_days(3),
            tenant: None,
            day: None,
            limit: 20,
            output: Some(output.clone()),
        };
        run_detect(options, OutputFormat::Json).await.unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        let anomaly: Anomaly = serde_json::from_str(written.trim()).unwrap();
        assert_eq!(anomaly.ratio, 5.0);
        assert_eq!(anomaly.day, day(4));
    }
}
