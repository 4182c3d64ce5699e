//! Tenant Anomaly Detector CLI
//!
//! Runs the daily-count detector over a local observation file and
//! inspects severity buckets.

mod commands;
mod output;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use commands::{detect, severity};
use detector_lib::anomaly::{
    DetectorConfig, DEFAULT_BASELINE_DAYS, DEFAULT_DROP_THRESHOLD, DEFAULT_EVENT_NAME,
    DEFAULT_SPIKE_THRESHOLD, DEFAULT_TOP_LIMIT,
};
use detector_lib::Direction;
use std::path::PathBuf;

/// Tenant Anomaly Detector CLI
#[derive(Parser)]
#[command(name = "anomaly")]
#[command(author, version, about = "CLI for the Tenant Anomaly Detector", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect spikes and drops in a file of daily observations
    Detect(DetectArgs),

    /// Show the severity bucket for a ratio
    #[command(allow_negative_numbers = true)]
    Severity {
        /// Ratio of the day's value to its baseline
        ratio: f64,

        /// Direction of the deviation (spike or drop)
        #[arg(long, short, default_value = "spike")]
        direction: Direction,
    },
}

#[derive(Args)]
pub struct DetectArgs {
    /// Observation file (JSON array or JSON lines)
    #[arg(long, short)]
    pub input: PathBuf,

    /// Days averaged into the trailing baseline
    #[arg(long, env = "ANOMALY_BASELINE_DAYS", default_value_t = DEFAULT_BASELINE_DAYS)]
    pub baseline_days: usize,

    /// Minimum ratio flagged as a spike
    #[arg(long, env = "ANOMALY_SPIKE_RATIO", default_value_t = DEFAULT_SPIKE_THRESHOLD)]
    pub spike_ratio: f64,

    /// Maximum ratio flagged as a drop
    #[arg(long, env = "ANOMALY_DROP_RATIO", default_value_t = DEFAULT_DROP_THRESHOLD)]
    pub drop_ratio: f64,

    /// Event whose daily count the file holds
    #[arg(long, env = "ANOMALY_EVENT_NAME", default_value = DEFAULT_EVENT_NAME)]
    pub event: String,

    /// Only show anomalies for this tenant
    #[arg(long, short)]
    pub tenant: Option<String>,

    /// Only show anomalies on this day (YYYY-MM-DD)
    #[arg(long)]
    pub day: Option<NaiveDate>,

    /// Maximum anomalies shown for a tenant and day
    #[arg(long, default_value_t = DEFAULT_TOP_LIMIT)]
    pub limit: usize,

    /// Append the anomalies to this JSON-lines file
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl DetectArgs {
    fn into_options(self) -> detect::DetectOptions {
        let config = DetectorConfig::for_event(self.event)
            .with_baseline_days(self.baseline_days)
            .with_thresholds(self.spike_ratio, self.drop_ratio);

        detect::DetectOptions {
            input: self.input,
            config,
            tenant: self.tenant,
            day: self.day,
            limit: self.limit,
            output: self.output,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect(args) => {
            detect::run_detect(args.into_options(), cli.format).await?;
        }
        Commands::Severity { ratio, direction } => {
            severity::show_severity(ratio, direction, cli.format)?;
        }
    }

    Ok(())
}
