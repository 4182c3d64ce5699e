//! Severity lookup command

use anyhow::Result;
use colored::Colorize;
use detector_lib::{anomaly::severity_from_ratio, Direction};
use serde::Serialize;

use crate::output::{format_direction, format_ratio, format_severity, OutputFormat};

#[derive(Serialize)]
struct SeverityReport {
    ratio: f64,
    direction: Direction,
    severity: detector_lib::Severity,
}

/// Print the severity bucket of `ratio` for `direction`
pub fn show_severity(ratio: f64, direction: Direction, format: OutputFormat) -> Result<()> {
    let report = SeverityReport {
        ratio,
        direction,
        severity: severity_from_ratio(ratio, direction),
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => {
            println!(
                "{} {} at {} → {}",
                "Severity:".bold(),
                format_direction(direction),
                format_ratio(ratio),
                format_severity(report.severity)
            );
        }
    }

    Ok(())
}
