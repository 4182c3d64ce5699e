//! Output formatting utilities

use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use detector_lib::{Direction, Severity};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a table, or the raw items as JSON
pub fn print_items<R: Tabled, T: Serialize>(rows: Vec<R>, items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No anomalies found".yellow());
                return;
            }
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(items) {
                println!("{}", json);
            }
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a ratio with fixed precision
pub fn format_ratio(ratio: f64) -> String {
    format!("{:.2}x", ratio)
}

/// Colorize severity for display
pub fn format_severity(severity: Severity) -> ColoredString {
    match severity {
        Severity::High => "high".red().bold(),
        Severity::Medium => "medium".yellow(),
        Severity::Low => "low".normal(),
    }
}

/// Arrow plus direction name
pub fn format_direction(direction: Direction) -> String {
    match direction {
        Direction::Spike => "▲ spike".to_string(),
        Direction::Drop => "▼ drop".to_string(),
    }
}
