//! Core data models for the anomaly detector

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Daily count of one event for one tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub tenant_id: String,
    pub day: NaiveDate,
    /// Event count for the day. Signed so malformed input propagates
    /// arithmetically rather than being rejected.
    pub value: i64,
}

impl Observation {
    pub fn new(tenant_id: impl Into<String>, day: NaiveDate, value: i64) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            day,
            value,
        }
    }
}

/// Direction of a flagged deviation from baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Spike,
    Drop,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Spike => write!(f, "spike"),
            Direction::Drop => write!(f, "drop"),
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "spike" => Ok(Direction::Spike),
            "drop" => Ok(Direction::Drop),
            other => Err(format!("unknown direction '{}', expected spike or drop", other)),
        }
    }
}

/// Severity bucket of a flagged anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// Anomaly record handed to the sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub tenant_id: String,
    pub day: NaiveDate,
    pub metric: String,
    pub value: i64,
    /// Mean of the trailing window, excluding `day`
    pub baseline: f64,
    /// `value / baseline`
    pub ratio: f64,
    pub direction: Direction,
    pub severity: Severity,
    pub details: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enums_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Direction::Spike).unwrap(), "\"spike\"");
        assert_eq!(serde_json::to_string(&Severity::Medium).unwrap(), "\"medium\"");
        assert_eq!(Direction::Drop.to_string(), "drop");
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("SPIKE".parse::<Direction>().unwrap(), Direction::Spike);
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_observation_deserializes_iso_day() {
        let obs: Observation =
            serde_json::from_str(r#"{"tenant_id":"t1","day":"2024-03-01","value":12}"#).unwrap();
        assert_eq!(obs.day, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(obs.value, 12);
    }
}
