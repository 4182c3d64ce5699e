//! Severity classification for flagged ratios
//!
//! Cut-points are fixed policy, independent of the thresholds that decide
//! whether a point is flagged at all.

use crate::models::{Direction, Severity};

/// Spike ratio at or above which severity is high
const SPIKE_HIGH_RATIO: f64 = 5.0;
/// Spike ratio at or above which severity is medium
const SPIKE_MEDIUM_RATIO: f64 = 3.0;
/// Drop ratio at or below which severity is high
const DROP_HIGH_RATIO: f64 = 0.2;
/// Drop ratio at or below which severity is medium
const DROP_MEDIUM_RATIO: f64 = 0.35;

impl Severity {
    /// Bucket a ratio for the given direction
    pub fn from_ratio(ratio: f64, direction: Direction) -> Self {
        match direction {
            Direction::Spike => {
                if ratio >= SPIKE_HIGH_RATIO {
                    Severity::High
                } else if ratio >= SPIKE_MEDIUM_RATIO {
                    Severity::Medium
                } else {
                    Severity::Low
                }
            }
            Direction::Drop => {
                if ratio <= DROP_HIGH_RATIO {
                    Severity::High
                } else if ratio <= DROP_MEDIUM_RATIO {
                    Severity::Medium
                } else {
                    Severity::Low
                }
            }
        }
    }
}

/// Free-function form of [`Severity::from_ratio`]
pub fn severity_from_ratio(ratio: f64, direction: Direction) -> Severity {
    Severity::from_ratio(ratio, direction)
}
