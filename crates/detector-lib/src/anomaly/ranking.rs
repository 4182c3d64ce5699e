//! Ranking of detected anomalies for reporting

use std::cmp::Ordering;

use chrono::NaiveDate;

use crate::models::Anomaly;

/// Default number of anomalies surfaced per tenant and day
pub const DEFAULT_TOP_LIMIT: usize = 20;

/// Sort most severe first, then by distance of the ratio from 1
pub fn rank_anomalies(anomalies: &mut [Anomaly]) {
    anomalies.sort_by(|a, b| {
        b.severity.cmp(&a.severity).then_with(|| {
            let da = (a.ratio - 1.0).abs();
            let db = (b.ratio - 1.0).abs();
            db.partial_cmp(&da).unwrap_or(Ordering::Equal)
        })
    });
}

/// Ranked anomalies of one tenant on one day, at most `limit` of them
pub fn top_for_day(
    anomalies: &[Anomaly],
    tenant_id: &str,
    day: NaiveDate,
    limit: usize,
) -> Vec<Anomaly> {
    let mut selected: Vec<Anomaly> = anomalies
        .iter()
        .filter(|a| a.tenant_id == tenant_id && a.day == day)
        .cloned()
        .collect();
    rank_anomalies(&mut selected);
    selected.truncate(limit);
    selected
}
