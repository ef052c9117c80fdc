//! @ai:module:intent Summary statistics over a batch report
//! @ai:module:layer application
//! @ai:module:public_api MetricsAggregator
//! @ai:module:stateless true

use crate::metrics::types::{BatchReport, BatchSummary, VerifiedStats};

/// @ai:intent Trait for batch aggregation
pub trait MetricsAggregatorTrait: Send + Sync {
    /// @ai:intent Compute means and verification counts for a report
    fn summarize(&self, report: &BatchReport) -> BatchSummary;
}

/// @ai:intent Computes mean cost, mean solve time and remote verification share
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// @ai:intent Create a new metrics aggregator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }
}

impl Default for MetricsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// @ai:intent Calculate average of an iterator of f64; None when empty
/// @ai:effects pure
fn average<I: Iterator<Item = f64>>(iter: I) -> Option<f64> {
    let (sum, count) = iter.fold((0.0, 0u32), |(s, c), v| (s + v, c + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

impl MetricsAggregatorTrait for MetricsAggregator {
    /// @ai:intent Aggregate records of one batch
    /// @ai:effects pure
    fn summarize(&self, report: &BatchReport) -> BatchSummary {
        let records = &report.records;

        let verified = report.verification_enabled.then(|| {
            let count = records.iter().filter(|r| r.valid_api == Some(true)).count();
            let fraction = if records.is_empty() {
                0.0
            } else {
                count as f64 / records.len() as f64
            };
            VerifiedStats { count, fraction }
        });

        BatchSummary {
            timestamp: report.timestamp.clone(),
            discovered: report.discovered,
            solved: records.len(),
            failed: report.failures.len(),
            mean_total_cost: average(records.iter().map(|r| r.total_cost)),
            mean_solve_time: average(records.iter().map(|r| r.solve_time)),
            verified,
        }
    }
}
