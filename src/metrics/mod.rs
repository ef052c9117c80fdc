//! @ai:module:intent Metrics collection and aggregation
//! @ai:module:layer application
//! @ai:module:public_api MetricsRecord, InstanceFailure, BatchReport, BatchSummary, MetricsAggregator

pub mod aggregator;
pub mod types;

pub use aggregator::{MetricsAggregator, MetricsAggregatorTrait};
pub use types::{BatchReport, BatchSummary, InstanceFailure, MetricsRecord, VerifiedStats};
