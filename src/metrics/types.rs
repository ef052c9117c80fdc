//! @ai:module:intent Per-instance metrics and batch-level result types
//! @ai:module:layer domain
//! @ai:module:public_api MetricsRecord, InstanceFailure, BatchReport, BatchSummary, VerifiedStats
//! @ai:module:stateless true

use crate::error::{StageError, StageKind};
use crate::model::{InstanceDescriptor, Solution};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// @ai:intent Outcome of one solved and locally valid instance; one report row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub instance: String,
    pub stations: usize,
    pub products: usize,
    pub vehicles_used: usize,
    pub distance: f64,
    pub transition_cost: f64,
    pub total_cost: f64,
    pub transitions: usize,
    /// Wall-clock solve duration in seconds.
    pub solve_time: f64,
    pub valid_local: bool,
    /// None when remote verification was not attempted.
    pub valid_api: Option<bool>,
}

impl MetricsRecord {
    /// @ai:intent Build a record from a locally valid solution
    /// @ai:effects pure
    pub fn new(descriptor: &InstanceDescriptor, solution: &Solution, solve_time: Duration, valid_local: bool) -> Self {
        Self {
            instance: descriptor.name.clone(),
            stations: descriptor.nb_stations,
            products: descriptor.nb_products,
            vehicles_used: solution.nb_vehicles_used(),
            distance: solution.total_distance(),
            transition_cost: solution.total_transition_cost(),
            total_cost: solution.total_cost(),
            transitions: solution.total_transitions(),
            solve_time: solve_time.as_secs_f64(),
            valid_local,
            valid_api: None,
        }
    }

    /// @ai:intent Same record with the remote verdict attached
    /// @ai:effects pure
    pub fn with_remote_verdict(self, feasible: bool) -> Self {
        Self {
            valid_api: Some(feasible),
            ..self
        }
    }
}

/// @ai:intent An instance that was skipped, with its stage and a short cause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceFailure {
    pub instance: String,
    pub stage: StageKind,
    pub message: String,
}

impl InstanceFailure {
    /// @ai:intent Classify a stage error; validation errors keep at most `max_errors` messages
    /// @ai:effects pure
    pub fn from_error(instance: &str, error: &StageError, max_errors: usize) -> Self {
        let message = match error {
            StageError::Validation { errors } => {
                let mut shown = errors.iter().take(max_errors).cloned().collect::<Vec<_>>().join("; ");
                if errors.len() > max_errors {
                    shown.push_str(&format!("; ... and {} more", errors.len() - max_errors));
                }
                format!("{error}: {shown}")
            }
            other => other.to_string(),
        };

        Self {
            instance: instance.to_string(),
            stage: error.kind(),
            message,
        }
    }
}

/// @ai:intent Records and failures of one batch run, in discovery order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub timestamp: String,
    pub discovered: usize,
    pub verification_enabled: bool,
    pub records: Vec<MetricsRecord>,
    pub failures: Vec<InstanceFailure>,
}

/// @ai:intent Remote verification counts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerifiedStats {
    pub count: usize,
    pub fraction: f64,
}

/// @ai:intent Aggregates derived from a batch report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// RFC 3339 start time of the batch.
    pub timestamp: String,
    pub discovered: usize,
    pub solved: usize,
    pub failed: usize,
    pub mean_total_cost: Option<f64>,
    pub mean_solve_time: Option<f64>,
    /// Present only when verification stayed enabled for the batch.
    pub verified: Option<VerifiedStats>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    #[test]
    fn test_validation_failure_is_bounded() {
        let error = StageError::Validation {
            errors: (1..=5).map(|i| format!("violation {i}")).collect(),
        };

        let failure = InstanceFailure::from_error("bad.dat", &error, 3);
        assert_eq!(failure.stage, StageKind::Validation);
        assert_eq!(
            failure.message,
            "invalid solution (5 errors): violation 1; violation 2; violation 3; ... and 2 more"
        );
    }

    #[test]
    fn test_parse_failure_message() {
        let error = StageError::Parse(ModelError::UnexpectedEof {
            file: "x.dat".into(),
            message: "expected header".to_string(),
        });

        let failure = InstanceFailure::from_error("x.dat", &error, 3);
        assert_eq!(failure.stage, StageKind::Parse);
        assert!(failure.message.contains("expected header"));
    }

    #[test]
    fn test_with_remote_verdict() {
        let record = MetricsRecord {
            instance: "a.dat".to_string(),
            stations: 1,
            products: 1,
            vehicles_used: 1,
            distance: 1.0,
            transition_cost: 0.0,
            total_cost: 1.0,
            transitions: 0,
            solve_time: 0.1,
            valid_local: true,
            valid_api: None,
        };

        let verified = record.clone().with_remote_verdict(false);
        assert_eq!(verified.valid_api, Some(false));
        assert_eq!(verified.instance, record.instance);
    }
}
