//! @ai:module:intent Per-instance parse, solve, validate, export and verify sequence
//! @ai:module:layer application
//! @ai:module:public_api PipelineStage, Collaborators, PipelineOutput, RemoteVerification
//! @ai:module:stateless true

use crate::error::StageError;
use crate::gateway::{VerificationGatewayTrait, VerificationOutcome, VerificationStatus};
use crate::metrics::MetricsRecord;
use crate::model::{
    DatParser, DatSolutionWriter, FeasibilityValidator, GreedySolver, InstanceDescriptor, InstanceParser, Solution,
    SolutionValidator, SolutionWriter, Solver,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// @ai:intent External collaborators driven by the pipeline
pub struct Collaborators {
    pub parser: Box<dyn InstanceParser>,
    pub solver: Box<dyn Solver>,
    pub validator: Box<dyn SolutionValidator>,
    pub writer: Box<dyn SolutionWriter>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            parser: Box::new(DatParser::new()),
            solver: Box::new(GreedySolver::new()),
            validator: Box::new(FeasibilityValidator::new()),
            writer: Box::new(DatSolutionWriter::new()),
        }
    }
}

/// @ai:intent Gateway and timeout to use when remote verification is enabled
pub struct RemoteVerification<'a, G: VerificationGatewayTrait> {
    pub gateway: &'a G,
    pub timeout: Duration,
}

/// @ai:intent Everything produced by a successful pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub descriptor: InstanceDescriptor,
    pub solution: Solution,
    pub solution_path: PathBuf,
    pub solve_time: Duration,
    pub record: MetricsRecord,
    /// None when verification was not attempted.
    pub verification: Option<VerificationOutcome>,
}

/// @ai:intent Runs the five stages for one instance; each stage requires the previous one
pub struct PipelineStage {
    collaborators: Collaborators,
    max_remote_errors: usize,
}

impl PipelineStage {
    /// @ai:intent Create a pipeline stage
    /// @ai:effects pure
    pub fn new(collaborators: Collaborators, max_remote_errors: usize) -> Self {
        Self {
            collaborators,
            max_remote_errors,
        }
    }

    /// @ai:intent Process one instance file
    /// @ai:post Ok only when the solution is locally valid and exported; remote infeasibility keeps Ok
    /// @ai:effects fs:read, fs:write, network
    pub async fn run<G: VerificationGatewayTrait>(
        &self,
        instance_path: &Path,
        solution_path: &Path,
        changeover_weight: f64,
        remote: Option<RemoteVerification<'_, G>>,
    ) -> Result<PipelineOutput, StageError> {
        let instance = self
            .collaborators
            .parser
            .parse(instance_path)
            .map_err(StageError::Parse)?;
        let descriptor = instance.descriptor();

        tracing::debug!(
            "Parsed {}: {} stations, {} products, {} vehicles",
            descriptor.name,
            descriptor.nb_stations,
            descriptor.nb_products,
            descriptor.nb_vehicles
        );

        let start = Instant::now();
        let solved = self.collaborators.solver.solve(&instance, changeover_weight);
        let solve_time = start.elapsed();
        let solution = solved.map_err(StageError::Solve)?;

        let validation = self.collaborators.validator.validate(&instance, &solution);
        if !validation.is_valid {
            return Err(StageError::Validation {
                errors: validation.errors,
            });
        }

        self.collaborators
            .writer
            .write(&instance, &solution, solve_time, solution_path)
            .map_err(StageError::Export)?;

        let mut record = MetricsRecord::new(&descriptor, &solution, solve_time, validation.is_valid);

        let verification = match remote {
            Some(remote) => {
                let outcome = remote
                    .gateway
                    .verify(instance_path, solution_path, remote.timeout)
                    .await;
                self.log_verification(&descriptor.name, &outcome);
                record = record.with_remote_verdict(outcome.feasible);
                Some(outcome)
            }
            None => None,
        };

        Ok(PipelineOutput {
            descriptor,
            solution,
            solution_path: solution_path.to_path_buf(),
            solve_time,
            record,
            verification,
        })
    }

    /// @ai:intent Report the remote verdict for one instance
    /// @ai:effects io
    fn log_verification(&self, instance: &str, outcome: &VerificationOutcome) {
        match outcome.status() {
            VerificationStatus::Feasible(_) => {
                tracing::info!("{}: remote verification passed", instance);
            }
            VerificationStatus::FeasibleWithoutMetrics => {
                tracing::warn!(
                    "{}: remote verification passed but metrics are unavailable",
                    instance
                );
            }
            VerificationStatus::Infeasible => {
                tracing::warn!(
                    "{}: remote verification failed ({} errors)",
                    instance,
                    outcome.errors.len()
                );
                for error in outcome.errors.iter().take(self.max_remote_errors) {
                    tracing::warn!("  - {}", error);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ModelError, StageKind};
    use crate::gateway::MockVerificationGateway;
    use crate::model::instance::SAMPLE_INSTANCE;
    use crate::model::{Instance, ValidationOutcome};
    use tempfile::TempDir;

    struct FailingSolver;

    impl Solver for FailingSolver {
        fn solve(&self, _instance: &Instance, _weight: f64) -> Result<Solution, ModelError> {
            Err(ModelError::Solver("diverged".to_string()))
        }
    }

    struct RejectingValidator;

    impl SolutionValidator for RejectingValidator {
        fn validate(&self, _instance: &Instance, _solution: &Solution) -> ValidationOutcome {
            ValidationOutcome::from_errors(vec!["capacity exceeded".to_string()])
        }
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let instance = temp.path().join("MPVRP_S_001.dat");
        std::fs::write(&instance, SAMPLE_INSTANCE).unwrap();
        let solution = temp.path().join("Sol_MPVRP_S_001.dat");
        (temp, instance, solution)
    }

    #[tokio::test]
    async fn test_successful_run_without_verification() {
        let (_temp, instance, solution) = setup();
        let stage = PipelineStage::new(Collaborators::default(), 2);

        let output = stage
            .run::<MockVerificationGateway>(&instance, &solution, 0.5, None)
            .await
            .unwrap();

        assert!(solution.exists());
        assert_eq!(output.record.instance, "MPVRP_S_001.dat");
        assert_eq!(output.record.stations, 3);
        assert!(output.record.valid_local);
        assert_eq!(output.record.valid_api, None);
        assert!(output.verification.is_none());
        assert!((output.record.total_cost - output.solution.total_cost()).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_remote_failure_keeps_local_success() {
        let (_temp, instance, solution) = setup();
        let stage = PipelineStage::new(Collaborators::default(), 2);
        let gateway = MockVerificationGateway::new(
            true,
            VerificationOutcome::failure("Station 2 demand not met"),
        );

        let output = stage
            .run(
                &instance,
                &solution,
                0.5,
                Some(RemoteVerification {
                    gateway: &gateway,
                    timeout: Duration::from_secs(1),
                }),
            )
            .await
            .unwrap();

        assert_eq!(output.record.valid_api, Some(false));
        assert!(output.record.valid_local);
        assert_eq!(gateway.verify_calls(), 1);
    }

    #[tokio::test]
    async fn test_parse_error_is_classified() {
        let temp = TempDir::new().unwrap();
        let instance = temp.path().join("broken.dat");
        std::fs::write(&instance, "not an instance").unwrap();
        let stage = PipelineStage::new(Collaborators::default(), 2);

        let err = stage
            .run::<MockVerificationGateway>(&instance, &temp.path().join("Sol_broken.dat"), 0.5, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StageKind::Parse);
    }

    #[tokio::test]
    async fn test_solver_error_is_classified() {
        let (_temp, instance, solution) = setup();
        let stage = PipelineStage::new(
            Collaborators {
                solver: Box::new(FailingSolver),
                ..Default::default()
            },
            2,
        );

        let err = stage
            .run::<MockVerificationGateway>(&instance, &solution, 0.5, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StageKind::Solve);
        assert!(!solution.exists());
    }

    #[tokio::test]
    async fn test_invalid_solution_is_not_exported() {
        let (_temp, instance, solution) = setup();
        let stage = PipelineStage::new(
            Collaborators {
                validator: Box::new(RejectingValidator),
                ..Default::default()
            },
            2,
        );

        let err = stage
            .run::<MockVerificationGateway>(&instance, &solution, 0.5, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::Validation { ref errors } if errors.len() == 1));
        assert!(!solution.exists());
    }

    #[tokio::test]
    async fn test_export_error_is_classified() {
        let (temp, instance, _) = setup();
        let stage = PipelineStage::new(Collaborators::default(), 2);
        let unwritable = temp.path().join("missing").join("Sol_MPVRP_S_001.dat");

        let err = stage
            .run::<MockVerificationGateway>(&instance, &unwritable, 0.5, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StageKind::Export);
    }
}
