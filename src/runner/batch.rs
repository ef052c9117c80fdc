//! @ai:module:intent Batch driver: discovery, failure isolation and record collection
//! @ai:module:layer application
//! @ai:module:public_api BatchRunner, discover_instances
//! @ai:module:stateless false

use crate::config::{ApiConfig, RunConfig};
use crate::gateway::VerificationGatewayTrait;
use crate::metrics::{BatchReport, InstanceFailure, MetricsRecord};
use crate::model::solution_file_name;
use crate::runner::pipeline::{PipelineStage, RemoteVerification};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

/// @ai:intent Find instance files directly inside `dir`, sorted by file name
/// @ai:pre dir exists
/// @ai:effects fs:read
pub fn discover_instances(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Instance directory not found: {}", dir.display());
    }

    let files = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == extension)
                .unwrap_or(false)
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    Ok(files)
}

/// @ai:intent Runs the pipeline over every instance of a directory, one at a time
pub struct BatchRunner<G: VerificationGatewayTrait> {
    stage: PipelineStage,
    gateway: Arc<G>,
    api: ApiConfig,
    run: RunConfig,
}

impl<G: VerificationGatewayTrait> BatchRunner<G> {
    /// @ai:intent Create a batch runner
    /// @ai:effects pure
    pub fn new(stage: PipelineStage, gateway: Arc<G>, api: ApiConfig, run: RunConfig) -> Self {
        Self {
            stage,
            gateway,
            api,
            run,
        }
    }

    /// @ai:intent Probe the service once; a failed probe disables verification for the whole batch
    /// @ai:effects network
    async fn verification_available(&self) -> bool {
        if self.gateway.is_alive(self.api.health_timeout()).await {
            tracing::info!("Verification service available, solutions will be verified remotely");
            true
        } else {
            tracing::warn!("Verification service unavailable, remote verification disabled for this batch");
            false
        }
    }

    /// @ai:intent Solve every instance of `instance_dir`; per-instance failures never abort the batch
    /// @ai:post records.len() + failures.len() == discovered
    /// @ai:effects fs:read, fs:write, network
    pub async fn run(
        &self,
        instance_dir: &Path,
        output_dir: &Path,
        verify: bool,
        changeover_weight: f64,
    ) -> Result<BatchReport> {
        let instances = discover_instances(instance_dir, &self.run.instance_extension)?;

        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

        let mut report = BatchReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            discovered: instances.len(),
            ..Default::default()
        };

        if instances.is_empty() {
            tracing::warn!(
                "No .{} instances found in {}, nothing to do",
                self.run.instance_extension,
                instance_dir.display()
            );
            return Ok(report);
        }

        tracing::info!(
            "Found {} instances in {}, writing solutions to {}",
            instances.len(),
            instance_dir.display(),
            output_dir.display()
        );

        report.verification_enabled = verify && self.verification_available().await;

        let total = instances.len();
        let mut records: Vec<MetricsRecord> = Vec::with_capacity(total);
        let mut failures: Vec<InstanceFailure> = Vec::new();

        for (i, instance_path) in instances.iter().enumerate() {
            let name = instance_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let solution_path = output_dir.join(solution_file_name(&name));

            tracing::info!("[{}/{}] Solving {}", i + 1, total, name);

            let remote = report.verification_enabled.then(|| RemoteVerification {
                gateway: self.gateway.as_ref(),
                timeout: self.api.verify_timeout(),
            });

            match self
                .stage
                .run(instance_path, &solution_path, changeover_weight, remote)
                .await
            {
                Ok(output) => {
                    tracing::info!(
                        "{} solved in {:.2}s: cost {:.2} (distance {:.2}, changeover {:.2})",
                        name,
                        output.record.solve_time,
                        output.record.total_cost,
                        output.record.distance,
                        output.record.transition_cost
                    );
                    records.push(output.record);
                }
                Err(e) => {
                    let failure = InstanceFailure::from_error(&name, &e, self.run.max_errors_shown);
                    tracing::warn!("{} failed at {} stage: {}", name, failure.stage, failure.message);
                    tracing::debug!("{} failure detail: {:?}", name, e);
                    failures.push(failure);
                }
            }
        }

        report.records = records;
        report.failures = failures;
        Ok(report)
    }
}
