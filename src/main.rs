//! @ai:module:intent CLI for batch solving and remote verification of MPVRP-CC instances
//! @ai:module:layer presentation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mpvrp_batch::{
    config::BatchConfig,
    gateway::{GenerationParams, HttpVerificationGateway, VerificationGatewayTrait, VerificationStatus},
    metrics::{MetricsAggregator, MetricsAggregatorTrait},
    model::solution_file_name,
    report::{print_batch_summary, print_comparison, print_verification_result, CsvReporter, CsvReporterTrait},
    runner::{BatchRunner, Collaborators, PipelineStage, RemoteVerification},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Configuration file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "mpvrp-batch.toml";

#[derive(Parser)]
#[command(name = "mpvrp-batch")]
#[command(about = "Batch solver and verifier for MPVRP-CC instances")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verification service base URL (overrides configuration)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve every instance of a directory and export a CSV report
    Batch {
        /// Directory containing instance files
        instance_dir: PathBuf,

        /// Output directory for solutions and the report
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verify each solution with the remote service
        #[arg(long)]
        verify: bool,

        /// Changeover cost weight in [0, 1]
        #[arg(short, long)]
        weight: Option<f64>,
    },

    /// Solve a single instance
    Solve {
        /// Instance file
        instance: PathBuf,

        /// Solution file to write
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Changeover cost weight in [0, 1]
        #[arg(short, long)]
        weight: Option<f64>,

        /// Verify the solution with the remote service
        #[arg(long)]
        verify: bool,

        /// Only print errors
        #[arg(short, long)]
        quiet: bool,
    },

    /// Verify an existing instance/solution pair with the remote service
    Verify {
        /// Instance file
        instance: PathBuf,

        /// Solution file
        solution: PathBuf,
    },

    /// Generate an instance with the remote service
    Generate {
        /// Instance identifier; the file is written as MPVRP_<id>.dat
        #[arg(long)]
        id: String,

        /// Output directory
        #[arg(short, long, default_value = "instances")]
        output: PathBuf,

        #[arg(long, default_value = "2")]
        vehicles: u32,

        #[arg(long, default_value = "1")]
        depots: u32,

        #[arg(long, default_value = "1")]
        garages: u32,

        #[arg(long, default_value = "5")]
        stations: u32,

        #[arg(long, default_value = "2")]
        products: u32,

        #[arg(long, default_value = "100")]
        max_coord: u32,

        #[arg(long, default_value = "15000")]
        min_capacity: u32,

        #[arg(long, default_value = "20000")]
        max_capacity: u32,

        #[arg(long, default_value = "10")]
        min_transition_cost: u32,

        #[arg(long, default_value = "30")]
        max_transition_cost: u32,

        #[arg(long, default_value = "1000")]
        min_demand: u32,

        #[arg(long, default_value = "3000")]
        max_demand: u32,

        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Check that the verification service is reachable
    Health,

    /// Initialize default configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mpvrp_batch=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = load_or_default_config(cli.config)?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    match cli.command {
        Commands::Batch {
            instance_dir,
            output,
            verify,
            weight,
        } => run_batch(config, &instance_dir, output, verify, weight).await,
        Commands::Solve {
            instance,
            output,
            weight,
            verify,
            quiet,
        } => {
            let solved = solve_single(config, &instance, output, weight, verify, quiet).await?;
            if !solved {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Verify { instance, solution } => {
            let feasible = verify_pair(config, &instance, &solution).await?;
            if !feasible {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Generate {
            id,
            output,
            vehicles,
            depots,
            garages,
            stations,
            products,
            max_coord,
            min_capacity,
            max_capacity,
            min_transition_cost,
            max_transition_cost,
            min_demand,
            max_demand,
            seed,
        } => {
            let params = GenerationParams {
                id_instance: id,
                nb_vehicles: vehicles,
                nb_depots: depots,
                nb_garages: garages,
                nb_stations: stations,
                nb_produits: products,
                max_coord,
                min_capacite: min_capacity,
                max_capacite: max_capacity,
                min_transition_cost,
                max_transition_cost,
                min_demand,
                max_demand,
                seed,
            };
            generate_instance(config, &params, &output).await
        }
        Commands::Health => check_health(config).await,
        Commands::Init { output } => init_config(output),
    }
}

/// @ai:intent Solve a directory, print the summary, then export the CSV report
/// @ai:effects fs:read, fs:write, network
async fn run_batch(
    config: BatchConfig,
    instance_dir: &Path,
    output: Option<PathBuf>,
    verify: bool,
    weight: Option<f64>,
) -> Result<()> {
    let output_dir = output.unwrap_or_else(|| config.run.output_dir.clone());
    let weight = weight.unwrap_or(config.run.changeover_weight);

    let gateway = Arc::new(HttpVerificationGateway::new(&config.api.base_url)?);
    let stage = PipelineStage::new(Collaborators::default(), config.run.max_remote_errors_shown);
    let runner = BatchRunner::new(stage, gateway, config.api.clone(), config.run.clone());

    let report = runner.run(instance_dir, &output_dir, verify, weight).await?;

    let summary = MetricsAggregator::new().summarize(&report);
    print_batch_summary(&summary, &report.failures);

    let report_path = output_dir.join(&config.run.report_file);
    if CsvReporter::new().generate(&report.records, &report_path)? {
        println!("Detailed report: {}", report_path.display());
    }

    Ok(())
}

/// @ai:intent Solve one instance with step-by-step output; returns false when it fails
/// @ai:effects fs:read, fs:write, network
async fn solve_single(
    config: BatchConfig,
    instance: &Path,
    output: Option<PathBuf>,
    weight: Option<f64>,
    verify: bool,
    quiet: bool,
) -> Result<bool> {
    if !instance.is_file() {
        eprintln!("Instance file not found: {}", instance.display());
        return Ok(false);
    }

    let name = instance
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let solution_path = output.unwrap_or_else(|| config.run.output_dir.join(solution_file_name(&name)));
    if let Some(parent) = solution_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    let weight = weight.unwrap_or(config.run.changeover_weight);

    let gateway = HttpVerificationGateway::new(&config.api.base_url)?;
    let remote_available = if verify {
        let alive = gateway.is_alive(config.api.health_timeout()).await;
        if !alive {
            println!("Verification service unavailable, skipping remote verification");
        }
        alive
    } else {
        false
    };
    let remote = remote_available.then(|| RemoteVerification {
        gateway: &gateway,
        timeout: config.api.verify_timeout(),
    });

    let stage = PipelineStage::new(Collaborators::default(), config.run.max_remote_errors_shown);
    let output = match stage.run(instance, &solution_path, weight, remote).await {
        Ok(output) => output,
        Err(e) => {
            println!("{} failed at {} stage: {}", name, e.kind(), e);
            if let mpvrp_batch::StageError::Validation { errors } = &e {
                for error in errors.iter().take(config.run.max_errors_shown) {
                    println!("  - {}", error);
                }
            }
            tracing::debug!("{} failure detail: {:?}", name, e);
            return Ok(false);
        }
    };

    if !quiet {
        println!("Instance: {}", output.descriptor.name);
        println!("  Stations: {}", output.descriptor.nb_stations);
        println!("  Products: {}", output.descriptor.nb_products);
        println!("  Vehicles: {}", output.descriptor.nb_vehicles);
        println!("Solved in {:.3}s", output.solve_time.as_secs_f64());
        println!("  Total cost: {:.2}", output.record.total_cost);
        println!("  Distance: {:.2}", output.record.distance);
        println!("  Changeover cost: {:.2}", output.record.transition_cost);
        println!("  Vehicles used: {}", output.record.vehicles_used);
        println!("  Product changes: {}", output.record.transitions);
        println!("Local validation: OK");
        println!("Solution written to {}", output.solution_path.display());
    }

    if let Some(outcome) = &output.verification {
        print_verification_result(outcome);
        if let VerificationStatus::Feasible(metrics) = outcome.status() {
            print_comparison(&metrics.compare_with(&output.solution));
        }
    }

    Ok(true)
}

/// @ai:intent Verify an existing pair; returns false when infeasible or unreachable
/// @ai:effects fs:read, network
async fn verify_pair(config: BatchConfig, instance: &Path, solution: &Path) -> Result<bool> {
    let gateway = HttpVerificationGateway::new(&config.api.base_url)?;

    if !gateway.is_alive(config.api.health_timeout()).await {
        println!("Verification service unavailable at {}", gateway.base_url());
        return Ok(false);
    }

    let outcome = gateway
        .verify(instance, solution, config.api.verify_timeout())
        .await;
    print_verification_result(&outcome);

    Ok(outcome.feasible)
}

/// @ai:intent Generate an instance remotely and write it as MPVRP_<id>.dat
/// @ai:effects fs:write, network
async fn generate_instance(config: BatchConfig, params: &GenerationParams, output_dir: &Path) -> Result<()> {
    let gateway = HttpVerificationGateway::new(&config.api.base_url)?;

    if !gateway.is_alive(config.api.health_timeout()).await {
        anyhow::bail!("Verification service unavailable at {}", gateway.base_url());
    }

    let content = gateway
        .generate(params, config.api.generate_timeout())
        .await
        .with_context(|| format!("Generation of {} failed", params.id_instance))?;

    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("MPVRP_{}.dat", params.id_instance));
    std::fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Instance written to {}", path.display());
    Ok(())
}

/// @ai:intent Probe the verification service
/// @ai:effects network
async fn check_health(config: BatchConfig) -> Result<()> {
    let gateway = HttpVerificationGateway::new(&config.api.base_url)?;

    if gateway.is_alive(config.api.health_timeout()).await {
        println!("Verification service available at {}", gateway.base_url());
        Ok(())
    } else {
        anyhow::bail!("Verification service unavailable at {}", gateway.base_url())
    }
}

/// @ai:intent Initialize default configuration file
/// @ai:effects fs:write
fn init_config(output: PathBuf) -> Result<()> {
    let config = BatchConfig::default();
    config.save(&output)?;
    println!("Configuration written to {}", output.display());
    Ok(())
}

/// @ai:intent Load configuration from file or use defaults
/// @ai:effects fs:read
fn load_or_default_config(path: Option<PathBuf>) -> Result<BatchConfig> {
    match path {
        Some(p) => BatchConfig::load(&p),
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                BatchConfig::load(&default_path)
            } else {
                Ok(BatchConfig::default())
            }
        }
    }
}
