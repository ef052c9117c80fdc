//! @ai:module:intent MPVRP-CC batch solving, validation and remote verification
//! @ai:module:layer application
//! @ai:module:public_api config, error, model, gateway, runner, metrics, report

pub mod config;
pub mod error;
pub mod gateway;
pub mod metrics;
pub mod model;
pub mod report;
pub mod runner;

pub use config::BatchConfig;
pub use error::{ModelError, StageError};
pub use gateway::{
    HttpVerificationGateway, MockVerificationGateway, VerificationGatewayTrait, VerificationOutcome,
};
pub use metrics::{BatchReport, BatchSummary, MetricsRecord};
pub use report::CsvReporter;
pub use runner::{BatchRunner, PipelineStage};
