//! @ai:module:intent Per-instance pipeline and the batch driver around it
//! @ai:module:layer application
//! @ai:module:public_api BatchRunner, PipelineStage, Collaborators, discover_instances

pub mod batch;
pub mod pipeline;

pub use batch::{discover_instances, BatchRunner};
pub use pipeline::{Collaborators, PipelineOutput, PipelineStage, RemoteVerification};
