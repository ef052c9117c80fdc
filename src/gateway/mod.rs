//! @ai:module:intent Remote verification service access and response normalization
//! @ai:module:layer infrastructure
//! @ai:module:public_api VerificationGatewayTrait, HttpVerificationGateway, MockVerificationGateway, VerificationOutcome, VerificationStatus

pub mod client;
pub mod outcome;

pub use client::{GenerationParams, HttpVerificationGateway, MockVerificationGateway, VerificationGatewayTrait};
pub use outcome::{
    ExtractedMetrics, MetricComparison, MetricKey, RemoteMetrics, VerificationOutcome, VerificationStatus,
};
