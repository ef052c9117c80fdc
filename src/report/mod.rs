//! @ai:module:intent Batch report export and console output
//! @ai:module:layer infrastructure
//! @ai:module:public_api CsvReporter, print_batch_summary, print_verification_result, print_comparison

pub mod console;
pub mod csv_report;

pub use console::{print_batch_summary, print_comparison, print_verification_result};
pub use csv_report::{CsvReporter, CsvReporterTrait};
