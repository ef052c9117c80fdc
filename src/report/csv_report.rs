//! @ai:module:intent CSV export of per-instance metrics records
//! @ai:module:layer infrastructure
//! @ai:module:public_api CsvReporter
//! @ai:module:stateless true

use crate::metrics::MetricsRecord;
use anyhow::{Context, Result};
use std::path::Path;

/// @ai:intent Trait for tabular report generation
pub trait CsvReporterTrait: Send + Sync {
    /// @ai:intent Write records to a CSV file; returns false when there was nothing to write
    fn generate(&self, records: &[MetricsRecord], output_path: &Path) -> Result<bool>;
}

/// @ai:intent Writes one CSV row per solved instance
pub struct CsvReporter;

impl CsvReporter {
    /// @ai:intent Create a new CSV reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvReporterTrait for CsvReporter {
    /// @ai:intent Overwrite the report file with the given records
    /// @ai:pre records are in discovery order
    /// @ai:post no file is created or touched when records is empty
    /// @ai:effects fs:write
    fn generate(&self, records: &[MetricsRecord], output_path: &Path) -> Result<bool> {
        if records.is_empty() {
            return Ok(false);
        }

        let mut writer = csv::Writer::from_path(output_path)
            .with_context(|| format!("Failed to create report file {}", output_path.display()))?;
        for record in records {
            writer.serialize(record)?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to write report file {}", output_path.display()))?;

        tracing::info!("Report written to {} ({} rows)", output_path.display(), records.len());
        Ok(true)
    }
}
