//! @ai:module:intent Configuration structs for the batch pipeline
//! @ai:module:layer infrastructure
//! @ai:module:public_api BatchConfig, ApiConfig, RunConfig
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Fallback address of the verification service.
pub const DEFAULT_API_URL: &str = "https://mpvrp-cc.onrender.com";

/// @ai:intent Main configuration for the batch tool
/// @ai:effects pure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// @ai:intent Verification service address and per-call timeouts
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
    #[serde(default = "default_verify_timeout")]
    pub verify_timeout_secs: u64,
    #[serde(default = "default_generate_timeout")]
    pub generate_timeout_secs: u64,
}

/// @ai:intent Batch execution settings
/// @ai:effects pure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_changeover_weight")]
    pub changeover_weight: f64,
    #[serde(default = "default_extension")]
    pub instance_extension: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_report_file")]
    pub report_file: String,
    #[serde(default = "default_max_errors_shown")]
    pub max_errors_shown: usize,
    #[serde(default = "default_max_remote_errors_shown")]
    pub max_remote_errors_shown: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            health_timeout_secs: default_health_timeout(),
            verify_timeout_secs: default_verify_timeout(),
            generate_timeout_secs: default_generate_timeout(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            changeover_weight: default_changeover_weight(),
            instance_extension: default_extension(),
            output_dir: default_output_dir(),
            report_file: default_report_file(),
            max_errors_shown: default_max_errors_shown(),
            max_remote_errors_shown: default_max_remote_errors_shown(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_health_timeout() -> u64 {
    5
}

fn default_verify_timeout() -> u64 {
    60
}

fn default_generate_timeout() -> u64 {
    30
}

fn default_changeover_weight() -> f64 {
    0.5
}

fn default_extension() -> String {
    "dat".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("solutions")
}

fn default_report_file() -> String {
    "batch_results.csv".to_string()
}

fn default_max_errors_shown() -> usize {
    3
}

fn default_max_remote_errors_shown() -> usize {
    2
}

impl ApiConfig {
    /// @ai:intent Timeout for the liveness probe
    /// @ai:effects pure
    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    /// @ai:intent Timeout for a verification upload
    /// @ai:effects pure
    pub fn verify_timeout(&self) -> Duration {
        Duration::from_secs(self.verify_timeout_secs)
    }

    /// @ai:intent Timeout for an instance generation request
    /// @ai:effects pure
    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }
}

impl BatchConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
