//! Domain-specific configuration modules

pub mod fixtures;
pub mod load;
pub mod logging;
pub mod target;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main benchmarker configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BenchConfig {
    /// Target web service configuration
    #[serde(default)]
    pub target: target::TargetConfig,

    /// Load phase and worker pool configuration
    #[serde(default)]
    pub load: load::LoadConfig,

    /// Dump files loaded during preparation
    #[serde(default)]
    pub fixtures: fixtures::FixturesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl BenchConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.target.validate()?;
        self.load.validate()?;
        self.fixtures.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Render the effective options the way they would be passed on the command line
    pub fn to_flags(&self) -> String {
        let args = [
            "isubench".to_string(),
            format!("--target-host={}", self.target.host),
            format!(
                "--request-timeout={}",
                humantime::format_duration(self.target.request_timeout)
            ),
            format!(
                "--initialize-request-timeout={}",
                humantime::format_duration(self.target.initialize_request_timeout)
            ),
            format!("--exit-error-on-fail={}", self.load.exit_error_on_fail),
            format!(
                "--load-duration={}",
                humantime::format_duration(self.load.duration)
            ),
        ];

        args.join(" ")
    }
}
