//! CLI argument parsing definitions

use anyhow::{Context, Result};
use clap::Parser;
use isubench_config::{BenchConfig, FixturesConfig, LogLevel};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "isubench", author, version, about = "Load benchmarker for private-isu", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Target host with port
    #[arg(long, value_name = "HOST")]
    pub target_host: Option<String>,

    /// Timeout of each load-phase request (example: --request-timeout=3s)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub request_timeout: Option<Duration>,

    /// Timeout of GET /initialize
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub initialize_request_timeout: Option<Duration>,

    /// Exit with status 1 when the run is rejected
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub exit_error_on_fail: Option<bool>,

    /// Duration of the load phase
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub load_duration: Option<Duration>,

    /// Directory holding users.json, posts.json and comments.json
    #[arg(long, value_name = "PATH")]
    pub fixtures_dir: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// Apply the flags given on the command line on top of `config`
    pub fn apply(&self, config: &mut BenchConfig) -> Result<()> {
        if let Some(host) = &self.target_host {
            config.target.host = host.clone();
        }
        if let Some(timeout) = self.request_timeout {
            config.target.request_timeout = timeout;
        }
        if let Some(timeout) = self.initialize_request_timeout {
            config.target.initialize_request_timeout = timeout;
        }
        if let Some(exit_error_on_fail) = self.exit_error_on_fail {
            config.load.exit_error_on_fail = exit_error_on_fail;
        }
        if let Some(duration) = self.load_duration {
            config.load.duration = duration;
        }
        if let Some(dir) = &self.fixtures_dir {
            config.fixtures = FixturesConfig::in_dir(dir);
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level
                .parse::<LogLevel>()
                .map_err(anyhow::Error::msg)
                .context("Invalid --log-level")?;
        }

        config
            .validate_all()
            .context("Invalid command line options")?;
        Ok(())
    }
}
