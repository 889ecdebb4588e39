//! Load phase configuration

use crate::error::ConfigResult;
use crate::validation::{validate_duration, validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Load phase configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    /// Total wall-clock duration of the load phase
    #[serde(with = "humantime_serde", default = "default_duration")]
    pub duration: Duration,

    /// Exit with a non-zero status when the run is rejected
    #[serde(default = "crate::domains::utils::default_true")]
    pub exit_error_on_fail: bool,

    /// Pool running login-success followed by post-image
    #[serde(default = "default_login_success_pool")]
    pub login_success: PoolConfig,

    /// Pool running login-failure
    #[serde(default = "default_login_failure_pool")]
    pub login_failure: PoolConfig,

    /// Pool running the ordered-feed check
    #[serde(default = "default_ordered_feed_pool")]
    pub ordered_feed: PoolConfig,
}

/// Loop and parallelism policy of one worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Fixed iteration count; absent means loop until cancelled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iterations: Option<u32>,

    /// Maximum number of simultaneously in-flight iterations
    pub max_parallelism: usize,
}

/// How many iterations a pool runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPolicy {
    /// Run exactly this many iterations (or fewer if cancelled)
    Count(u32),
    /// Run until the cancellation signal fires
    Infinite,
}

impl PoolConfig {
    /// Pool that loops until cancelled
    pub fn infinite(max_parallelism: usize) -> Self {
        Self {
            iterations: None,
            max_parallelism,
        }
    }

    /// Pool that runs a fixed number of iterations
    pub fn count(iterations: u32, max_parallelism: usize) -> Self {
        Self {
            iterations: Some(iterations),
            max_parallelism,
        }
    }

    pub fn loop_policy(&self) -> LoopPolicy {
        match self.iterations {
            Some(n) => LoopPolicy::Count(n),
            None => LoopPolicy::Infinite,
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            exit_error_on_fail: true,
            login_success: default_login_success_pool(),
            login_failure: default_login_failure_pool(),
            ordered_feed: default_ordered_feed_pool(),
        }
    }
}

impl Validatable for LoadConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_duration(self.duration, "duration", self.domain_name())?;

        self.login_success.validate()?;
        self.login_failure.validate()?;
        self.ordered_feed.validate()?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load"
    }
}

impl Validatable for PoolConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.max_parallelism, "max_parallelism", self.domain_name())
    }

    fn domain_name(&self) -> &'static str {
        "load.pool"
    }
}

// Default value functions
fn default_duration() -> Duration {
    Duration::from_secs(60)
}

fn default_login_success_pool() -> PoolConfig {
    PoolConfig::infinite(4)
}

fn default_login_failure_pool() -> PoolConfig {
    PoolConfig::count(20, 2)
}

fn default_ordered_feed_pool() -> PoolConfig {
    PoolConfig::infinite(2)
}
