//! Agent configuration

use crate::errors::HttpResult;
use isubench_config::TargetConfig;
use std::time::Duration;
use url::Url;

/// Settings of one agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL request paths are resolved against
    pub base_url: Url,

    /// Whole-exchange timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,

    /// Idle connections kept per host
    pub max_idle_per_host: usize,
}

impl AgentConfig {
    /// Agent settings for load-phase requests against `target`
    pub fn from_target(target: &TargetConfig) -> HttpResult<Self> {
        Ok(Self {
            base_url: target.base_url()?,
            timeout: target.request_timeout,
            user_agent: target.user_agent.clone(),
            max_idle_per_host: target.max_idle_per_host,
        })
    }

    /// Same settings with a different timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://localhost:8080/").expect("constant URL is valid"),
            timeout: Duration::from_secs(3),
            user_agent: concat!("isubench/", env!("CARGO_PKG_VERSION")).to_string(),
            max_idle_per_host: 8,
        }
    }
}
