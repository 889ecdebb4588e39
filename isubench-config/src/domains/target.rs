//! Target web service configuration

use crate::error::ConfigResult;
use crate::validation::{
    validate_duration, validate_enum_choice, validate_positive, validate_required_string,
    validate_url, Validatable,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Where the benchmark is pointed and how each agent talks to it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Target host with port, e.g. `localhost:8080`
    #[serde(default = "default_host")]
    pub host: String,

    /// URL scheme used to reach the host
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Timeout applied to every load-phase request
    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Timeout applied to `GET /initialize`
    #[serde(with = "humantime_serde", default = "default_initialize_request_timeout")]
    pub initialize_request_timeout: Duration,

    /// User agent string sent by every agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum idle connections kept per host by each agent
    #[serde(default = "default_max_idle_per_host")]
    pub max_idle_per_host: usize,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            scheme: default_scheme(),
            request_timeout: default_request_timeout(),
            initialize_request_timeout: default_initialize_request_timeout(),
            user_agent: default_user_agent(),
            max_idle_per_host: default_max_idle_per_host(),
        }
    }
}

impl TargetConfig {
    /// Base URL every agent resolves request paths against
    pub fn base_url(&self) -> ConfigResult<Url> {
        Ok(Url::parse(&format!("{}://{}/", self.scheme, self.host))?)
    }
}

impl Validatable for TargetConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.host, "host", self.domain_name())?;
        validate_enum_choice(&self.scheme, &["http", "https"], "scheme", self.domain_name())?;
        validate_url(
            &format!("{}://{}/", self.scheme, self.host),
            "host",
            self.domain_name(),
        )?;

        validate_duration(self.request_timeout, "request_timeout", self.domain_name())?;
        validate_duration(
            self.initialize_request_timeout,
            "initialize_request_timeout",
            self.domain_name(),
        )?;

        validate_required_string(&self.user_agent, "user_agent", self.domain_name())?;
        validate_positive(
            self.max_idle_per_host,
            "max_idle_per_host",
            self.domain_name(),
        )?;

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "target"
    }
}

// Default value functions
fn default_host() -> String {
    "localhost:8080".to_string()
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_initialize_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    concat!("isubench/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_idle_per_host() -> usize {
    8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_config_defaults() {
        let config = TargetConfig::default();
        assert_eq!(config.host, "localhost:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.initialize_request_timeout, Duration::from_secs(10));
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "http://localhost:8080/"
        );
    }

    #[test]
    fn test_target_config_validation() {
        let mut config = TargetConfig::default();
        assert!(config.validate().is_ok());

        config.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        config = TargetConfig::default();
        config.scheme = "gopher".to_string();
        assert!(config.validate().is_err());

        config = TargetConfig::default();
        config.host = String::new();
        assert!(config.validate().is_err());
    }
}
