//! Domain-driven configuration management for isubench
//!
//! This crate provides modular configuration split by functional domains
//! (target service, load policy, fixtures, logging), with validation,
//! defaults, YAML loading and environment variable overrides.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    fixtures::FixturesConfig,
    load::{LoadConfig, LoopPolicy, PoolConfig},
    logging::{LogFormat, LogLevel, LoggingConfig},
    target::TargetConfig,
    BenchConfig,
};
