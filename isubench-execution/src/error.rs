//! Error types for benchmark execution

use isubench_core::BenchError;
use thiserror::Error;

/// Benchmark execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Invalid worker options: {0}")]
    InvalidOptions(String),

    #[error("Fixture generation failed: {0}")]
    FixtureError(#[from] png::EncodingError),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error(transparent)]
    Bench(#[from] BenchError),
}

// Convert from agent setup errors
impl From<isubench_http::HttpError> for ExecutionError {
    fn from(err: isubench_http::HttpError) -> Self {
        Self::ConfigurationError(err.to_string())
    }
}

/// Result type for execution operations
pub type ExecutionResult<T> = Result<T, ExecutionError>;
