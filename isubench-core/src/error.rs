//! Core error types for isubench

use crate::failure::FailureKind;
use isubench_http::HttpError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a benchmark phase
#[derive(Debug, Error)]
pub enum BenchError {
    /// Dump file could not be opened
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Dump file is not a JSON array of entities
    #[error("Failed to decode {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Dump contained an entity the registry refused
    #[error("Invalid entity at index {index}: id must be positive")]
    InvalidEntity { index: usize },

    /// Agent creation failed
    #[error("Agent error: {0}")]
    Agent(#[source] HttpError),

    /// Exchange with the target failed
    #[error("Request error: {0}")]
    Request(#[source] HttpError),
}

/// Result type alias for isubench-core
pub type BenchResult<T> = std::result::Result<T, BenchError>;

impl BenchError {
    /// Failure kind this error is recorded under
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            BenchError::Io { .. } | BenchError::Json { .. } | BenchError::InvalidEntity { .. } => {
                FailureKind::LoadJson
            }
            BenchError::Agent(_) => FailureKind::Agent,
            BenchError::Request(_) => FailureKind::Request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kinds() {
        assert_eq!(
            BenchError::InvalidEntity { index: 3 }.failure_kind(),
            FailureKind::LoadJson
        );
        assert_eq!(
            BenchError::Agent(HttpError::Cancelled).failure_kind(),
            FailureKind::Agent
        );
        assert_eq!(
            BenchError::Request(HttpError::Cancelled).failure_kind(),
            FailureKind::Request
        );
    }
}
