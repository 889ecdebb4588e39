//! HTTP error types

/// Error type for HTTP operations
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Response body unavailable: {0}")]
    BodyUnavailable(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl HttpError {
    /// Whether the exchange ran past the agent's timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, HttpError::NetworkError(e) if e.is_timeout())
    }
}

impl From<isubench_config::ConfigError> for HttpError {
    fn from(e: isubench_config::ConfigError) -> Self {
        HttpError::ConfigError(e.to_string())
    }
}

/// Result type for HTTP operations
pub type HttpResult<T> = Result<T, HttpError>;
