//! Failure taxonomy
//!
//! Every problem observed during a run ends up as a [`Failure`] record:
//! preparation problems abort the run after being recorded, load-phase
//! problems are only recorded and scored.

use chrono::{DateTime, Utc};
use isubench_http::{HttpError, Method};
use std::error::Error as _;
use std::fmt;

/// Kind of a recorded failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Dump file could not be decoded
    LoadJson,
    /// Agent could not be created for a user
    Agent,
    /// Transport failure while issuing or receiving a request
    Request,
    /// Response body could not be read during a check
    Response,
    StatusCode,
    Path,
    NotFound,
    CsrfToken,
    PostOrder,
    Asset,
}

impl FailureKind {
    pub fn code(&self) -> &'static str {
        match self {
            FailureKind::LoadJson => "load-json",
            FailureKind::Agent => "agent",
            FailureKind::Request => "request",
            FailureKind::Response => "response",
            FailureKind::StatusCode => "status-code",
            FailureKind::Path => "path",
            FailureKind::NotFound => "not-found",
            FailureKind::CsrfToken => "csrf-token",
            FailureKind::PostOrder => "post-order",
            FailureKind::Asset => "asset",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One recorded failure
#[derive(Debug, Clone)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
    /// Extra detail for the admin channel, such as the underlying error chain
    pub context: Option<String>,
    /// Whether the failure was caused by a request running past its timeout
    pub timeout: bool,
    pub occurred_at: DateTime<Utc>,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: None,
            timeout: false,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Failure of an exchange that never produced a response
    pub fn request(method: &Method, path: &str, err: &HttpError) -> Self {
        let mut failure = Failure::new(FailureKind::Request, format!("{} {} : {}", method, path, err))
            .with_context(error_chain(err));
        failure.timeout = err.is_timeout();
        failure
    }

    /// Detailed rendering for the admin channel
    pub fn detail(&self) -> String {
        let mut out = format!(
            "[{}] {}: {}",
            self.occurred_at.to_rfc3339(),
            self.kind,
            self.message
        );
        if self.timeout {
            out.push_str(" (timeout)");
        }
        if let Some(context) = &self.context {
            out.push_str("\n    ");
            out.push_str(context);
        }
        out
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// `err` followed by each of its sources, joined with `: `
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
