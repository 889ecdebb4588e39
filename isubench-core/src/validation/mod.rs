//! Response validation pipeline
//!
//! A [`ResponseCheck`] inspects one completed response and may report a
//! [`ValidationError`]. [`validate_response`] runs every check it is given,
//! without stopping at the first failure, and returns the resulting tree.
//! The caller decides whether the scenario goes on by asking
//! [`ValidationError::is_empty`].

pub mod checks;

use crate::failure::Failure;
use crate::score::BenchmarkStep;
use async_trait::async_trait;
use isubench_http::Response;
use std::fmt;

pub use checks::{
    asset_digests, ExpectAssets, ExpectBodyContains, ExpectCsrfToken, ExpectLocation,
    ExpectOrderedPosts, ExpectStatus,
};

/// Tree of failures produced by validating one response
#[derive(Debug, Clone)]
pub enum ValidationError {
    Failure(Failure),
    Group(Vec<ValidationError>),
}

impl ValidationError {
    /// A tree without any failure
    pub fn empty() -> Self {
        ValidationError::Group(Vec::new())
    }

    /// True iff no failure exists anywhere in the tree
    pub fn is_empty(&self) -> bool {
        match self {
            ValidationError::Failure(_) => false,
            ValidationError::Group(children) => children.iter().all(ValidationError::is_empty),
        }
    }

    /// Every failure in the tree, depth first
    pub fn failures(&self) -> Vec<&Failure> {
        let mut out = Vec::new();
        self.collect(&mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Failure>) {
        match self {
            ValidationError::Failure(failure) => out.push(failure),
            ValidationError::Group(children) => {
                for child in children {
                    child.collect(out);
                }
            }
        }
    }

    /// Push every failure in the tree into the step's sink
    pub fn record(&self, step: &BenchmarkStep) {
        for failure in self.failures() {
            step.add_failure(failure.clone());
        }
    }
}

impl From<Failure> for ValidationError {
    fn from(failure: Failure) -> Self {
        ValidationError::Failure(failure)
    }
}

impl From<Vec<Failure>> for ValidationError {
    fn from(failures: Vec<Failure>) -> Self {
        ValidationError::Group(failures.into_iter().map(ValidationError::Failure).collect())
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.failures().iter().map(|failure| failure.to_string()).collect();
        f.write_str(&messages.join("\n"))
    }
}

/// One check applied to a completed response
#[async_trait]
pub trait ResponseCheck: Send + Sync {
    async fn check(&self, res: &Response) -> Option<ValidationError>;
}

/// Run every check against `res` and collect what they report
pub async fn validate_response(res: &Response, checks: &[&dyn ResponseCheck]) -> ValidationError {
    let mut errors = Vec::new();
    for check in checks {
        if let Some(error) = check.check(res).await {
            errors.push(error);
        }
    }
    ValidationError::Group(errors)
}
