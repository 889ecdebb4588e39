//! Core domain of isubench
//!
//! Entity models and their ordered registries, the failure taxonomy, the
//! response validation pipeline, and the score ledger with the final verdict.

pub mod error;
pub mod failure;
pub mod model;
pub mod registry;
pub mod result;
pub mod score;
pub mod validation;

// Re-export commonly used types at the crate root
pub use error::{BenchError, BenchResult};
pub use failure::{Failure, FailureKind};
pub use model::{Comment, Entity, Post, User};
pub use registry::Registry;
pub use result::{
    BenchmarkResult, Classification, DeductionClassifier, FailureClassifier, Verdict,
};
pub use score::{BenchmarkStep, ScoreTag};
pub use validation::{validate_response, ResponseCheck, ValidationError};
