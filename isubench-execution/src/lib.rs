//! isubench execution engine
//!
//! Worker pools that repeatedly run scenarios against the target, the
//! request actions those scenarios are made of, and the [`Benchmark`]
//! runner that strings the prepare, load and validation phases together.

pub mod actions;
pub mod benchmark;
pub mod error;
pub mod random;
pub mod scenario;
pub mod worker;

// Re-export main types
pub use benchmark::Benchmark;
pub use error::{ExecutionError, ExecutionResult};
pub use scenario::{Scenario, INVALID_CREDENTIALS_MESSAGE};
pub use worker::{Worker, WorkerOptions};
