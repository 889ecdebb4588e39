//! Score ledger and failure sink shared by every worker of a run

use crate::failure::Failure;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::debug;

/// Scenario step credited once per successfully validated response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScoreTag {
    GetLogin,
    PostLogin,
    GetRoot,
    PostRoot,
}

impl ScoreTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTag::GetLogin => "GET /login",
            ScoreTag::PostLogin => "POST /login",
            ScoreTag::GetRoot => "GET /",
            ScoreTag::PostRoot => "POST /",
        }
    }
}

impl fmt::Display for ScoreTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write-many, read-at-end accumulator for one benchmark run
#[derive(Debug, Default)]
pub struct BenchmarkStep {
    scores: Mutex<HashMap<ScoreTag, u64>>,
    failures: Mutex<Vec<Failure>>,
}

impl BenchmarkStep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_score(&self, tag: ScoreTag) {
        *self.scores.lock().entry(tag).or_insert(0) += 1;
    }

    pub fn add_failure(&self, failure: Failure) {
        debug!(kind = %failure.kind, "{}", failure.message);
        self.failures.lock().push(failure);
    }

    /// Count per tag, ordered by tag
    pub fn score_breakdown(&self) -> BTreeMap<ScoreTag, u64> {
        self.scores.lock().iter().map(|(tag, count)| (*tag, *count)).collect()
    }

    pub fn failures(&self) -> Vec<Failure> {
        self.failures.lock().clone()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.lock().len()
    }
}
