//! Final verdict of a run

use crate::failure::Failure;
use crate::score::{BenchmarkStep, ScoreTag};
use std::collections::BTreeMap;

/// Everything a finished run produced
#[derive(Debug, Clone, Default)]
pub struct BenchmarkResult {
    pub scores: BTreeMap<ScoreTag, u64>,
    pub failures: Vec<Failure>,
    /// Preparation error that stopped the run before the load phase
    pub fatal: Option<String>,
}

impl BenchmarkResult {
    pub fn from_step(step: &BenchmarkStep, fatal: Option<String>) -> Self {
        Self {
            scores: step.score_breakdown(),
            failures: step.failures(),
            fatal,
        }
    }

    /// Sum of every tag count
    pub fn raw_score(&self) -> u64 {
        self.scores.values().sum()
    }
}

/// How a failure weighs on the verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Rejects the run outright
    Critical,
    /// Rejects the run outright
    Timeout,
    /// Subtracts one point
    Deduction,
}

/// Policy point deciding how each failure is weighed
pub trait FailureClassifier {
    fn classify(&self, failure: &Failure) -> Classification;
}

/// Counts every failure as a deduction
#[derive(Debug, Clone, Copy, Default)]
pub struct DeductionClassifier;

impl FailureClassifier for DeductionClassifier {
    fn classify(&self, _failure: &Failure) -> Classification {
        Classification::Deduction
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Raw score minus deductions, never below zero
    pub total: i64,
    pub deductions: u64,
    pub critical: u64,
    pub timeouts: u64,
    pub accepted: bool,
}

impl Verdict {
    pub fn judge(result: &BenchmarkResult, classifier: &dyn FailureClassifier) -> Self {
        let (mut critical, mut timeouts, mut deductions) = (0u64, 0u64, 0u64);
        for failure in &result.failures {
            match classifier.classify(failure) {
                Classification::Critical => critical += 1,
                Classification::Timeout => timeouts += 1,
                Classification::Deduction => deductions += 1,
            }
        }

        let total = (result.raw_score() as i64 - deductions as i64).max(0);
        let accepted = total >= 0 && critical == 0 && timeouts == 0 && result.fatal.is_none();

        Self {
            total,
            deductions,
            critical,
            timeouts,
            accepted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::failure::FailureKind;

    struct StrictClassifier;

    impl FailureClassifier for StrictClassifier {
        fn classify(&self, failure: &Failure) -> Classification {
            match failure.kind {
                FailureKind::PostOrder => Classification::Critical,
                FailureKind::Request if failure.timeout => Classification::Timeout,
                _ => Classification::Deduction,
            }
        }
    }

    fn result(scores: &[(ScoreTag, u64)], failures: &[FailureKind]) -> BenchmarkResult {
        BenchmarkResult {
            scores: scores.iter().copied().collect(),
            failures: failures
                .iter()
                .map(|kind| Failure::new(*kind, "x"))
                .collect(),
            fatal: None,
        }
    }

    #[test]
    fn test_deductions_reduce_score() {
        let result = result(
            &[(ScoreTag::GetLogin, 10), (ScoreTag::PostLogin, 5)],
            &[FailureKind::StatusCode, FailureKind::Asset],
        );

        let verdict = Verdict::judge(&result, &DeductionClassifier);
        assert_eq!(result.raw_score(), 15);
        assert_eq!(verdict.total, 13);
        assert_eq!(verdict.deductions, 2);
        assert!(verdict.accepted);
    }

    #[test]
    fn test_total_is_clamped() {
        let result = result(&[(ScoreTag::GetRoot, 1)], &[FailureKind::NotFound; 5]);
        let verdict = Verdict::judge(&result, &DeductionClassifier);
        assert_eq!(verdict.total, 0);
        assert!(verdict.accepted);
    }

    #[test]
    fn test_critical_failure_rejects() {
        let result = result(&[(ScoreTag::GetRoot, 100)], &[FailureKind::PostOrder]);

        assert!(Verdict::judge(&result, &DeductionClassifier).accepted);

        let verdict = Verdict::judge(&result, &StrictClassifier);
        assert_eq!(verdict.critical, 1);
        assert!(!verdict.accepted);
    }

    #[test]
    fn test_fatal_error_rejects() {
        let mut result = result(&[], &[FailureKind::LoadJson]);
        result.fatal = Some("Failed to decode users.json".to_string());
        assert!(!Verdict::judge(&result, &DeductionClassifier).accepted);
    }
}
