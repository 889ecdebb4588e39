//! Final report printed after a run

use isubench_core::{BenchmarkResult, DeductionClassifier, Verdict};
use isubench_logging::{admin, contestant};

/// Print every failure on both channels, the score breakdown and the verdict
pub fn print_report(result: &BenchmarkResult) -> Verdict {
    for failure in &result.failures {
        contestant!("{}", failure);
        admin!("{}", failure.detail());
    }

    for (tag, count) in &result.scores {
        admin!("SCORE: {}: {}", tag, count);
    }

    let verdict = Verdict::judge(result, &DeductionClassifier);
    admin!(
        raw = result.raw_score(),
        deductions = verdict.deductions,
        critical = verdict.critical,
        timeouts = verdict.timeouts,
        "Score summary"
    );

    if let Some(fatal) = &result.fatal {
        contestant!("fatal: {}", fatal);
    }
    contestant!("score: {}", verdict.total);
    contestant!("{}", if verdict.accepted { "pass" } else { "fail" });

    verdict
}

/// Process exit status for a finished run
pub fn exit_code(result: &BenchmarkResult, verdict: &Verdict, exit_error_on_fail: bool) -> u8 {
    if result.fatal.is_some() || (!verdict.accepted && exit_error_on_fail) {
        1
    } else {
        0
    }
}
