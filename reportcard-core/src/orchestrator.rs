//! Concurrent check execution and weighted aggregation.

use std::sync::Arc;
use std::thread;

use log::{info, warn};

use crate::check::{Check, CheckFailure, CheckReport, Target};
use crate::checks::build_checks;
use crate::config::EngineConfig;
use crate::domain::{ChecksResult, FileSummary, Grade, Score};
use crate::error::Result;

/// Validate `target`, run the configured checks over it and grade the outcome.
///
/// Only a structural problem with the target (no files, missing directory) or
/// an unknown check id fails the call. Individual check failures are folded
/// into their [`Score`].
pub fn evaluate(target: &Target, config: &EngineConfig) -> Result<ChecksResult> {
    target.validate()?;
    let checks = build_checks(&config.checks, target, config.check_timeout)?;
    info!(
        "running {} check(s) over {} file(s) in {}",
        checks.len(),
        target.files.len(),
        target.dir.display()
    );
    let scores = run_checks(&checks);
    Ok(aggregate(scores, target.files.len()))
}

/// Run every check on its own thread and wait for all of them.
///
/// Returns one [`Score`] per check, in no particular order.
pub fn run_checks(checks: &[Arc<dyn Check>]) -> Vec<Score> {
    thread::scope(|scope| {
        let handles: Vec<_> = checks
            .iter()
            .map(|check| {
                let worker = Arc::clone(check);
                let handle = scope.spawn(move || worker.percentage());
                (check, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(check, handle)| match handle.join() {
                Ok(outcome) => score_from(check.as_ref(), outcome),
                Err(_) => {
                    warn!("{} panicked", check.name());
                    failed_score(check.as_ref(), "check panicked".to_string(), Vec::new())
                }
            })
            .collect()
    })
}

/// Combine per-check scores into a graded result.
///
/// Failed checks keep their weight with a zero percentage, so they pull the
/// average down. A zero total weight yields an average of zero.
pub fn aggregate(mut scores: Vec<Score>, files_analyzed: usize) -> ChecksResult {
    let total_weight: f64 = scores.iter().map(|score| score.weight).sum();
    let weighted: f64 = scores
        .iter()
        .map(|score| score.percentage * score.weight)
        .sum();
    let average = if total_weight > 0.0 {
        (weighted / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let issue_count = scores
        .iter()
        .map(|score| score.file_summaries.len())
        .sum();

    scores.sort_by(|a, b| {
        b.weight
            .total_cmp(&a.weight)
            .then_with(|| a.name.cmp(&b.name))
    });

    ChecksResult {
        scores,
        average,
        grade: Grade::from_percentage(average * 100.0),
        files_analyzed,
        issue_count,
    }
}

fn score_from(
    check: &dyn Check,
    outcome: std::result::Result<CheckReport, CheckFailure>,
) -> Score {
    match outcome {
        Ok(report) => Score {
            name: check.name().to_string(),
            description: check.description().to_string(),
            weight: check.weight(),
            percentage: report.percentage.clamp(0.0, 1.0),
            file_summaries: report.file_summaries,
            error: None,
        },
        Err(failure) => {
            warn!("{} failed: {}", check.name(), failure.error);
            failed_score(check, failure.error.to_string(), failure.partial)
        }
    }
}

fn failed_score(check: &dyn Check, error: String, partial: Vec<FileSummary>) -> Score {
    Score {
        name: check.name().to_string(),
        description: check.description().to_string(),
        weight: check.weight(),
        percentage: 0.0,
        file_summaries: partial,
        error: Some(error),
    }
}
