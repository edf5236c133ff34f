//! Report formatting for evaluation results and rankings.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{LeaderboardEntry, RecentView, Score};
use crate::service::EvaluationRecord;

/// Status of a repository clone or local load operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum CloneStatus {
    /// Clone operation has not started.
    Pending,
    /// Repository was cloned successfully.
    Cloned,
    /// Repository was loaded from a local path.
    Local,
    /// Repository was not fetched because a cached result was used.
    Cached,
    /// Clone or load failed with an error message.
    Failed(String),
}

/// Evaluation report for one repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoReport {
    /// Repository source (URL or path).
    pub source: String,
    /// Key the result is cached and ranked under.
    pub repo_key: String,
    /// Local path used for evaluation.
    pub path: PathBuf,
    /// Clone status.
    pub clone_status: CloneStatus,
    /// Graded evaluation, when one was produced.
    pub evaluation: Option<EvaluationRecord>,
    /// Whether `evaluation` came from the cache.
    pub from_cache: bool,
    /// Errors that prevented or degraded the evaluation.
    pub errors: Vec<String>,
}

impl RepoReport {
    /// Create a new report for a repository.
    pub fn new(source: String, repo_key: String, path: PathBuf) -> Self {
        Self {
            source,
            repo_key,
            path,
            clone_status: CloneStatus::Pending,
            evaluation: None,
            from_cache: false,
            errors: Vec::new(),
        }
    }

    /// Create a report for a failed repository.
    pub fn failed(source: String, path: PathBuf, error: impl Into<String>) -> Self {
        let repo_key = source.clone();
        Self {
            clone_status: CloneStatus::Failed(error.into()),
            ..Self::new(source, repo_key, path)
        }
    }

    /// Aggregate percentage, if evaluated.
    pub fn percentage(&self) -> Option<f64> {
        self.evaluation
            .as_ref()
            .map(|record| record.result.average * 100.0)
    }
}

/// Render evaluation reports as Markdown.
pub fn render_report_markdown(reports: &[RepoReport]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Report Card\n");
    for report in reports {
        let _ = writeln!(output, "## {}\n", report.source);
        append_clone_status(&mut output, &report.clone_status, &report.path);
        match &report.evaluation {
            Some(record) => {
                let result = &record.result;
                let _ = writeln!(
                    output,
                    "**Grade: {}** ({:.1}%) over {} file(s), {} file(s) with issues",
                    result.grade,
                    result.average * 100.0,
                    result.files_analyzed,
                    result.issue_count
                );
                let _ = writeln!(
                    output,
                    "\nLast refresh: {}{}\n",
                    record.last_refresh.to_rfc3339(),
                    if report.from_cache { " (cached)" } else { "" }
                );
                append_score_table(&mut output, &result.scores);
                for score in &result.scores {
                    append_score_details(&mut output, score);
                }
            }
            None => {
                let _ = writeln!(output, "No evaluation available.\n");
            }
        }
        append_errors(&mut output, &report.errors);
        let _ = writeln!(output);
    }
    output
}

/// Render leaderboard entries as a Markdown table.
pub fn render_leaderboard_markdown(entries: &[LeaderboardEntry]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Leaderboard\n");
    if entries.is_empty() {
        let _ = writeln!(output, "No repositories ranked yet.");
        return output;
    }
    let _ = writeln!(output, "| Rank | Repository | Score | Files |");
    let _ = writeln!(output, "|---:|---|---:|---:|");
    for (index, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            output,
            "| {} | {} | {:.2}% | {} |",
            index + 1,
            entry.repo_key,
            entry.score,
            entry.file_count
        );
    }
    output
}

/// Render recently evaluated repositories as a Markdown list.
pub fn render_recent_markdown(views: &[RecentView]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# Recently Evaluated\n");
    if views.is_empty() {
        let _ = writeln!(output, "Nothing evaluated yet.");
        return output;
    }
    for view in views {
        let _ = writeln!(output, "- {}", view.repo_key);
    }
    output
}

/// Render any serializable report payload as JSON.
pub fn render_json<T: Serialize + ?Sized>(payload: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(payload)
}

fn append_clone_status(output: &mut String, status: &CloneStatus, path: &Path) {
    let _ = writeln!(output, "- Path: `{}`", path.display());
    match status {
        CloneStatus::Cloned => {
            let _ = writeln!(output, "- Status: cloned");
        }
        CloneStatus::Local => {
            let _ = writeln!(output, "- Status: local");
        }
        CloneStatus::Cached => {
            let _ = writeln!(output, "- Status: cached");
        }
        CloneStatus::Pending => {
            let _ = writeln!(output, "- Status: pending");
        }
        CloneStatus::Failed(error) => {
            let _ = writeln!(output, "- Status: failed ({error})");
        }
    }
    let _ = writeln!(output);
}

fn append_score_table(output: &mut String, scores: &[Score]) {
    let _ = writeln!(output, "| Check | Weight | Score | Files with issues |");
    let _ = writeln!(output, "|---|---:|---:|---:|");
    for score in scores {
        let percentage = match &score.error {
            Some(_) => "error".to_string(),
            None => format!("{:.0}%", score.percentage * 100.0),
        };
        let _ = writeln!(
            output,
            "| {} | {:.2} | {} | {} |",
            score.name,
            score.weight,
            percentage,
            score.file_summaries.len()
        );
    }
    let _ = writeln!(output);
}

fn append_score_details(output: &mut String, score: &Score) {
    if score.file_summaries.is_empty() && score.error.is_none() {
        return;
    }
    let _ = writeln!(output, "### {}\n", score.name);
    if let Some(error) = &score.error {
        let _ = writeln!(output, "Check failed: {error}\n");
    }
    for summary in &score.file_summaries {
        let label = if summary.filename.is_empty() {
            "(repository)"
        } else {
            summary.filename.as_str()
        };
        if summary.file_url.is_empty() {
            let _ = writeln!(output, "- `{label}`");
        } else {
            let _ = writeln!(output, "- [`{label}`]({})", summary.file_url);
        }
        for issue in &summary.issues {
            if issue.line == 0 {
                let _ = writeln!(output, "  - {}", issue.message);
            } else {
                let _ = writeln!(output, "  - line {}: {}", issue.line, issue.message);
            }
        }
    }
    let _ = writeln!(output);
}

fn append_errors(output: &mut String, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    let _ = writeln!(output, "### Errors");
    for error in errors {
        let _ = writeln!(output, "- {error}");
    }
    let _ = writeln!(output);
}
