//! Domain entities for ReportCard.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single problem reported by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Source line of the problem; 0 means the issue applies to the whole file.
    pub line: u32,
    /// Human-readable description of the problem.
    pub message: String,
}

impl Issue {
    /// Create an issue pinned to a specific line.
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }

    /// Create a file-level issue with no specific line.
    pub fn file_level(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }
}

/// All issues one check reported for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    /// Filename relative to the analyzed root. Empty for repository-level findings.
    pub filename: String,
    /// Optional link used when displaying the file.
    #[serde(default, rename = "fileURL")]
    pub file_url: String,
    /// Issues in the order the tool reported them.
    pub issues: Vec<Issue>,
}

impl FileSummary {
    /// Create an empty summary for a file.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            file_url: String::new(),
            issues: Vec::new(),
        }
    }

    /// Create a repository-level summary pointing at a help link.
    pub fn repo_level(file_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            filename: String::new(),
            file_url: file_url.into(),
            issues: vec![Issue::file_level(message)],
        }
    }
}

/// The result of running a single check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    /// Check identifier.
    pub name: String,
    /// Human-readable description of the check.
    pub description: String,
    /// Relative weight in the aggregate, in [0, 1].
    pub weight: f64,
    /// Pass ratio, in [0, 1]. Always 0 when `error` is set.
    pub percentage: f64,
    /// Files with at least one issue.
    pub file_summaries: Vec<FileSummary>,
    /// Set when the check itself failed to execute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Letter grade derived from an aggregate percentage.
///
/// Variants are declared worst to best so the derived ordering ranks a
/// better grade higher.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
pub enum Grade {
    /// 40% or lower.
    #[serde(rename = "F")]
    F,
    /// Above 40%.
    #[serde(rename = "E")]
    E,
    /// Above 50%.
    #[serde(rename = "D")]
    D,
    /// Above 60%.
    #[serde(rename = "C")]
    C,
    /// Above 70%.
    #[serde(rename = "B")]
    B,
    /// Above 80%.
    #[serde(rename = "A")]
    A,
    /// Above 90%.
    #[serde(rename = "A+")]
    APlus,
}

impl Grade {
    /// Map a percentage in [0, 100] to a grade.
    pub fn from_percentage(percentage: f64) -> Self {
        match percentage {
            p if p > 90.0 => Self::APlus,
            p if p > 80.0 => Self::A,
            p if p > 70.0 => Self::B,
            p if p > 60.0 => Self::C,
            p if p > 50.0 => Self::D,
            p if p > 40.0 => Self::E,
            _ => Self::F,
        }
    }

    /// Letter representation of the grade.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregated, graded result of running every configured check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChecksResult {
    /// Per-check scores, sorted by descending weight.
    pub scores: Vec<Score>,
    /// Weighted average of all percentages, in [0, 1].
    pub average: f64,
    /// Grade derived from `average * 100`.
    pub grade: Grade,
    /// Number of files handed to the checks.
    pub files_analyzed: usize,
    /// Number of (check, file) pairs with at least one issue.
    pub issue_count: usize,
}

/// A ranked repository on the leaderboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// Repository identifier.
    pub repo_key: String,
    /// Score in percent (`average * 100`).
    pub score: f64,
    /// Number of files analyzed for the repository.
    pub file_count: usize,
}

/// A recently evaluated repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentView {
    /// Repository identifier.
    pub repo_key: String,
}
