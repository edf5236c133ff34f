//! Check trait definitions.

use std::path::PathBuf;

use crate::domain::FileSummary;
use crate::error::{ReportCardError, Result};

/// The directory and file set a group of checks runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Root directory of the checkout.
    pub dir: PathBuf,
    /// Source files to analyze, already filtered by the caller.
    pub files: Vec<PathBuf>,
    /// Optional base link used to build per-file display URLs.
    pub file_url_base: Option<String>,
}

impl Target {
    /// Create a target for a directory and its source files.
    pub fn new(dir: impl Into<PathBuf>, files: Vec<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files,
            file_url_base: None,
        }
    }

    /// Attach a base link for per-file display URLs.
    pub fn with_file_url_base(mut self, base: impl Into<String>) -> Self {
        self.file_url_base = Some(base.into());
        self
    }

    /// Fail fast when the target cannot be evaluated at all.
    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            return Err(ReportCardError::NoFiles);
        }
        if !self.dir.is_dir() {
            return Err(ReportCardError::InvalidDirectory(self.dir.clone()));
        }
        Ok(())
    }
}

/// Successful outcome of a check run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CheckReport {
    /// Pass ratio in [0, 1].
    pub percentage: f64,
    /// Files with at least one issue.
    pub file_summaries: Vec<FileSummary>,
}

impl CheckReport {
    /// A full pass with nothing to report.
    pub fn passed() -> Self {
        Self {
            percentage: 1.0,
            file_summaries: Vec::new(),
        }
    }
}

/// A check that could not run to completion.
#[derive(Debug)]
pub struct CheckFailure {
    /// Why the check failed.
    pub error: ReportCardError,
    /// Summaries gathered before the failure.
    pub partial: Vec<FileSummary>,
}

impl CheckFailure {
    /// A failure with no partial results.
    pub fn new(error: ReportCardError) -> Self {
        Self {
            error,
            partial: Vec::new(),
        }
    }

    /// A failure that still carries the summaries already collected.
    pub fn with_partial(error: ReportCardError, partial: Vec<FileSummary>) -> Self {
        Self { error, partial }
    }
}

impl From<ReportCardError> for CheckFailure {
    fn from(error: ReportCardError) -> Self {
        Self::new(error)
    }
}

/// One pluggable analyzer bound to a [`Target`] at construction.
pub trait Check: Send + Sync {
    /// Stable identifier, e.g. `go_vet`.
    fn name(&self) -> &str;
    /// Human-readable description.
    fn description(&self) -> &str;
    /// Relative weight in the aggregate score, in [0, 1].
    fn weight(&self) -> f64;
    /// Run the analyzer once. Implementations must not block past their own timeout.
    fn percentage(&self) -> std::result::Result<CheckReport, CheckFailure>;
}

#[cfg(test)]
mod tests {
    use super::Target;
    use crate::error::ReportCardError;
    use std::path::PathBuf;

    #[test]
    fn validate_rejects_empty_file_list() {
        let target = Target::new(std::env::temp_dir(), Vec::new());
        assert!(matches!(target.validate(), Err(ReportCardError::NoFiles)));
    }

    #[test]
    fn validate_rejects_missing_directory() {
        let target = Target::new(
            "/definitely/not/a/reportcard/dir",
            vec![PathBuf::from("main.go")],
        );
        assert!(matches!(
            target.validate(),
            Err(ReportCardError::InvalidDirectory(_))
        ));
    }

    #[test]
    fn validate_accepts_existing_directory_with_files() {
        let target = Target::new(std::env::temp_dir(), vec![PathBuf::from("main.go")]);
        assert!(target.validate().is_ok());
    }
}
