//! Error types for ReportCard core.

use std::path::PathBuf;
use std::{error::Error, fmt, io};

/// Error type for ReportCard core operations.
#[derive(Debug)]
pub enum ReportCardError {
    /// An underlying I/O error.
    Io(io::Error),
    /// A JSON (de)serialization error.
    Json(serde_json::Error),
    /// The evaluation was given no files to analyze.
    NoFiles,
    /// The evaluation root is missing or not a directory.
    InvalidDirectory(PathBuf),
    /// An external tool could not be found on `PATH`.
    ToolNotFound(String),
    /// An external tool exited with an unexpected status.
    ToolFailed {
        /// Tool program name.
        tool: String,
        /// Exit status description.
        status: String,
        /// Merged stdout/stderr, possibly empty.
        output: String,
    },
    /// An external tool exceeded its deadline and was killed.
    Timeout {
        /// Tool program name.
        tool: String,
        /// Deadline in seconds.
        seconds: u64,
    },
    /// A check id that does not match any known check.
    UnknownCheck(String),
    /// The backing cache store failed.
    Cache(String),
    /// A catch-all error with a message.
    Other(String),
}

impl fmt::Display for ReportCardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::NoFiles => write!(f, "no source files found to analyze"),
            Self::InvalidDirectory(path) => {
                write!(f, "not a readable directory: {}", path.display())
            }
            Self::ToolNotFound(tool) => write!(f, "{tool} not found; is it installed?"),
            Self::ToolFailed {
                tool,
                status,
                output,
            } => {
                if output.is_empty() {
                    write!(f, "{tool} failed with {status}")
                } else {
                    write!(f, "{tool} failed with {status}: {output}")
                }
            }
            Self::Timeout { tool, seconds } => write!(f, "{tool} timed out after {seconds}s"),
            Self::UnknownCheck(id) => write!(f, "unknown check: {id}"),
            Self::Cache(message) => write!(f, "cache error: {message}"),
            Self::Other(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ReportCardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ReportCardError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ReportCardError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl ReportCardError {
    /// Whether the error means the evaluation could not start at all.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::NoFiles | Self::InvalidDirectory(_))
    }
}

/// Convenience result type for ReportCard core.
pub type Result<T> = std::result::Result<T, ReportCardError>;

#[cfg(test)]
mod tests {
    use super::ReportCardError;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn io_error_formats_message() {
        let error = ReportCardError::Io(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(format!("{error}"), "io error: boom");
    }

    #[test]
    fn tool_failure_includes_output_when_present() {
        let error = ReportCardError::ToolFailed {
            tool: "go".to_string(),
            status: "exit status: 2".to_string(),
            output: "can't load package".to_string(),
        };
        assert_eq!(
            format!("{error}"),
            "go failed with exit status: 2: can't load package"
        );

        let silent = ReportCardError::ToolFailed {
            tool: "go".to_string(),
            status: "exit status: 2".to_string(),
            output: String::new(),
        };
        assert_eq!(format!("{silent}"), "go failed with exit status: 2");
    }

    #[test]
    fn timeout_formats_deadline() {
        let error = ReportCardError::Timeout {
            tool: "gocyclo".to_string(),
            seconds: 3,
        };
        assert_eq!(format!("{error}"), "gocyclo timed out after 3s");
    }

    #[test]
    fn from_io_error_maps_variant() {
        let error: ReportCardError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
        match error {
            ReportCardError::Io(inner) => {
                assert_eq!(inner.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected Io variant, got {other:?}"),
        }
    }

    #[test]
    fn structural_errors_are_flagged() {
        assert!(ReportCardError::NoFiles.is_structural());
        assert!(ReportCardError::InvalidDirectory(PathBuf::from("/nope")).is_structural());
        assert!(!ReportCardError::Cache("down".to_string()).is_structural());
    }
}
