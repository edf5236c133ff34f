#![deny(missing_docs)]
//! Report Card core library.
//!
//! Runs a panel of code quality checks over a source tree, normalizes their
//! output into a common issue model, grades the weighted result and keeps a
//! bounded leaderboard and recency list of evaluated repositories.

pub mod cache;
pub mod check;
pub mod checks;
pub mod command;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs;
pub mod inspector;
pub mod leaderboard;
pub mod normalize;
pub mod orchestrator;
pub mod rankings;
pub mod recent;
pub mod report;
pub mod schema;
pub mod service;

pub use cache::{Cache, FileCache, MemoryCache};
pub use check::{Check, CheckFailure, CheckReport, Target};
pub use checks::{DEFAULT_CHECKS, build_checks, default_check_ids, validate_check_ids};
pub use config::EngineConfig;
pub use domain::{
    ChecksResult, FileSummary, Grade, Issue, LeaderboardEntry, RecentView, Score,
};
pub use error::{ReportCardError, Result};
pub use fs::{FileSystem, StdFileSystem};
pub use inspector::{SourceFiles, SourceInspector};
pub use leaderboard::Leaderboard;
pub use normalize::{FormatKind, OutputNormalizer};
pub use orchestrator::{aggregate, evaluate, run_checks};
pub use recent::RecentQueue;
pub use report::{
    CloneStatus, RepoReport, render_json, render_leaderboard_markdown, render_recent_markdown,
    render_report_markdown,
};
pub use schema::schema_json;
pub use service::{EvaluationOutcome, EvaluationRecord, ReportCardService};
