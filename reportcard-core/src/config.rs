//! Engine configuration.

use std::time::Duration;

use crate::checks::default_check_ids;

/// Default per-tool deadline.
pub const DEFAULT_CHECK_TIMEOUT_SECS: u64 = 180;
/// Default number of leaderboard entries kept.
pub const DEFAULT_LEADERBOARD_CAPACITY: usize = 50;
/// Default minimum file count for leaderboard eligibility.
pub const DEFAULT_LEADERBOARD_MIN_FILES: usize = 100;
/// Default number of recent repositories kept.
pub const DEFAULT_RECENT_CAPACITY: usize = 5;

/// Tunables shared by the orchestrator and the ranking structures.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Deadline applied to each external tool run.
    pub check_timeout: Duration,
    /// Maximum leaderboard size.
    pub leaderboard_capacity: usize,
    /// Repositories with fewer files never enter the leaderboard.
    pub leaderboard_min_files: usize,
    /// Maximum recency queue size.
    pub recent_capacity: usize,
    /// Check ids to run, in registry form.
    pub checks: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            check_timeout: Duration::from_secs(DEFAULT_CHECK_TIMEOUT_SECS),
            leaderboard_capacity: DEFAULT_LEADERBOARD_CAPACITY,
            leaderboard_min_files: DEFAULT_LEADERBOARD_MIN_FILES,
            recent_capacity: DEFAULT_RECENT_CAPACITY,
            checks: default_check_ids(),
        }
    }
}

impl EngineConfig {
    /// Build engine config from `REPORTCARD_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build engine config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let number = |key: &str| {
            lookup(key).and_then(|value| value.trim().parse::<u64>().ok())
        };
        let checks = lookup("REPORTCARD_CHECKS")
            .map(|raw| parse_check_list(&raw))
            .filter(|checks| !checks.is_empty())
            .unwrap_or(defaults.checks);

        Self {
            check_timeout: number("REPORTCARD_CHECK_TIMEOUT_SECS")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.check_timeout),
            leaderboard_capacity: number("REPORTCARD_LEADERBOARD_CAPACITY")
                .map(|value| value as usize)
                .filter(|value| *value > 0)
                .unwrap_or(defaults.leaderboard_capacity),
            leaderboard_min_files: number("REPORTCARD_LEADERBOARD_MIN_FILES")
                .map(|value| value as usize)
                .unwrap_or(defaults.leaderboard_min_files),
            recent_capacity: number("REPORTCARD_RECENT_CAPACITY")
                .map(|value| value as usize)
                .filter(|value| *value > 0)
                .unwrap_or(defaults.recent_capacity),
            checks,
        }
    }

    /// Replace the check selection when `ids` is non-empty.
    pub fn with_checks(mut self, ids: Vec<String>) -> Self {
        if !ids.is_empty() {
            self.checks = ids;
        }
        self
    }
}

/// Split a comma separated check list, dropping blanks.
pub fn parse_check_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect()
}
