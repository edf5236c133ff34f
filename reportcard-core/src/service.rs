//! Cached evaluation flow tying the orchestrator to persistence and rankings.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::cache::{self, Cache, TOTAL_REPOS_KEY, get_json, set_json};
use crate::check::Target;
use crate::config::EngineConfig;
use crate::domain::{ChecksResult, Grade, LeaderboardEntry, RecentView};
use crate::error::Result;
use crate::orchestrator;
use crate::rankings::Rankings;

/// A stored evaluation of one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    /// Repository identifier.
    pub repo: String,
    /// Graded result of the run.
    pub result: ChecksResult,
    /// When the checks last ran.
    #[schema(value_type = String, format = DateTime)]
    pub last_refresh: DateTime<Utc>,
}

/// What [`ReportCardService::evaluate`] produced.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    /// The fresh or cached evaluation.
    pub record: EvaluationRecord,
    /// True when the record came from the cache without running checks.
    pub from_cache: bool,
    /// Persistence problems hit while storing a fresh result.
    pub persistence_errors: Vec<String>,
}

/// Evaluates repositories, caching results and keeping rankings current.
pub struct ReportCardService {
    cache: Arc<dyn Cache>,
    config: EngineConfig,
    rankings: Rankings,
    grades: RwLock<HashMap<String, Grade>>,
    /// Serializes the record store with the `stats:total_repos` update.
    store_lock: Mutex<()>,
}

impl ReportCardService {
    /// Create a service over `cache`, restoring any persisted rankings.
    pub fn new(cache: Arc<dyn Cache>, config: EngineConfig) -> Self {
        let rankings = Rankings::load(Arc::clone(&cache), &config);
        Self {
            cache,
            config,
            rankings,
            grades: RwLock::new(HashMap::new()),
            store_lock: Mutex::new(()),
        }
    }

    /// Evaluate `target` as `repo_key`, reusing a cached record unless `force_refresh`.
    ///
    /// Structural target problems fail the call. Cache failures never do: they
    /// are logged and listed in [`EvaluationOutcome::persistence_errors`].
    pub fn evaluate(
        &self,
        repo_key: &str,
        target: &Target,
        force_refresh: bool,
    ) -> Result<EvaluationOutcome> {
        if !force_refresh {
            match self.cached(repo_key) {
                Ok(Some(record)) => {
                    info!("using cached result for {repo_key}");
                    self.remember_grade(repo_key, record.result.grade);
                    return Ok(EvaluationOutcome {
                        record,
                        from_cache: true,
                        persistence_errors: Vec::new(),
                    });
                }
                Ok(None) => {}
                Err(err) => warn!("cache lookup for {repo_key} failed: {err}"),
            }
        }

        let result = orchestrator::evaluate(target, &self.config)?;
        info!(
            "{repo_key}: {:.2}% ({}) over {} file(s)",
            result.average * 100.0,
            result.grade,
            result.files_analyzed
        );
        let record = EvaluationRecord {
            repo: repo_key.to_string(),
            result,
            last_refresh: Utc::now(),
        };
        let persistence_errors = self.persist(&record);
        self.remember_grade(repo_key, record.result.grade);

        Ok(EvaluationOutcome {
            record,
            from_cache: false,
            persistence_errors,
        })
    }

    /// Stored record for `repo_key`, with its grade re-derived from the average.
    pub fn cached(&self, repo_key: &str) -> Result<Option<EvaluationRecord>> {
        let record: Option<EvaluationRecord> =
            get_json(self.cache.as_ref(), &cache::repo_key(repo_key))?;
        Ok(record.map(|mut record| {
            record.result.grade = Grade::from_percentage(record.result.average * 100.0);
            record
        }))
    }

    /// Best `n` ranked repositories.
    pub fn top_scores(&self, n: usize) -> Vec<LeaderboardEntry> {
        self.rankings.top_scores(n)
    }

    /// Recently evaluated repositories, newest first.
    pub fn recent(&self) -> Vec<RecentView> {
        self.rankings.recent()
    }

    /// Number of distinct repositories ever stored.
    pub fn total_repos(&self) -> Result<u64> {
        Ok(get_json(self.cache.as_ref(), TOTAL_REPOS_KEY)?.unwrap_or(0))
    }

    /// Grade last seen for `repo_key` by this service instance.
    pub fn cached_grade(&self, repo_key: &str) -> Option<Grade> {
        self.grades
            .read()
            .ok()
            .and_then(|grades| grades.get(repo_key).copied())
    }

    fn persist(&self, record: &EvaluationRecord) -> Vec<String> {
        let mut errors = Vec::new();
        let key = cache::repo_key(&record.repo);

        let guard = self.store_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let is_new = match self.cache.get(&key) {
            Ok(existing) => existing.is_none(),
            Err(err) => {
                errors.push(format!("lookup {key}: {err}"));
                false
            }
        };
        if let Err(err) = set_json(self.cache.as_ref(), &key, record) {
            errors.push(format!("store {key}: {err}"));
        }
        if is_new {
            if let Err(err) = self.bump_total_repos() {
                errors.push(format!("update {TOTAL_REPOS_KEY}: {err}"));
            }
        }
        drop(guard);

        let entry = LeaderboardEntry {
            repo_key: record.repo.clone(),
            score: record.result.average * 100.0,
            file_count: record.result.files_analyzed,
        };
        if let Err(err) = self.rankings.record_score(entry) {
            errors.push(format!("update leaderboard: {err}"));
        }
        if let Err(err) = self.rankings.touch_recent(&record.repo) {
            errors.push(format!("update recent: {err}"));
        }

        for message in &errors {
            error!("{}: {message}", record.repo);
        }
        errors
    }

    fn bump_total_repos(&self) -> Result<()> {
        let total = self.total_repos()?;
        set_json(self.cache.as_ref(), TOTAL_REPOS_KEY, &(total + 1))
    }

    fn remember_grade(&self, repo_key: &str, grade: Grade) {
        if let Ok(mut grades) = self.grades.write() {
            grades.insert(repo_key.to_string(), grade);
        }
    }
}
