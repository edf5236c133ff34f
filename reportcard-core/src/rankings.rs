//! Shared leaderboard and recency state, persisted through a [`Cache`].

use std::sync::{Arc, Mutex, MutexGuard};

use log::warn;

use crate::cache::{Cache, LEADERBOARD_KEY, RECENT_KEY, get_json, set_json};
use crate::config::EngineConfig;
use crate::domain::{LeaderboardEntry, RecentView};
use crate::error::Result;
use crate::leaderboard::Leaderboard;
use crate::recent::RecentQueue;

/// Lock-guarded rankings. Each structure has its own lock and is written back
/// to the cache while that lock is held.
pub struct Rankings {
    cache: Arc<dyn Cache>,
    leaderboard: Mutex<Leaderboard>,
    recent: Mutex<RecentQueue>,
}

impl Rankings {
    /// Restore rankings from `cache`, starting empty when nothing usable is stored.
    pub fn load(cache: Arc<dyn Cache>, config: &EngineConfig) -> Self {
        let entries: Vec<LeaderboardEntry> =
            get_json(cache.as_ref(), LEADERBOARD_KEY).unwrap_or_else(|err| {
                warn!("discarding stored leaderboard: {err}");
                None
            })
            .unwrap_or_default();
        let views: Vec<RecentView> = get_json(cache.as_ref(), RECENT_KEY)
            .unwrap_or_else(|err| {
                warn!("discarding stored recent list: {err}");
                None
            })
            .unwrap_or_default();

        Self {
            leaderboard: Mutex::new(Leaderboard::from_entries(
                config.leaderboard_capacity,
                config.leaderboard_min_files,
                entries,
            )),
            recent: Mutex::new(RecentQueue::from_views(config.recent_capacity, views)),
            cache,
        }
    }

    /// Fold a score into the leaderboard. Returns whether the entry is ranked.
    pub fn record_score(&self, entry: LeaderboardEntry) -> Result<bool> {
        let mut board = lock(&self.leaderboard);
        let ranked = board.upsert(entry);
        if ranked {
            set_json(self.cache.as_ref(), LEADERBOARD_KEY, &board.entries())?;
        }
        Ok(ranked)
    }

    /// Record a view of `repo_key`. Returns whether the queue changed.
    pub fn touch_recent(&self, repo_key: &str) -> Result<bool> {
        let mut queue = lock(&self.recent);
        let changed = queue.touch(repo_key);
        if changed {
            set_json(self.cache.as_ref(), RECENT_KEY, &queue.views())?;
        }
        Ok(changed)
    }

    /// Best `n` repositories, highest score first.
    pub fn top_scores(&self, n: usize) -> Vec<LeaderboardEntry> {
        lock(&self.leaderboard).top_n(n)
    }

    /// Recently evaluated repositories, newest first.
    pub fn recent(&self) -> Vec<RecentView> {
        lock(&self.recent).views()
    }
}

// A panic mid-update leaves a structurally valid collection, so poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
