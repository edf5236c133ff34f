//! Bounded top-N ranking of evaluated repositories.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::domain::LeaderboardEntry;

/// Heap element ordered by score, then key for a total order.
#[derive(Debug, Clone)]
struct Ranked(LeaderboardEntry);

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .score
            .total_cmp(&other.0.score)
            .then_with(|| other.0.repo_key.cmp(&self.0.repo_key))
    }
}

/// Min-heap of the best scoring repositories, at most `capacity` entries.
#[derive(Debug, Clone)]
pub struct Leaderboard {
    heap: BinaryHeap<Reverse<Ranked>>,
    capacity: usize,
    min_files: usize,
}

impl Leaderboard {
    /// Create an empty leaderboard.
    pub fn new(capacity: usize, min_files: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity + 1),
            capacity,
            min_files,
        }
    }

    /// Rebuild a leaderboard from persisted entries, applying the usual rules.
    pub fn from_entries(
        capacity: usize,
        min_files: usize,
        entries: impl IntoIterator<Item = LeaderboardEntry>,
    ) -> Self {
        let mut board = Self::new(capacity, min_files);
        for entry in entries {
            board.upsert(entry);
        }
        board
    }

    /// Insert or replace the entry for `entry.repo_key`.
    ///
    /// Returns whether the entry is on the board afterwards. Repositories
    /// below the file threshold are ignored. An already ranked key is always
    /// replaced, while a new key only displaces the minimum when it scores
    /// strictly higher.
    pub fn upsert(&mut self, entry: LeaderboardEntry) -> bool {
        if self.capacity == 0 || entry.file_count < self.min_files {
            return false;
        }

        let existed = self.remove(&entry.repo_key);
        if !existed && self.heap.len() >= self.capacity {
            if let Some(min) = self.min() {
                if entry.score <= min.score {
                    return false;
                }
            }
        }

        let key = entry.repo_key.clone();
        self.heap.push(Reverse(Ranked(entry)));
        while self.heap.len() > self.capacity {
            self.heap.pop();
        }
        self.contains(&key)
    }

    /// Entry with the lowest score, the next eviction candidate.
    pub fn min(&self) -> Option<&LeaderboardEntry> {
        self.heap.peek().map(|Reverse(ranked)| &ranked.0)
    }

    /// Up to `n` entries, best score first. Leaves the heap untouched.
    pub fn top_n(&self, n: usize) -> Vec<LeaderboardEntry> {
        let mut entries = self.entries();
        entries.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.repo_key.cmp(&b.repo_key))
        });
        entries.truncate(n);
        entries
    }

    /// All entries in heap order, for persistence.
    pub fn entries(&self) -> Vec<LeaderboardEntry> {
        self.heap.iter().map(|Reverse(ranked)| ranked.0.clone()).collect()
    }

    /// Whether `repo_key` is currently ranked.
    pub fn contains(&self, repo_key: &str) -> bool {
        self.heap
            .iter()
            .any(|Reverse(ranked)| ranked.0.repo_key == repo_key)
    }

    /// Number of ranked repositories.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is ranked yet.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn remove(&mut self, repo_key: &str) -> bool {
        let before = self.heap.len();
        self.heap
            .retain(|Reverse(ranked)| ranked.0.repo_key != repo_key);
        self.heap.len() != before
    }
}
