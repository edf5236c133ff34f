//! Bounded list of recently evaluated repositories.

use std::collections::VecDeque;

use crate::domain::RecentView;

/// First-seen ordered queue of distinct repository keys.
///
/// Touching a key that is already queued leaves the order unchanged; this is
/// not an LRU.
#[derive(Debug, Clone)]
pub struct RecentQueue {
    keys: VecDeque<String>,
    capacity: usize,
}

impl RecentQueue {
    /// Create an empty queue holding at most `capacity` keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild a queue from a persisted newest-first view list.
    pub fn from_views(capacity: usize, views: impl IntoIterator<Item = RecentView>) -> Self {
        let mut queue = Self::new(capacity);
        let mut views: Vec<RecentView> = views.into_iter().collect();
        views.reverse();
        for view in views {
            queue.touch(&view.repo_key);
        }
        queue
    }

    /// Record `repo_key`. Returns whether the queue changed.
    pub fn touch(&mut self, repo_key: &str) -> bool {
        if self.capacity == 0 || self.keys.iter().any(|key| key == repo_key) {
            return false;
        }
        self.keys.push_back(repo_key.to_string());
        while self.keys.len() > self.capacity {
            self.keys.pop_front();
        }
        true
    }

    /// Queued keys, newest first.
    pub fn views(&self) -> Vec<RecentView> {
        self.keys
            .iter()
            .rev()
            .map(|key| RecentView {
                repo_key: key.clone(),
            })
            .collect()
    }

    /// Number of queued keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
