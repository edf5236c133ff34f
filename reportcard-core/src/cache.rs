//! Key/value persistence used for results and rankings.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ReportCardError, Result};

/// Key holding the serialized leaderboard.
pub const LEADERBOARD_KEY: &str = "leaderboard:scores";
/// Key holding the serialized recency list.
pub const RECENT_KEY: &str = "recent:views";
/// Key holding the number of distinct repositories evaluated.
pub const TOTAL_REPOS_KEY: &str = "stats:total_repos";

/// Key for a cached evaluation of `repo_key`.
pub fn repo_key(repo_key: &str) -> String {
    format!("repo:{repo_key}")
}

/// Narrow byte-oriented store. Implementations handle their own locking.
#[cfg_attr(test, mockall::automock)]
pub trait Cache: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
}

/// Read and decode a JSON value.
pub fn get_json<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Result<Option<T>> {
    match cache.get(key)? {
        Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        None => Ok(None),
    }
}

/// Encode and store a JSON value.
pub fn set_json<T: Serialize + ?Sized>(cache: &dyn Cache, key: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)?;
    cache.set(key, &bytes)
}

/// Process-local cache backed by a hash map.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    /// Create an empty in-memory cache.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| ReportCardError::Cache("memory cache lock poisoned".to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ReportCardError::Cache("memory cache lock poisoned".to_string()))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Cache storing one file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Open (and create if needed) a cache directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", urlencoding::encode(key)))
    }
}

impl Cache for FileCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match std::fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ReportCardError::Cache(format!("read {key}: {err}"))),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, value)
            .and_then(|_| std::fs::rename(&staging, &path))
            .map_err(|err| ReportCardError::Cache(format!("write {key}: {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{Cache, FileCache, MemoryCache, MockCache, get_json, repo_key, set_json};
    use crate::error::ReportCardError;
    use std::path::PathBuf;

    #[test]
    fn memory_cache_reads_its_writes() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("missing").expect("get"), None);
        cache.set("k", b"v1").expect("set");
        cache.set("k", b"v2").expect("set");
        assert_eq!(cache.get("k").expect("get"), Some(b"v2".to_vec()));
    }

    #[test]
    fn file_cache_persists_across_handles() {
        let root = temp_dir();
        let cache = FileCache::open(&root).expect("open");
        let key = repo_key("github.com/acme/widgets");
        cache.set(&key, b"{\"ok\":true}").expect("set");

        let reopened = FileCache::open(&root).expect("reopen");
        assert_eq!(
            reopened.get(&key).expect("get"),
            Some(b"{\"ok\":true}".to_vec())
        );
        assert_eq!(reopened.get("repo:unknown").expect("get"), None);

        let names: Vec<String> = std::fs::read_dir(&root)
            .expect("list")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["repo%3Agithub.com%2Facme%2Fwidgets.json"]);

        std::fs::remove_dir_all(&root).expect("cleanup temp dir");
    }

    #[test]
    fn json_helpers_round_trip_through_any_cache() {
        let cache = MemoryCache::new();
        set_json(&cache, "numbers", &vec![1u32, 2, 3]).expect("set");
        let numbers: Option<Vec<u32>> = get_json(&cache, "numbers").expect("get");
        assert_eq!(numbers, Some(vec![1, 2, 3]));
    }

    #[test]
    fn json_helpers_surface_store_errors() {
        let mut cache = MockCache::new();
        cache
            .expect_get()
            .returning(|_| Err(ReportCardError::Cache("offline".to_string())));
        let err = get_json::<u32>(&cache, "stats:total_repos").expect_err("store error");
        assert!(matches!(err, ReportCardError::Cache(message) if message == "offline"));
    }

    #[test]
    fn json_helpers_reject_corrupt_values() {
        let cache = MemoryCache::new();
        cache.set("numbers", b"not json").expect("set");
        let err = get_json::<Vec<u32>>(&cache, "numbers").expect_err("corrupt");
        assert!(matches!(err, ReportCardError::Json(_)));
    }

    fn temp_dir() -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time")
            .as_nanos();
        std::env::temp_dir().join(format!("reportcard_cache_test_{nanos}"))
    }
}
