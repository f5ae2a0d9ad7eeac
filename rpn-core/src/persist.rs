//! Crash-safe artifact writes and a persisted memo cache
//!
//! Artifacts are written to a temp file in the destination directory and
//! renamed over the target, so an interrupted write never leaves a
//! truncated file behind.

use crate::RpnError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::hash::Hash;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Write `bytes` to `path` atomically (temp file + rename)
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RpnError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)
        .map_err(|e| RpnError::Artifact(format!("cannot create '{}': {}", dir.display(), e)))?;

    let mut file = NamedTempFile::new_in(&dir)
        .map_err(|e| RpnError::Artifact(format!("cannot create temp file in '{}': {}", dir.display(), e)))?;
    file.write_all(bytes)
        .and_then(|_| file.as_file().sync_all())
        .map_err(|e| RpnError::Artifact(format!("cannot write '{}': {}", path.display(), e)))?;
    file.persist(path)
        .map_err(|e| RpnError::Artifact(format!("cannot replace '{}': {}", path.display(), e.error)))?;

    debug!(path = %path.display(), bytes = bytes.len(), "artifact written");
    Ok(())
}

#[derive(Serialize, Deserialize)]
struct CacheFile<K, V> {
    version: String,
    entries: Vec<(K, V)>,
}

/// Read-through, write-behind memo cache.
///
/// Lookups and inserts are in-memory; `flush` persists the entries that
/// pass `should_persist` (typically a size threshold on the key).
pub struct PersistentCache<K, V> {
    path: Option<PathBuf>,
    version: String,
    should_persist: fn(&K, &V) -> bool,
    entries: Mutex<HashMap<K, V>>,
}

impl<K, V> PersistentCache<K, V>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// A cache that never touches the filesystem
    pub fn in_memory(should_persist: fn(&K, &V) -> bool) -> Self {
        Self {
            path: None,
            version: String::new(),
            should_persist,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Open a cache backed by `path`. A missing file starts empty; an
    /// unreadable file or a different version is discarded with a warning.
    pub fn open(path: impl Into<PathBuf>, version: &str, should_persist: fn(&K, &V) -> bool) -> Self {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice::<CacheFile<K, V>>(&bytes) {
                Ok(file) if file.version == version => file.entries.into_iter().collect(),
                Ok(file) => {
                    warn!(path = %path.display(), found = %file.version, expected = version,
                        "cache file version mismatch, starting empty");
                    HashMap::new()
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable cache file, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self {
            path: Some(path),
            version: version.to_string(),
            should_persist,
            entries: Mutex::new(entries),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, V>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).cloned()
    }

    pub fn insert(&self, key: K, value: V) {
        self.lock().insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached value or compute, store and return it
    pub fn get_or_try_insert_with<E>(&self, key: &K, compute: impl FnOnce() -> Result<V, E>) -> Result<V, E> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key.clone(), value.clone());
        Ok(value)
    }

    /// Persist qualifying entries; returns how many were written
    pub fn flush(&self) -> Result<usize, RpnError> {
        let Some(path) = &self.path else {
            return Ok(0);
        };

        let entries: Vec<(K, V)> = self.lock().iter()
            .filter(|(k, v)| (self.should_persist)(k, v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let count = entries.len();

        let file = CacheFile { version: self.version.clone(), entries };
        let bytes = serde_json::to_vec(&file)
            .map_err(|e| RpnError::Artifact(format!("cannot encode cache: {}", e)))?;
        write_atomic(path, &bytes)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn large_only(key: &u64, _value: &Vec<u64>) -> bool {
        *key > 100
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("artifact.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn test_cache_read_through() {
        let cache: PersistentCache<u64, Vec<u64>> = PersistentCache::in_memory(large_only);
        let mut calls = 0;
        for _ in 0..3 {
            let value = cache.get_or_try_insert_with(&12, || {
                calls += 1;
                Ok::<_, RpnError>(vec![2, 2, 3])
            }).unwrap();
            assert_eq!(value, vec![2, 2, 3]);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.flush().unwrap(), 0);
    }

    #[test]
    fn test_cache_persists_only_large_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("factors.json");

        let cache: PersistentCache<u64, Vec<u64>> = PersistentCache::open(&path, "1", large_only);
        cache.insert(12, vec![2, 2, 3]);
        cache.insert(1001, vec![7, 11, 13]);
        assert_eq!(cache.flush().unwrap(), 1);

        let reopened: PersistentCache<u64, Vec<u64>> = PersistentCache::open(&path, "1", large_only);
        assert_eq!(reopened.get(&1001), Some(vec![7, 11, 13]));
        assert_eq!(reopened.get(&12), None);

        let other_version: PersistentCache<u64, Vec<u64>> = PersistentCache::open(&path, "2", large_only);
        assert!(other_version.is_empty());
    }
}
