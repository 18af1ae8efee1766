//! Cache Facade
//!
//! The public contract application code consumes. All durable work is
//! delegated to the [`FileStore`] engine; this layer adds payload
//! serialization (JSON via serde) and the default-returning convenience
//! methods that never fail. Callers that want explicit errors use the
//! `*_or_fail` variants instead.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::entry::Ttl;
use crate::error::CacheError;
use crate::store::{FileStore, FsBackend};

/// Key-value cache contract.
///
/// Keys are arbitrary byte strings; values are any serde type. The
/// non-throwing methods convert every miss, expiry, and I/O failure into the
/// caller's default value or a boolean, so they always succeed or safely
/// no-op. Batch mutations stop at the first failure and leave earlier writes
/// committed; they make no all-or-nothing promise.
pub trait Cache {
    /// Fetch the value for `key`, or `default` on any miss or error.
    fn fetch<T: DeserializeOwned>(&self, key: impl AsRef<[u8]>, default: T) -> T;

    /// Store `value` under `key`. A TTL of zero seconds means no expiry.
    fn store<T: Serialize>(&self, key: impl AsRef<[u8]>, value: &T, ttl: impl Into<Ttl>) -> bool;

    /// Remove `key`; true whether or not it existed.
    fn remove(&self, key: impl AsRef<[u8]>) -> bool;

    /// Whether a live entry exists for `key`.
    fn exists(&self, key: impl AsRef<[u8]>) -> bool;

    /// Fetch several keys at once; each missing one maps to a clone of
    /// `default`.
    fn fetch_many<T, K>(&self, keys: &[K], default: T) -> HashMap<Vec<u8>, T>
    where
        T: DeserializeOwned + Clone,
        K: AsRef<[u8]>;

    /// Store several pairs under one TTL, stopping at the first failure.
    fn store_many<T, K>(&self, pairs: &[(K, T)], ttl: impl Into<Ttl>) -> bool
    where
        T: Serialize,
        K: AsRef<[u8]>;

    /// Remove several keys, stopping at the first failure.
    fn remove_many<K: AsRef<[u8]>>(&self, keys: &[K]) -> bool;

    /// Delete every expired entry.
    fn purge_expired(&self) -> bool;

    /// Remove every entry, live or not.
    fn clear(&self) -> bool;

    /// All currently live entries, deserialized into `T`. Entries that are
    /// unreadable or not valid `T` are omitted; best-effort snapshot, not a
    /// transaction.
    fn snapshot_live<T: DeserializeOwned>(&self) -> HashMap<Vec<u8>, T>;

    /// Like [`Cache::fetch`] but surfaces the failure instead of a default.
    fn read_or_fail<T: DeserializeOwned>(&self, key: impl AsRef<[u8]>) -> Result<T, CacheError>;

    /// Like [`Cache::store`] but surfaces the failure instead of `false`.
    fn write_or_fail<T: Serialize>(
        &self,
        key: impl AsRef<[u8]>,
        value: &T,
        ttl: impl Into<Ttl>,
    ) -> Result<(), CacheError>;
}

/// File-backed cache: one flat file per entry under a single directory.
///
/// Payloads are serialized as JSON, an engine-internal format — cached blobs
/// are not meant to be portable across incompatible versions.
pub struct FileCache {
    engine: FileStore,
}

impl FileCache {
    /// Open a cache over `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        Ok(Self {
            engine: FileStore::new(dir)?,
        })
    }

    /// Open a cache under the platform user cache directory, e.g.
    /// `~/.cache/<namespace>` on Linux.
    pub fn in_user_cache(namespace: &str) -> Result<Self, CacheError> {
        let dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(namespace);
        Self::new(dir)
    }

    /// Open a cache with a specific filesystem backend.
    pub fn with_backend(
        dir: impl Into<PathBuf>,
        backend: impl FsBackend + 'static,
    ) -> Result<Self, CacheError> {
        Ok(Self {
            engine: FileStore::with_backend(dir, backend)?,
        })
    }

    /// Apply a permission mode to every entry file the cache creates.
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.engine = self.engine.with_file_mode(mode);
        self
    }

    /// The underlying store engine, for byte-level access.
    pub fn engine(&self) -> &FileStore {
        &self.engine
    }
}

impl Cache for FileCache {
    fn fetch<T: DeserializeOwned>(&self, key: impl AsRef<[u8]>, default: T) -> T {
        self.read_or_fail(key).unwrap_or(default)
    }

    fn store<T: Serialize>(&self, key: impl AsRef<[u8]>, value: &T, ttl: impl Into<Ttl>) -> bool {
        self.write_or_fail(key, value, ttl).is_ok()
    }

    fn remove(&self, key: impl AsRef<[u8]>) -> bool {
        self.engine.delete(key.as_ref())
    }

    fn exists(&self, key: impl AsRef<[u8]>) -> bool {
        self.engine.has(key.as_ref())
    }

    fn fetch_many<T, K>(&self, keys: &[K], default: T) -> HashMap<Vec<u8>, T>
    where
        T: DeserializeOwned + Clone,
        K: AsRef<[u8]>,
    {
        keys.iter()
            .map(|key| {
                let value = self.fetch(key, default.clone());
                (key.as_ref().to_vec(), value)
            })
            .collect()
    }

    fn store_many<T, K>(&self, pairs: &[(K, T)], ttl: impl Into<Ttl>) -> bool
    where
        T: Serialize,
        K: AsRef<[u8]>,
    {
        let ttl = ttl.into();
        for (key, value) in pairs {
            if !self.store(key, value, ttl) {
                return false;
            }
        }
        true
    }

    fn remove_many<K: AsRef<[u8]>>(&self, keys: &[K]) -> bool {
        for key in keys {
            if !self.remove(key) {
                return false;
            }
        }
        true
    }

    fn purge_expired(&self) -> bool {
        self.engine.purge_expired()
    }

    fn clear(&self) -> bool {
        self.engine.clear()
    }

    fn snapshot_live<T: DeserializeOwned>(&self) -> HashMap<Vec<u8>, T> {
        self.engine
            .enumerate_live()
            .into_iter()
            .filter_map(|(key, payload)| {
                serde_json::from_slice(&payload).ok().map(|value| (key, value))
            })
            .collect()
    }

    fn read_or_fail<T: DeserializeOwned>(&self, key: impl AsRef<[u8]>) -> Result<T, CacheError> {
        let payload = self.engine.read(key.as_ref())?;
        Ok(serde_json::from_slice(&payload)?)
    }

    fn write_or_fail<T: Serialize>(
        &self,
        key: impl AsRef<[u8]>,
        value: &T,
        ttl: impl Into<Ttl>,
    ) -> Result<(), CacheError> {
        let payload = serde_json::to_vec(value)?;
        if self.engine.write(key.as_ref(), &payload, ttl.into()) {
            Ok(())
        } else {
            Err(CacheError::Io(io::Error::other("cache write failed")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::thread::sleep;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        hits: u32,
    }

    fn cache_in(dir: &std::path::Path) -> FileCache {
        FileCache::new(dir).unwrap()
    }

    #[test]
    fn test_round_trip_typed_value() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let session = Session {
            user: "ada".into(),
            hits: 3,
        };

        assert!(cache.store("session-42", &session, 100u64));
        let got: Session = cache.read_or_fail("session-42").unwrap();
        assert_eq!(got, session);
    }

    #[test]
    fn test_fetch_returns_default_on_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());

        let got = cache.fetch("nothing-here", "MISS".to_string());
        assert_eq!(got, "MISS");
    }

    #[test]
    fn test_overwrite_keeps_exactly_one_live_value() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());

        assert!(cache.store("k", &"a", 100u64));
        assert!(cache.store("k", &"b", 100u64));
        assert_eq!(cache.fetch("k", String::new()), "b");
        assert_eq!(cache.snapshot_live::<String>().len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());

        assert!(cache.remove("ghost"));
        assert!(cache.store("k", &1u32, 0u64));
        assert!(cache.remove("k"));
        assert!(cache.remove("k"));
        assert_eq!(cache.fetch("k", 7u32), 7);
    }

    #[test]
    fn test_expiry_then_miss_and_file_gone() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());

        assert!(cache.store("session-42", &"userdata", 1u64));
        assert_eq!(cache.fetch("session-42", String::new()), "userdata");

        sleep(Duration::from_secs(2));
        let got: Option<String> = cache.fetch("session-42", None);
        assert_eq!(got, None);
        // Lazy expiry removed the backing file.
        assert!(cache.engine().enumerate_live().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_zero_ttl_does_not_expire() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());

        assert!(cache.store("forever", &"v", 0u64));
        sleep(Duration::from_secs(2));
        assert!(cache.exists("forever"));
        assert_eq!(cache.fetch("forever", String::new()), "v");
    }

    #[test]
    fn test_batch_store_and_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let pairs = [("one", 1u32), ("two", 2), ("three", 3)];

        assert!(cache.store_many(&pairs, 100u64));
        let got = cache.fetch_many(&["one", "three", "four"], 0u32);
        assert_eq!(got[b"one".as_slice()], 1);
        assert_eq!(got[b"three".as_slice()], 3);
        assert_eq!(got[b"four".as_slice()], 0);

        assert!(cache.remove_many(&["one", "two"]));
        assert!(!cache.exists("one"));
        assert!(cache.exists("three"));
    }

    #[test]
    fn test_empty_batches_are_vacuous_successes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let no_pairs: [(&str, u32); 0] = [];
        let no_keys: [&str; 0] = [];

        assert!(cache.store_many(&no_pairs, 0u64));
        assert!(cache.remove_many(&no_keys));
        assert!(cache.fetch_many(&no_keys, 0u32).is_empty());
    }

    #[test]
    fn test_snapshot_live_after_clear_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        cache.store("a", &"1", 0u64);
        cache.store("b", &"2", 100u64);

        assert_eq!(cache.snapshot_live::<String>().len(), 2);
        assert!(cache.clear());
        assert!(cache.snapshot_live::<String>().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_snapshot_omits_undeserializable_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        cache.store("number", &1u32, 0u64);
        cache.store("text", &"hello", 0u64);

        // Only the numeric entry fits u32; the other is omitted, not an error.
        let nums = cache.snapshot_live::<u32>();
        assert_eq!(nums.len(), 1);
        assert_eq!(nums[b"number".as_slice()], 1);
    }

    #[test]
    fn test_binary_keys_round_trip_through_facade() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());
        let key: &[u8] = b"path/like.key\x00with nul";

        assert!(cache.store(key, &"v", 0u64));
        assert!(cache.exists(key));
        let live = cache.snapshot_live::<String>();
        assert_eq!(live[key], "v");
    }

    #[test]
    fn test_read_or_fail_reports_miss() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());

        let got: Result<String, CacheError> = cache.read_or_fail("absent");
        assert!(got.unwrap_err().is_miss());
    }

    #[test]
    fn test_ttl_accepts_durations() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_in(dir.path());

        assert!(cache.store("k", &"v", Duration::from_secs(120)));
        assert!(cache.exists("k"));
    }
}
