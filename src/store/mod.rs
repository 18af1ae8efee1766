//! File Store Engine
//!
//! Durable cache operations over a single flat directory. Each entry is one
//! file named `{encodedKey}.{expiry}` (see [`crate::entry`]); the engine owns
//! the directory contents exclusively and treats payloads as opaque bytes.
//!
//! There is no locking at any level. Concurrent access from other threads or
//! processes is tolerated best-effort: operations never retry, duplicate
//! files left behind by racing writers are accepted on every path, and reads
//! resolve duplicates deterministically by picking the lexicographically-last
//! filename.

pub mod backend;

pub use backend::{FsBackend, NativeBackend, ShellBackend};

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codec;
use crate::entry::{self, Ttl};
use crate::error::CacheError;

/// Directory-scoped cache store.
pub struct FileStore {
    /// Root directory holding one file per entry
    dir: PathBuf,
    /// Permission mode applied to every created entry file, if set
    file_mode: Option<u32>,
    /// Filesystem access strategy
    backend: Box<dyn FsBackend>,
}

impl FileStore {
    /// Open a store over `dir` using direct filesystem calls, creating the
    /// directory (recursively) if it does not exist.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        Self::with_backend(dir, NativeBackend)
    }

    /// Open a store with a specific filesystem backend.
    pub fn with_backend(
        dir: impl Into<PathBuf>,
        backend: impl FsBackend + 'static,
    ) -> Result<Self, CacheError> {
        let dir = dir.into();
        backend.provision_dir(&dir)?;
        info!(dir = %dir.display(), "File store initialized");
        Ok(Self {
            dir,
            file_mode: None,
            backend: Box::new(backend),
        })
    }

    /// Apply a permission mode to every entry file this store creates.
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = Some(mode);
        self
    }

    /// The cache directory this store owns.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write a payload under `key`, replacing any previous entry.
    ///
    /// The new file is created first and older files for the same key are
    /// removed afterwards, so a concurrent reader observes either the old
    /// value or the new one, never a gap. Returns false on any I/O failure.
    pub fn write(&self, key: &[u8], payload: &[u8], ttl: Ttl) -> bool {
        let encoded = codec::encode(key);
        let filename = entry::compose_filename(&encoded, ttl, entry::unix_now());
        // Same key and same expiry second lands on the same name; persist
        // overwrites it in place and it must not be swept below.
        let stale: Vec<String> = self
            .matching_filenames(&encoded)
            .into_iter()
            .filter(|name| *name != filename)
            .collect();

        let path = self.dir.join(&filename);
        if let Err(e) = self.backend.write_file(&path, payload) {
            warn!(path = %path.display(), error = %e, "Cache write failed");
            return false;
        }
        if let Some(mode) = self.file_mode {
            if let Err(e) = self.backend.set_mode(&path, mode) {
                warn!(path = %path.display(), error = %e, "Failed to set cache file mode");
            }
        }
        for name in stale {
            // Write already succeeded; a racing remover or a permission
            // problem here must not fail it. remove_entry_file warns on the
            // latter, and a leftover duplicate is tolerated by every read.
            self.remove_entry_file(&name);
        }
        debug!(file = %filename, size = payload.len(), "Wrote cache entry");
        true
    }

    /// Read the live payload for `key`.
    ///
    /// Fails with [`CacheError::Unavailable`] when no entry exists, when the
    /// entry is expired (it is removed as a side effect), or when the file
    /// disappears between the directory scan and the read.
    pub fn read(&self, key: &[u8]) -> Result<Vec<u8>, CacheError> {
        let encoded = codec::encode(key);
        let names = self.matching_filenames(&encoded);
        let Some(name) = names.last() else {
            debug!(key = %String::from_utf8_lossy(key), "Cache MISS");
            return Err(CacheError::Unavailable);
        };
        let (_, expiry) = entry::split_filename(name).ok_or(CacheError::Unavailable)?;
        if entry::is_expired(expiry, entry::unix_now()) {
            debug!(file = %name, "Cache entry expired, removing");
            self.delete(key);
            return Err(CacheError::Unavailable);
        }
        match self.backend.read_file(&self.dir.join(name)) {
            Ok(payload) => {
                debug!(file = %name, size = payload.len(), "Cache HIT");
                Ok(payload)
            }
            Err(e) => {
                // Concurrent removal between scan and read; an ordinary miss.
                debug!(file = %name, error = %e, "Cache file vanished mid-read");
                Err(CacheError::Unavailable)
            }
        }
    }

    /// Whether a live entry exists for `key`.
    ///
    /// Applies the same lazy expiry removal as [`FileStore::read`].
    pub fn has(&self, key: &[u8]) -> bool {
        let encoded = codec::encode(key);
        let names = self.matching_filenames(&encoded);
        let Some(name) = names.last() else {
            return false;
        };
        match entry::split_filename(name) {
            Some((_, expiry)) if entry::is_expired(expiry, entry::unix_now()) => {
                self.delete(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Remove every file belonging to `key`.
    ///
    /// Idempotent: returns true when nothing existed, and when a racing
    /// remover got to a file first.
    pub fn delete(&self, key: &[u8]) -> bool {
        let encoded = codec::encode(key);
        let mut all_removed = true;
        for name in self.matching_filenames(&encoded) {
            if !self.remove_entry_file(&name) {
                all_removed = false;
            }
        }
        all_removed
    }

    /// Remove every entry file in the cache directory.
    ///
    /// Files that do not follow the entry layout are left alone. Returns
    /// false if any removal failed.
    pub fn clear(&self) -> bool {
        let names = match self.backend.list_dir(&self.dir) {
            Ok(names) => names,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Failed to list cache directory");
                return false;
            }
        };
        let mut all_removed = true;
        for name in names {
            if entry::split_filename(&name).is_none() {
                continue;
            }
            if !self.remove_entry_file(&name) {
                all_removed = false;
            }
        }
        all_removed
    }

    /// Delete every expired entry file, leaving live ones untouched.
    ///
    /// Returns false if any deletion failed.
    pub fn purge_expired(&self) -> bool {
        let now = entry::unix_now();
        let names = match self.backend.list_dir(&self.dir) {
            Ok(names) => names,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Failed to list cache directory");
                return false;
            }
        };
        let mut all_removed = true;
        let mut purged = 0usize;
        for name in names {
            match entry::split_filename(&name) {
                Some((_, expiry)) if entry::is_expired(expiry, now) => {
                    if self.remove_entry_file(&name) {
                        purged += 1;
                    } else {
                        all_removed = false;
                    }
                }
                _ => {}
            }
        }
        debug!(purged = purged, "Purged expired cache entries");
        all_removed
    }

    /// Best-effort snapshot of every live entry's raw key and payload.
    ///
    /// Expired entries are skipped without being deleted (a lighter liveness
    /// check than [`FileStore::purge_expired`]); entries that disappear or
    /// fail to decode mid-scan are silently omitted. Duplicate files for one
    /// key resolve to the lexicographically-last name, matching `read`.
    pub fn enumerate_live(&self) -> HashMap<Vec<u8>, Vec<u8>> {
        let now = entry::unix_now();
        let mut names = self.backend.list_dir(&self.dir).unwrap_or_default();
        names.sort();

        let mut live = HashMap::new();
        for name in names {
            let Some((stem, expiry)) = entry::split_filename(&name) else {
                continue;
            };
            if entry::is_expired(expiry, now) {
                continue;
            }
            let Ok(key) = codec::decode(stem) else {
                continue;
            };
            if let Ok(payload) = self.backend.read_file(&self.dir.join(&name)) {
                live.insert(key, payload);
            }
        }
        live
    }

    /// All filenames currently belonging to `encoded`, sorted ascending.
    ///
    /// Normally zero or one; historic write races can leave more, and every
    /// caller tolerates that.
    fn matching_filenames(&self, encoded: &str) -> Vec<String> {
        let mut names = match self.backend.list_dir(&self.dir) {
            Ok(names) => names,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "Failed to list cache directory");
                return Vec::new();
            }
        };
        names.retain(|name| matches!(entry::split_filename(name), Some((stem, _)) if stem == encoded));
        names.sort();
        names
    }

    /// Remove one entry file; a file already gone counts as removed.
    fn remove_entry_file(&self, name: &str) -> bool {
        match self.backend.remove_file(&self.dir.join(name)) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!(file = %name, error = %e, "Failed to remove cache entry");
                false
            }
        }
    }
}
