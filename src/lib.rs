//! flatstash - file-backed key-value cache with TTL encoded in filenames
//!
//! Persists arbitrary serializable values under arbitrary byte-string keys,
//! each with an optional time-to-live. Every entry is one flat file under a
//! single cache directory, named `{encodedKey}.{expiry}`: keys are encoded
//! into filesystem-safe tokens and the expiry timestamp lives in the
//! filename, so a directory listing alone reveals liveness without opening
//! any file. Expiry is lazy (stale entries are removed when touched) with an
//! explicit purge for bulk cleanup.
//!
//! There is no locking; concurrent use across threads or processes is
//! tolerated best-effort with the filesystem's own single-file guarantees.
//!
//! ```rust,no_run
//! use flatstash::{Cache, FileCache};
//!
//! fn main() -> Result<(), flatstash::CacheError> {
//!     let cache = FileCache::new("/tmp/my-app-cache")?;
//!
//!     // 5 second TTL; 0 would mean "never expires".
//!     cache.store("session-42", &"userdata", 5u64);
//!
//!     let value = cache.fetch("session-42", String::new());
//!     assert_eq!(value, "userdata");
//!
//!     cache.remove("session-42");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod codec;
pub mod entry;
pub mod error;
pub mod store;

pub use cache::{Cache, FileCache};
pub use entry::Ttl;
pub use error::CacheError;
pub use store::{FileStore, FsBackend, NativeBackend, ShellBackend};
