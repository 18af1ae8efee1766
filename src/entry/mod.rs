//! Entry Layout
//!
//! On-disk naming convention binding an encoded key and an expiry together:
//! one flat file per entry, named `{encodedKey}.{expiryField}`. The expiry
//! field is `0` for entries that never expire, otherwise the absolute Unix
//! timestamp (in seconds) after which the entry is stale. Embedding the TTL
//! in the filename means a directory listing alone reveals liveness without
//! opening any file.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Expiry field value for entries without a time limit.
pub const NO_EXPIRY: u64 = 0;

/// Normalized time-to-live for a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Entry never expires.
    Never,
    /// Entry expires this many seconds after it is written.
    Seconds(u64),
}

impl From<u64> for Ttl {
    /// Zero seconds means no expiry, matching the on-disk sentinel.
    fn from(secs: u64) -> Self {
        if secs == 0 {
            Ttl::Never
        } else {
            Ttl::Seconds(secs)
        }
    }
}

impl From<Duration> for Ttl {
    /// Truncates to whole seconds; sub-second durations become [`Ttl::Never`].
    fn from(d: Duration) -> Self {
        Ttl::from(d.as_secs())
    }
}

/// Current Unix time in whole seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Build the filename for an entry written at `now` with the given TTL.
///
/// A TTL too large to represent saturates to the maximum timestamp, which
/// never expires in practice.
pub fn compose_filename(encoded_key: &str, ttl: Ttl, now: u64) -> String {
    let expiry = match ttl {
        Ttl::Never => NO_EXPIRY,
        Ttl::Seconds(secs) => now.saturating_add(secs),
    };
    format!("{}.{}", encoded_key, expiry)
}

/// Split a filename into its encoded-key stem and expiry field.
///
/// Splits on the last `.` — safe because encoded keys never contain one.
/// Returns `None` for names that do not follow the entry layout (no
/// separator, or a non-numeric expiry field), which lets scans skip foreign
/// files in the cache directory.
pub fn split_filename(name: &str) -> Option<(&str, u64)> {
    let (stem, expiry) = name.rsplit_once('.')?;
    let expiry = expiry.parse().ok()?;
    Some((stem, expiry))
}

/// Whether an expiry field marks an entry as stale at time `now`.
pub fn is_expired(expiry: u64, now: u64) -> bool {
    expiry != NO_EXPIRY && expiry < now
}
