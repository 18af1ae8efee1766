//! Key Codec
//!
//! Reversible transform from an arbitrary byte-string key to a token safe
//! for use as a filename component. Tokens use the base64 URL-safe alphabet
//! without padding (`A-Z a-z 0-9 - _`), so they never contain `.` (reserved
//! as the entry layout's field separator), `/`, or anything else a common
//! filesystem rejects. Any byte string round-trips exactly, which means keys
//! need no validation rules at all: binary keys, multi-byte Unicode, and the
//! empty key are all representable.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::error::CacheError;

/// Encode a raw key as a filesystem-safe token.
pub fn encode(key: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(key)
}

/// Decode a token back to the raw key bytes.
///
/// Exact inverse of [`encode`]; fails only for tokens that are not a
/// well-formed encoding.
pub fn decode(token: &str) -> Result<Vec<u8>, CacheError> {
    URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| CacheError::decoding(token, e))
}
