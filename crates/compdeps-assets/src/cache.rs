//! Content-addressed cache for inline JS and CSS.
//!
//! Inline component sources are stored here under a key derived from a
//! SHA-256 hash of their bytes, so identical content shared by several
//! components is stored, served, and loaded once. Entries are write-once:
//! a key always maps to the same bytes.

use std::sync::Arc;

use dashmap::DashMap;
use sha2::{Digest, Sha256};

use compdeps_core::DepsError;

use crate::asset::AssetKind;

/// Computes the cache key for `content`: the first `len` hex digits of its
/// SHA-256 digest.
///
/// # Examples
///
/// ```
/// use compdeps_assets::cache::content_key;
///
/// let key = content_key("body { margin: 0 }", 16);
/// assert_eq!(key.len(), 16);
/// assert_eq!(key, content_key("body { margin: 0 }", 16));
/// ```
pub fn content_key(content: &str, len: usize) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let mut key = hex::encode(digest);
    key.truncate(len.min(key.len()));
    key
}

/// Splits a fetch endpoint file name such as `ab12cd.js` into key and kind.
pub fn parse_file_name(file: &str) -> Option<(&str, AssetKind)> {
    let file = file.trim_end_matches('/');
    let (key, script_type) = file.rsplit_once('.')?;
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some((key, AssetKind::from_script_type(script_type)?))
}

/// Thread-safe, write-once store of inline asset content.
///
/// Cloning is cheap and clones share the same storage.
#[derive(Debug, Clone)]
pub struct ContentCache {
    entries: Arc<DashMap<String, Arc<str>>>,
    key_length: usize,
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(16)
    }
}

impl ContentCache {
    /// Creates an empty cache producing keys of `key_length` hex digits.
    pub fn new(key_length: usize) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            key_length,
        }
    }

    fn entry_name(key: &str, kind: AssetKind) -> String {
        format!("{key}.{}", kind.script_type())
    }

    /// Stores `content` and returns its key.
    ///
    /// Storing the same content again is a no-op that returns the same key.
    pub fn put(&self, kind: AssetKind, content: &str) -> String {
        let key = content_key(content, self.key_length);
        self.entries
            .entry(Self::entry_name(&key, kind))
            .or_insert_with(|| {
                tracing::debug!(
                    key = %key,
                    kind = %kind,
                    bytes = content.len(),
                    "Cached inline content"
                );
                Arc::from(content)
            });
        key
    }

    /// Retrieves cached content.
    ///
    /// # Errors
    ///
    /// Returns `CacheMiss` if the key/kind pair was never stored.
    pub fn get(&self, key: &str, kind: AssetKind) -> Result<Arc<str>, DepsError> {
        let name = Self::entry_name(key, kind);
        self.entries
            .get(&name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(DepsError::CacheMiss(name))
    }

    /// Retrieves cached content by fetch endpoint file name (`<key>.<js|css>`).
    ///
    /// # Errors
    ///
    /// Returns `CacheMiss` for unknown keys and malformed file names alike.
    pub fn get_file(&self, file: &str) -> Result<(AssetKind, Arc<str>), DepsError> {
        let (key, kind) =
            parse_file_name(file).ok_or_else(|| DepsError::CacheMiss(file.to_string()))?;
        Ok((kind, self.get(key, kind)?))
    }

    /// Returns `true` if the key/kind pair is cached.
    pub fn contains(&self, key: &str, kind: AssetKind) -> bool {
        self.entries.contains_key(&Self::entry_name(key, kind))
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The configured key length.
    pub const fn key_length(&self) -> usize {
        self.key_length
    }
}
