//! Bounded cache of per-transcript indexes.

use super::MemoryIndex;
use crate::error::{Result, VidqaError};
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Cache key for a transcript: hex SHA-256 of the video ID and the full text.
///
/// A video whose captions change gets a new key, so stale chunks are never served.
pub fn fingerprint(video_id: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(video_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// LRU of built indexes keyed by [`fingerprint`].
pub struct IndexCache {
    entries: Mutex<LruCache<String, Arc<MemoryIndex>>>,
}

impl IndexCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up an index, marking it most recently used.
    pub fn get(&self, key: &str) -> Result<Option<Arc<MemoryIndex>>> {
        let mut entries = self.entries.lock().map_err(|e| {
            VidqaError::VectorStore(format!("Failed to acquire lock: {}", e))
        })?;
        Ok(entries.get(key).cloned())
    }

    /// Store an index, evicting the least recently used entry when full.
    pub fn insert(&self, key: String, index: Arc<MemoryIndex>) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|e| {
            VidqaError::VectorStore(format!("Failed to acquire lock: {}", e))
        })?;
        if let Some((evicted, old)) = entries.push(key.clone(), index) {
            if evicted != key {
                debug!("Evicted cached index for {} ({})", old.video_id(), evicted);
            }
        }
        Ok(())
    }
}
