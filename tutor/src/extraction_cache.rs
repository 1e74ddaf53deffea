use crate::document_processor::{fingerprint, TextExtractor};
use crate::error::ExtractionError;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

struct CacheEntry {
    text: String,
    stored_at: Instant,
}

/// Read-through cache in front of a [`TextExtractor`].
///
/// Entries are keyed by the SHA-256 of the PDF bytes and expire `ttl` after
/// they were stored. Failed extractions are not cached.
pub struct CachedExtractor<E> {
    inner: E,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl<E: TextExtractor> CachedExtractor<E> {
    pub fn new(inner: E, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Drops every entry older than the TTL. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        before - entries.len()
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.text.clone())
    }
}

impl<E: TextExtractor> TextExtractor for CachedExtractor<E> {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let key = fingerprint(bytes);

        if let Some(text) = self.lookup(&key) {
            log::debug!("Extraction cache hit for {}", &key[..12]);
            return Ok(text);
        }

        let text = self.inner.extract(bytes)?;
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        // Expired entries for any document are dropped on every miss.
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.stored_at.elapsed() < ttl);
        entries.insert(
            key,
            CacheEntry {
                text: text.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(text)
    }
}
