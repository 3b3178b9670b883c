//! LRU cache of raw documents keyed by INN

use lru::LruCache;
use std::num::NonZeroUsize;

use crate::types::{Inn, RawDocument};

/// Capacity 0 disables caching entirely
pub struct DocumentCache {
    inner: Option<LruCache<Inn, RawDocument>>,
}

impl DocumentCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(LruCache::new),
        }
    }

    pub fn get(&mut self, inn: &Inn) -> Option<RawDocument> {
        self.inner.as_mut()?.get(inn).cloned()
    }

    pub fn put(&mut self, inn: Inn, doc: RawDocument) {
        if let Some(cache) = self.inner.as_mut() {
            cache.put(inn, doc);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.as_ref().map_or(0, LruCache::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
