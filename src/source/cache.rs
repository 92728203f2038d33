//! Cache of generated PDFs, so one tool's output can feed the next

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// A cached document and the operation that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPdf {
    pub data: Vec<u8>,
    pub origin: String,
}

struct CacheInner {
    lru: LruCache<String, CachedPdf>,
    total_bytes: usize,
}

/// LRU of output PDFs bounded by entry count and total bytes
pub struct OutputCache {
    inner: Mutex<CacheInner>,
    max_bytes: usize,
}

impl OutputCache {
    pub fn new(capacity: usize, max_bytes: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheInner {
                lru: LruCache::new(capacity),
                total_bytes: 0,
            }),
            max_bytes,
        }
    }

    /// Store a document under a fresh key. Returns `None` when the document
    /// alone exceeds the byte budget.
    pub fn insert(&self, origin: impl Into<String>, data: Vec<u8>) -> Option<String> {
        let size = data.len();
        if size > self.max_bytes {
            tracing::debug!(size, max_bytes = self.max_bytes, "output too large to cache");
            return None;
        }

        let mut inner = self.inner.lock();

        let key = loop {
            let candidate = uuid::Uuid::new_v4().to_string();
            if !inner.lru.contains(&candidate) {
                break candidate;
            }
        };

        while inner.total_bytes + size > self.max_bytes {
            match inner.lru.pop_lru() {
                Some((_, evicted)) => {
                    inner.total_bytes = inner.total_bytes.saturating_sub(evicted.data.len());
                }
                None => break,
            }
        }

        // `push` hands back the entry dropped by the count limit
        if let Some((_, evicted)) = inner.lru.push(
            key.clone(),
            CachedPdf {
                data,
                origin: origin.into(),
            },
        ) {
            inner.total_bytes = inner.total_bytes.saturating_sub(evicted.data.len());
        }
        inner.total_bytes += size;

        Some(key)
    }

    pub fn get(&self, key: &str) -> Option<CachedPdf> {
        self.inner.lock().lru.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().lru.contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().lru.is_empty()
    }

    /// Total bytes currently held
    pub fn total_bytes(&self) -> usize {
        self.inner.lock().total_bytes
    }
}
