use crate::collection::DocumentKey;
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Hands out `{collection}/{sequence}-{node tag}` keys.
///
/// Every collection prefix owns its own monotonic counter, so
/// `Products` and `Categories` both start at `1`. Counters are partitioned by
/// node tag: two stores with different tags never generate the same key.
#[derive(Clone)]
pub struct KeyGenerator {
    inner: Arc<KeyGeneratorInner>,
}

impl KeyGenerator {
    pub fn new(node_tag: &str) -> Self {
        KeyGenerator {
            inner: Arc::new(KeyGeneratorInner {
                node_tag: node_tag.to_string(),
                counters: DashMap::new(),
            }),
        }
    }

    pub fn node_tag(&self) -> &str {
        &self.inner.node_tag
    }

    /// Returns the next key for `collection`.
    ///
    /// Fails with [ErrorKind::InvalidKey] once the collection's sequence
    /// space is exhausted.
    pub fn next_key(&self, collection: &str) -> DocStoreResult<DocumentKey> {
        let prefix = collection_prefix(collection);
        match self.inner.next_sequence(&prefix) {
            Some(sequence) => Ok(DocumentKey::generated(&prefix, sequence, &self.inner.node_tag)),
            None => {
                log::error!("Key sequence for {} is exhausted", prefix);
                Err(DocStoreError::new(
                    &format!("Key sequence for {} is exhausted", prefix),
                    ErrorKind::InvalidKey,
                ))
            }
        }
    }

    /// Makes sure later generated keys never collide with `key`, which was
    /// supplied by a caller and may look like a generated one.
    pub fn observe(&self, key: &str) {
        if let Some((prefix, sequence)) = self.parse(key) {
            let counter = self
                .inner
                .counters
                .entry(prefix)
                .or_insert_with(|| AtomicU64::new(0));
            counter.fetch_max(sequence, Ordering::Relaxed);
        }
    }

    fn parse(&self, key: &str) -> Option<(String, u64)> {
        let (prefix, rest) = key.split_once('/')?;
        let (sequence, tag) = rest.rsplit_once('-')?;
        if tag != self.inner.node_tag {
            return None;
        }
        let sequence = sequence.parse::<u64>().ok()?;
        // u64::MAX leaves nothing to generate after it
        if sequence == u64::MAX {
            return None;
        }
        Some((prefix.to_string(), sequence))
    }
}

struct KeyGeneratorInner {
    node_tag: String,
    counters: DashMap<String, AtomicU64>,
}

impl KeyGeneratorInner {
    fn next_sequence(&self, prefix: &str) -> Option<u64> {
        if let Some(counter) = self.counters.get(prefix) {
            return increment(&counter);
        }
        let counter = self
            .counters
            .entry(prefix.to_string())
            .or_insert_with(|| AtomicU64::new(0));
        increment(&counter)
    }
}

fn increment(counter: &AtomicU64) -> Option<u64> {
    counter
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| current.checked_add(1))
        .ok()
        .map(|previous| previous + 1)
}

/// `Products` -> `products`.
pub fn collection_prefix(collection: &str) -> String {
    collection.to_lowercase()
}
