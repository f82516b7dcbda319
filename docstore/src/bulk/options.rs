use crate::common::{DEFAULT_BULK_BATCH_SIZE, DEFAULT_BULK_MAX_BUFFER_BYTES, DEFAULT_BULK_QUEUE_DEPTH};

/// Buffering limits of a [BulkLoader](crate::bulk::BulkLoader).
///
/// A chunk is sent when it holds `batch_size` documents or
/// `max_buffer_bytes` estimated bytes, whichever comes first. At most
/// `queue_depth` chunks wait for the flusher, so a loader holds roughly
/// `(queue_depth + 1)` chunks in memory however much is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkLoaderOptions {
    batch_size: usize,
    max_buffer_bytes: usize,
    queue_depth: usize,
}

impl BulkLoaderOptions {
    pub fn new() -> Self {
        BulkLoaderOptions {
            batch_size: DEFAULT_BULK_BATCH_SIZE,
            max_buffer_bytes: DEFAULT_BULK_MAX_BUFFER_BYTES,
            queue_depth: DEFAULT_BULK_QUEUE_DEPTH,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn max_buffer_bytes(mut self, max_buffer_bytes: usize) -> Self {
        self.max_buffer_bytes = max_buffer_bytes.max(1);
        self
    }

    pub fn queue_depth(mut self, queue_depth: usize) -> Self {
        self.queue_depth = queue_depth.max(1);
        self
    }

    pub fn get_batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn get_max_buffer_bytes(&self) -> usize {
        self.max_buffer_bytes
    }

    pub fn get_queue_depth(&self) -> usize {
        self.queue_depth
    }
}

impl Default for BulkLoaderOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BulkLoaderOptions::default();
        assert_eq!(options.get_batch_size(), 1024);
        assert_eq!(options.get_max_buffer_bytes(), 4 * 1024 * 1024);
        assert_eq!(options.get_queue_depth(), 2);
    }

    #[test]
    fn test_zero_is_clamped() {
        let options = BulkLoaderOptions::new().batch_size(0).queue_depth(0);
        assert_eq!(options.get_batch_size(), 1);
        assert_eq!(options.get_queue_depth(), 1);
    }
}
