use crate::common::Tokenizer;
use crate::docstore::DocStore;
use crate::docstore_config::DocStoreConfig;
use crate::errors::{DocStoreError, DocStoreResult};

/// Fluent configuration of a [DocStore].
///
/// Invalid settings do not fail the chain; the first error is kept and
/// returned by [DocStoreBuilder::open].
///
/// ```rust
/// use docstore::DocStoreBuilder;
///
/// let store = DocStoreBuilder::new()
///     .node_tag("B")
///     .bulk_batch_size(512)
///     .max_requests_per_session(10)
///     .stop_words(&["the", "a"])
///     .open()
///     .unwrap();
/// assert_eq!(store.next_key("Products").unwrap().as_str(), "products/1-B");
///
/// assert!(DocStoreBuilder::new().node_tag("b").open().is_err());
/// ```
#[derive(Default)]
pub struct DocStoreBuilder {
    error: Option<DocStoreError>,
    config: DocStoreConfig,
}

impl DocStoreBuilder {
    pub fn new() -> Self {
        DocStoreBuilder {
            error: None,
            config: DocStoreConfig::new(),
        }
    }

    /// Tag appended to every generated key. Defaults to `A`.
    pub fn node_tag(self, node_tag: &str) -> Self {
        self.apply(|config| config.set_node_tag(node_tag))
    }

    /// Documents per bulk chunk. Defaults to 1024.
    pub fn bulk_batch_size(self, batch_size: usize) -> Self {
        self.apply(|config| config.set_bulk_batch_size(batch_size))
    }

    /// Estimated bytes per bulk chunk. Defaults to 4 MiB.
    pub fn bulk_max_buffer_bytes(self, max_buffer_bytes: usize) -> Self {
        self.apply(|config| config.set_bulk_max_buffer_bytes(max_buffer_bytes))
    }

    /// Bulk chunks allowed to wait for the flusher. Defaults to 2.
    pub fn bulk_queue_depth(self, queue_depth: usize) -> Self {
        self.apply(|config| config.set_bulk_queue_depth(queue_depth))
    }

    /// Requests a session may make. Defaults to 30.
    pub fn max_requests_per_session(self, max_requests: u32) -> Self {
        self.apply(|config| config.set_max_requests_per_session(max_requests))
    }

    pub fn stop_words(self, stop_words: &[&str]) -> Self {
        self.apply(|config| config.set_stop_words(stop_words))
    }

    pub fn tokenizer(self, tokenizer: Tokenizer) -> Self {
        self.apply(|config| config.set_tokenizer(tokenizer))
    }

    /// Opens a new, empty store with the collected settings.
    pub fn open(self) -> DocStoreResult<DocStore> {
        if let Some(err) = self.error {
            return Err(err);
        }
        DocStore::open(self.config)
    }

    fn apply(mut self, setter: impl FnOnce(&DocStoreConfig) -> DocStoreResult<()>) -> Self {
        if self.error.is_none() {
            if let Err(err) = setter(&self.config) {
                self.error = Some(err);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_default_open() {
        let store = DocStoreBuilder::new().open().unwrap();
        assert_eq!(store.config().node_tag(), "A");
        assert!(store.config().is_configured());
    }

    #[test]
    fn test_first_error_wins() {
        let err = DocStoreBuilder::new()
            .bulk_batch_size(0)
            .node_tag("x")
            .open()
            .err()
            .unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
        assert!(err.message().contains("Bulk batch size"));
    }

    #[test]
    fn test_settings_reach_store() {
        let store = DocStoreBuilder::new()
            .node_tag("C")
            .max_requests_per_session(1)
            .open()
            .unwrap();
        let mut session = store.open_session();
        session.load("products/1-C").unwrap();
        assert!(session.load("products/2-C").is_err());
    }
}
