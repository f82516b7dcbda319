//! Configuration of a [DocStore](crate::docstore::DocStore).

use crate::bulk::BulkLoaderOptions;
use crate::common::{
    atomic, Atomic, DefaultTokenizer, ReadExecutor, Tokenizer, WriteExecutor, DEFAULT_NODE_TAG,
};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::session::SessionOptions;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Settings of a document store.
///
/// Usually populated through [DocStoreBuilder](crate::docstore_builder::DocStoreBuilder).
/// Once a store is opened with it, the configuration is frozen and every
/// setter fails with [ErrorKind::InvalidOperation].
#[derive(Clone)]
pub struct DocStoreConfig {
    inner: Arc<DocStoreConfigInner>,
}

impl Default for DocStoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DocStoreConfig {
    pub fn new() -> Self {
        DocStoreConfig {
            inner: Arc::new(DocStoreConfigInner::new()),
        }
    }

    /// Tag appended to generated keys, `A` in `products/1-A`.
    pub fn node_tag(&self) -> String {
        self.inner.node_tag.read_with(|tag| tag.clone())
    }

    /// Sets the node tag. It must be non-empty and uppercase alphanumeric.
    pub fn set_node_tag(&self, node_tag: &str) -> DocStoreResult<()> {
        self.inner.ensure_not_configured("Node tag")?;
        validate_node_tag(node_tag)?;
        self.inner
            .node_tag
            .write_with(|tag| *tag = node_tag.to_string());
        Ok(())
    }

    pub fn bulk_options(&self) -> BulkLoaderOptions {
        self.inner.bulk_options.read_with(|options| *options)
    }

    pub fn set_bulk_batch_size(&self, batch_size: usize) -> DocStoreResult<()> {
        self.inner.ensure_not_configured("Bulk batch size")?;
        validate_positive("Bulk batch size", batch_size)?;
        self.inner
            .bulk_options
            .write_with(|options| *options = options.batch_size(batch_size));
        Ok(())
    }

    pub fn set_bulk_max_buffer_bytes(&self, max_buffer_bytes: usize) -> DocStoreResult<()> {
        self.inner.ensure_not_configured("Bulk buffer size")?;
        validate_positive("Bulk buffer size", max_buffer_bytes)?;
        self.inner
            .bulk_options
            .write_with(|options| *options = options.max_buffer_bytes(max_buffer_bytes));
        Ok(())
    }

    pub fn set_bulk_queue_depth(&self, queue_depth: usize) -> DocStoreResult<()> {
        self.inner.ensure_not_configured("Bulk queue depth")?;
        validate_positive("Bulk queue depth", queue_depth)?;
        self.inner
            .bulk_options
            .write_with(|options| *options = options.queue_depth(queue_depth));
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        self.inner.session_options.read_with(|options| *options)
    }

    pub fn set_max_requests_per_session(&self, max_requests: u32) -> DocStoreResult<()> {
        self.inner.ensure_not_configured("Session request limit")?;
        validate_positive("Session request limit", max_requests as usize)?;
        self.inner
            .session_options
            .write_with(|options| *options = options.max_requests(max_requests));
        Ok(())
    }

    pub fn tokenizer(&self) -> Tokenizer {
        self.inner.tokenizer.read_with(|tokenizer| tokenizer.clone())
    }

    /// Replaces the tokenizer used by full-text indexes and search filters.
    pub fn set_tokenizer(&self, tokenizer: Tokenizer) -> DocStoreResult<()> {
        self.inner.ensure_not_configured("Tokenizer")?;
        self.inner.tokenizer.write_with(|current| *current = tokenizer);
        Ok(())
    }

    /// Uses the default tokenizer with `stop_words` left out of every index
    /// and search.
    pub fn set_stop_words(&self, stop_words: &[&str]) -> DocStoreResult<()> {
        self.set_tokenizer(Tokenizer::new(DefaultTokenizer::with_stop_words(
            stop_words.iter().copied(),
        )))
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Relaxed)
    }

    /// Freezes the configuration.
    pub(crate) fn initialize(&self) -> DocStoreResult<()> {
        if self.inner.configured.swap(true, Ordering::SeqCst) {
            log::error!("Configuration is already in use by another store");
            return Err(DocStoreError::new(
                "Configuration is already in use by another store",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

struct DocStoreConfigInner {
    configured: AtomicBool,
    node_tag: Atomic<String>,
    bulk_options: Atomic<BulkLoaderOptions>,
    session_options: Atomic<SessionOptions>,
    tokenizer: Atomic<Tokenizer>,
}

impl DocStoreConfigInner {
    fn new() -> Self {
        DocStoreConfigInner {
            configured: AtomicBool::from(false),
            node_tag: atomic(DEFAULT_NODE_TAG.to_string()),
            bulk_options: atomic(BulkLoaderOptions::default()),
            session_options: atomic(SessionOptions::default()),
            tokenizer: atomic(Tokenizer::default()),
        }
    }

    fn ensure_not_configured(&self, setting: &str) -> DocStoreResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("{} cannot be changed after the store is opened", setting);
            return Err(DocStoreError::new(
                &format!("{} cannot be changed after the store is opened", setting),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

fn validate_node_tag(node_tag: &str) -> DocStoreResult<()> {
    let valid = !node_tag.is_empty()
        && node_tag
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit());
    if !valid {
        log::error!("Invalid node tag {:?}", node_tag);
        return Err(DocStoreError::new(
            &format!(
                "Node tag must be non-empty and uppercase alphanumeric, got {:?}",
                node_tag
            ),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

fn validate_positive(setting: &str, value: usize) -> DocStoreResult<()> {
    if value == 0 {
        log::error!("{} must be greater than zero", setting);
        return Err(DocStoreError::new(
            &format!("{} must be greater than zero", setting),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}
