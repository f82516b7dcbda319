use crate::bulk::{BulkLoadStatistics, BulkLoaderOptions};
use crate::collection::Document;
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::store::{validate_command, BatchCommand, DocumentStore};
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use uuid::Uuid;

type Chunk = Vec<BatchCommand>;

/// High-throughput ingestion of many documents.
///
/// Documents are buffered into chunks and handed to a background flusher,
/// which commits each chunk as its own atomic batch. Chunks are written
/// without revision checks, so the last write wins. Buffering is bounded:
/// when the flusher falls behind, [BulkLoader::store] blocks until a chunk
/// slot frees up.
///
/// Always finish with [BulkLoader::close], which flushes the remainder and
/// reports documents that could not be written. A loader dropped without
/// closing discards whatever it had not sent yet.
///
/// ```rust
/// # use docstore::{doc, DocStoreBuilder};
/// let store = DocStoreBuilder::new().open().unwrap();
/// let mut loader = store.open_bulk_loader().unwrap();
/// for i in 0..100 {
///     loader.store("Products", doc! { Name: (format!("Product #{}", i)) }).unwrap();
/// }
/// let statistics = loader.close().unwrap();
/// assert_eq!(statistics.documents_flushed(), 100);
/// assert_eq!(store.count("Products").unwrap(), 100);
/// ```
pub struct BulkLoader {
    id: Uuid,
    store: DocumentStore,
    options: BulkLoaderOptions,
    buffer: Chunk,
    buffered_bytes: usize,
    sender: Option<Sender<Chunk>>,
    worker: Option<JoinHandle<()>>,
    progress: Arc<FlushProgress>,
    submitted: u64,
    finished: bool,
}

/// State shared with the flusher thread.
#[derive(Default)]
struct FlushProgress {
    documents_flushed: AtomicU64,
    chunks_flushed: AtomicU64,
    chunks_failed: AtomicU64,
    aborted: AtomicBool,
    lost_keys: Mutex<Vec<String>>,
    first_error: Mutex<Option<String>>,
}

impl BulkLoader {
    pub(crate) fn new(store: DocumentStore, options: BulkLoaderOptions) -> DocStoreResult<Self> {
        let id = Uuid::new_v4();
        let (sender, receiver) = bounded::<Chunk>(options.get_queue_depth());
        let progress = Arc::new(FlushProgress::default());

        let worker = {
            let store = store.clone();
            let progress = progress.clone();
            std::thread::Builder::new()
                .name(format!("docstore-bulk-{}", id))
                .spawn(move || flush_chunks(store, receiver, progress))
                .map_err(|err| {
                    log::error!("Failed to start bulk flusher: {}", err);
                    DocStoreError::new_with_cause(
                        "Failed to start bulk flusher",
                        ErrorKind::InternalError,
                        DocStoreError::from(err),
                    )
                })?
        };

        log::debug!("Opened bulk loader {} with {:?}", id, options);
        Ok(BulkLoader {
            id,
            store,
            options,
            buffer: Vec::with_capacity(options.get_batch_size()),
            buffered_bytes: 0,
            sender: Some(sender),
            worker: Some(worker),
            progress,
            submitted: 0,
            finished: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queues `document` and returns its key.
    ///
    /// A document without `_id` gets a generated key right away. Invalid
    /// documents are rejected here, before they can fail a whole chunk.
    pub fn store(&mut self, collection: &str, mut document: Document) -> DocStoreResult<String> {
        self.ensure_open()?;
        let key = match document.key() {
            Some(key) => key.to_string(),
            None => {
                let key = self.store.next_key(collection)?.into_string();
                document.set_key(&key);
                key
            }
        };

        let command = BatchCommand::put(&key, collection, document);
        validate_command(&command)?;
        self.store.observe_key(&key);

        self.buffered_bytes += command.estimated_size();
        self.buffer.push(command);
        self.submitted += 1;

        if self.buffer.len() >= self.options.get_batch_size()
            || self.buffered_bytes >= self.options.get_max_buffer_bytes()
        {
            self.send_buffer()?;
        }
        Ok(key)
    }

    /// Sends the current buffer to the flusher without waiting for it to
    /// be written.
    pub fn flush(&mut self) -> DocStoreResult<()> {
        self.ensure_open()?;
        self.send_buffer()
    }

    pub fn statistics(&self) -> BulkLoadStatistics {
        BulkLoadStatistics {
            documents_submitted: self.submitted,
            documents_flushed: self.progress.documents_flushed.load(Ordering::Relaxed),
            chunks_flushed: self.progress.chunks_flushed.load(Ordering::Relaxed),
            chunks_failed: self.progress.chunks_failed.load(Ordering::Relaxed),
        }
    }

    /// Flushes the remaining documents and waits for the flusher to finish.
    ///
    /// Fails with [ErrorKind::BulkLoadError] if any chunk could not be
    /// written; [DocStoreError::affected_keys] lists every lost document.
    pub fn close(mut self) -> DocStoreResult<BulkLoadStatistics> {
        let sent = self.send_buffer();
        self.finish()?;
        sent?;

        let statistics = self.statistics();
        let lost_keys = mem::take(&mut *self.progress.lost_keys.lock());
        if !lost_keys.is_empty() {
            let cause = self
                .progress
                .first_error
                .lock()
                .take()
                .unwrap_or_default();
            log::error!(
                "Bulk loader {} lost {} documents: {}",
                self.id,
                lost_keys.len(),
                cause
            );
            return Err(DocStoreError::new(
                &format!(
                    "Bulk load lost {} of {} documents: {}",
                    lost_keys.len(),
                    statistics.documents_submitted(),
                    cause
                ),
                ErrorKind::BulkLoadError,
            )
            .with_keys(lost_keys));
        }

        log::debug!("Closed bulk loader {}: {}", self.id, statistics);
        Ok(statistics)
    }

    /// Stops loading. Buffered and queued chunks are discarded; chunks the
    /// flusher already committed stay in the store.
    pub fn abort(mut self) -> DocStoreResult<BulkLoadStatistics> {
        self.progress.aborted.store(true, Ordering::SeqCst);
        let discarded = self.discard_buffer();
        self.finish()?;
        log::warn!(
            "Bulk loader {} aborted, {} buffered documents discarded",
            self.id,
            discarded
        );
        Ok(self.statistics())
    }

    fn ensure_open(&self) -> DocStoreResult<()> {
        if self.finished {
            log::error!("Bulk loader {} is already closed", self.id);
            return Err(DocStoreError::new(
                "Bulk loader is already closed",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }

    fn send_buffer(&mut self) -> DocStoreResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let chunk = mem::replace(&mut self.buffer, Vec::with_capacity(self.options.get_batch_size()));
        self.buffered_bytes = 0;

        match &self.sender {
            // blocks while the queue is full
            Some(sender) => sender.send(chunk).map_err(|_| {
                log::error!("Bulk flusher of loader {} has stopped", self.id);
                DocStoreError::new("Bulk flusher has stopped", ErrorKind::InternalError)
            }),
            None => {
                log::error!("Bulk loader {} is already closed", self.id);
                Err(DocStoreError::new(
                    "Bulk loader is already closed",
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    fn discard_buffer(&mut self) -> usize {
        let discarded = self.buffer.len();
        self.buffer.clear();
        self.buffered_bytes = 0;
        discarded
    }

    /// Closes the queue and joins the flusher.
    fn finish(&mut self) -> DocStoreResult<()> {
        self.finished = true;
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Bulk flusher of loader {} panicked", self.id);
                return Err(DocStoreError::new(
                    "Bulk flusher panicked",
                    ErrorKind::InternalError,
                ));
            }
        }
        Ok(())
    }
}

impl Drop for BulkLoader {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let discarded = self.discard_buffer();
        if discarded > 0 {
            log::warn!(
                "Bulk loader {} dropped without close, {} buffered documents discarded",
                self.id,
                discarded
            );
        }
        // queued chunks are still written
        let _ = self.finish();
    }
}

fn flush_chunks(store: DocumentStore, receiver: Receiver<Chunk>, progress: Arc<FlushProgress>) {
    for chunk in receiver {
        let keys: Vec<String> = chunk.iter().map(|command| command.key().to_string()).collect();
        if progress.aborted.load(Ordering::SeqCst) {
            log::debug!("Discarding queued chunk of {} documents", keys.len());
            continue;
        }

        match store.apply_batch_unchecked(chunk) {
            Ok(result) => {
                progress
                    .documents_flushed
                    .fetch_add(keys.len() as u64, Ordering::Relaxed);
                progress.chunks_flushed.fetch_add(1, Ordering::Relaxed);
                log::debug!(
                    "Flushed chunk of {} documents at revision {}",
                    keys.len(),
                    result.revision()
                );
            }
            Err(err) => {
                log::error!("Failed to flush chunk of {} documents: {}", keys.len(), err);
                progress.chunks_failed.fetch_add(1, Ordering::Relaxed);
                progress.lost_keys.lock().extend(keys);
                progress
                    .first_error
                    .lock()
                    .get_or_insert_with(|| err.to_string());
            }
        }
    }
}
