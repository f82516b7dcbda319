use crate::collection::{validate_key, Document, DocumentKey, KeyGenerator};
use crate::common::{
    atomic, Atomic, ReadExecutor, Tokenizer, Value, DOC_COLLECTION, DOC_ID, DOC_MODIFIED, DOC_REVISION,
};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::index::{IndexDescriptor, IndexType};
use crate::store::{
    validate_attachment_name, Attachment, BatchCommand, BatchResult, Snapshot, StoreStatistics,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::io::Read;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Documents found by [DocumentStore::get_with_includes].
#[derive(Debug, Clone, Default)]
pub struct IncludeResult {
    /// The requested documents that exist, in request order.
    pub documents: IndexMap<String, Document>,
    /// Every key referenced through an include path; `None` when the
    /// referenced document does not exist.
    pub included: IndexMap<String, Option<Document>>,
}

/// The snapshot-isolated document store.
///
/// Readers clone the last committed [Snapshot] and never block. Writers go
/// through [DocumentStore::apply_batch], which is serialized by a single
/// write lock, builds the next snapshot (documents, indexes and
/// attachments) and publishes it with one pointer swap. A failed batch
/// publishes nothing.
///
/// `DocumentStore` is cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<DocumentStoreInner>,
}

impl DocumentStore {
    pub fn new(node_tag: &str, tokenizer: Tokenizer) -> Self {
        DocumentStore {
            inner: Arc::new(DocumentStoreInner {
                current: atomic(Arc::new(Snapshot::default())),
                write_lock: Mutex::new(()),
                key_generator: KeyGenerator::new(node_tag),
                tokenizer,
                closed: AtomicBool::new(false),
                requests: AtomicU64::new(0),
                batches: AtomicU64::new(0),
            }),
        }
    }

    /// Inserts or overwrites a document without a revision check and returns
    /// its key. A key is generated when `key` is `None`.
    pub fn put(&self, collection: &str, key: Option<&str>, document: Document) -> DocStoreResult<String> {
        let key = match key {
            Some(key) => key.to_string(),
            None => self.next_key(collection)?.into_string(),
        };
        self.apply_batch(vec![BatchCommand::put(&key, collection, document)])?;
        Ok(key)
    }

    /// Returns the document stored under `key`.
    ///
    /// # Errors
    ///
    /// [ErrorKind::NotFound] if there is no such document.
    pub fn get(&self, key: &str) -> DocStoreResult<Document> {
        let snapshot = self.read_snapshot()?;
        match snapshot.get(key) {
            Some(document) => Ok(document.clone()),
            None => {
                log::error!("Document {} not found", key);
                Err(DocStoreError::new(
                    &format!("Document {} not found", key),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    /// Returns the documents that exist among `keys`. Missing keys are
    /// omitted from the result.
    pub fn get_many<S: AsRef<str>>(&self, keys: &[S]) -> DocStoreResult<IndexMap<String, Document>> {
        let snapshot = self.read_snapshot()?;
        Ok(keys
            .iter()
            .filter_map(|key| {
                let key = key.as_ref();
                snapshot.get(key).map(|doc| (key.to_string(), doc.clone()))
            })
            .collect())
    }

    /// Returns the documents among `keys` together with every document
    /// referenced from them through `include_paths`, in a single request.
    ///
    /// An include path names a field holding a key or an array of keys.
    pub fn get_with_includes<S, P>(&self, keys: &[S], include_paths: &[P]) -> DocStoreResult<IncludeResult>
    where
        S: AsRef<str>,
        P: AsRef<str>,
    {
        let snapshot = self.read_snapshot()?;
        let mut result = IncludeResult::default();

        for key in keys {
            let key = key.as_ref();
            let document = match snapshot.get(key) {
                Some(document) => document,
                None => continue,
            };

            for path in include_paths {
                for referenced in referenced_keys(document, path.as_ref()) {
                    if result.included.contains_key(referenced) {
                        continue;
                    }
                    let included = snapshot.get(referenced).cloned();
                    result.included.insert(referenced.to_string(), included);
                }
            }
            result.documents.insert(key.to_string(), document.clone());
        }

        log::debug!(
            "Loaded {} documents with {} includes",
            result.documents.len(),
            result.included.len()
        );
        Ok(result)
    }

    /// Deletes a document and its attachments. Deleting a missing key is a
    /// no-op.
    pub fn delete(&self, key: &str) -> DocStoreResult<()> {
        self.apply_batch(vec![BatchCommand::delete(key)])?;
        Ok(())
    }

    /// Applies `commands` atomically, in order.
    ///
    /// # Errors
    ///
    /// * [ErrorKind::ConcurrencyConflict] if any expected revision does not
    ///   match; the error lists every conflicting key.
    /// * [ErrorKind::NotFound] when an attachment targets a missing document.
    /// * [ErrorKind::ValidationError] / [ErrorKind::InvalidKey] for malformed
    ///   commands.
    ///
    /// On error nothing from the batch becomes visible.
    pub fn apply_batch(&self, commands: Vec<BatchCommand>) -> DocStoreResult<BatchResult> {
        self.inner.apply(commands, true)
    }

    /// Same as [DocumentStore::apply_batch] but ignores expected revisions.
    pub(crate) fn apply_batch_unchecked(&self, commands: Vec<BatchCommand>) -> DocStoreResult<BatchResult> {
        self.inner.apply(commands, false)
    }

    pub fn contains(&self, key: &str) -> DocStoreResult<bool> {
        Ok(self.read_snapshot()?.get(key).is_some())
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> DocStoreResult<usize> {
        Ok(self.read_snapshot()?.indexes.collection_count(collection))
    }

    /// Names of every non-empty collection, sorted.
    pub fn collections(&self) -> DocStoreResult<Vec<String>> {
        Ok(self.read_snapshot()?.indexes.collection_names())
    }

    /// Current revision of `key`, or `None` when it does not exist.
    pub fn revision_of(&self, key: &str) -> DocStoreResult<Option<u64>> {
        Ok(self
            .read_snapshot()?
            .get(key)
            .and_then(Document::revision))
    }

    /// Reads `reader` fully and stores it as attachment `name` of `key`,
    /// replacing any attachment with the same name.
    pub fn store_attachment<R: Read>(
        &self,
        key: &str,
        name: &str,
        reader: R,
        content_type: &str,
    ) -> DocStoreResult<Attachment> {
        let attachment = Attachment::from_reader(name, content_type, reader)?;
        self.apply_batch(vec![BatchCommand::put_attachment(key, attachment.clone())])?;
        Ok(attachment)
    }

    pub fn get_attachment(&self, key: &str, name: &str) -> DocStoreResult<Attachment> {
        let snapshot = self.read_snapshot()?;
        match snapshot.attachment(key, name) {
            Some(attachment) => Ok(attachment.clone()),
            None => {
                log::error!("Attachment {} of document {} not found", name, key);
                Err(DocStoreError::new(
                    &format!("Attachment {} of document {} not found", name, key),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    /// Names of the attachments of `key`, sorted.
    ///
    /// # Errors
    ///
    /// [ErrorKind::NotFound] if the document does not exist.
    pub fn attachment_names(&self, key: &str) -> DocStoreResult<Vec<String>> {
        let snapshot = self.read_snapshot()?;
        if snapshot.get(key).is_none() {
            log::error!("Document {} not found", key);
            return Err(DocStoreError::new(
                &format!("Document {} not found", key),
                ErrorKind::NotFound,
            ));
        }
        Ok(snapshot
            .attachments
            .get(key)
            .map(|names| names.keys().cloned().collect())
            .unwrap_or_default())
    }

    /// Removes attachment `name` of `key`. Removing a missing attachment is
    /// a no-op.
    pub fn delete_attachment(&self, key: &str, name: &str) -> DocStoreResult<()> {
        self.apply_batch(vec![BatchCommand::delete_attachment(key, name)])?;
        Ok(())
    }

    /// Builds an index over the current documents of `collection`. Later
    /// batches keep it up to date.
    pub fn create_index(&self, collection: &str, field: &str, index_type: IndexType) -> DocStoreResult<IndexDescriptor> {
        self.inner.ensure_open()?;
        validate_collection(collection)?;
        if field.trim().is_empty() {
            log::error!("Cannot create an index on an empty field");
            return Err(DocStoreError::new(
                "Index field cannot be empty",
                ErrorKind::ValidationError,
            ));
        }

        let descriptor = IndexDescriptor::new(collection, field, index_type);
        let _guard = self.inner.write_lock.lock();
        let mut next = Snapshot::clone(&self.inner.current.read());
        if next.indexes.has_index(&descriptor) {
            log::error!("Index {} already exists", descriptor);
            return Err(DocStoreError::new(
                &format!("Index {} already exists", descriptor),
                ErrorKind::IndexAlreadyExists,
            ));
        }

        let members = next.indexes.collection_keys(collection);
        let documents = members
            .iter()
            .filter_map(|key| next.documents.get(key).map(|doc| (key, doc)));
        let mut indexes = next.indexes.clone();
        indexes.add_index(&descriptor, documents, &self.inner.tokenizer);
        next.indexes = indexes;

        *self.inner.current.write() = Arc::new(next);
        log::debug!("Created index {}", descriptor);
        Ok(descriptor)
    }

    pub fn drop_index(&self, collection: &str, field: &str, index_type: IndexType) -> DocStoreResult<()> {
        self.inner.ensure_open()?;
        let descriptor = IndexDescriptor::new(collection, field, index_type);
        let _guard = self.inner.write_lock.lock();
        let mut next = Snapshot::clone(&self.inner.current.read());
        if !next.indexes.remove_index(&descriptor) {
            log::error!("Index {} not found", descriptor);
            return Err(DocStoreError::new(
                &format!("Index {} not found", descriptor),
                ErrorKind::IndexNotFound,
            ));
        }
        *self.inner.current.write() = Arc::new(next);
        log::debug!("Dropped index {}", descriptor);
        Ok(())
    }

    pub fn has_index(&self, collection: &str, field: &str, index_type: IndexType) -> DocStoreResult<bool> {
        self.inner.ensure_open()?;
        let descriptor = IndexDescriptor::new(collection, field, index_type);
        Ok(self.inner.current.read_with(|s| s.indexes.has_index(&descriptor)))
    }

    pub fn list_indexes(&self) -> DocStoreResult<Vec<IndexDescriptor>> {
        self.inner.ensure_open()?;
        Ok(self.inner.current.read_with(|s| s.indexes.descriptors()))
    }

    /// Generates the next key for `collection`, e.g. `products/1-A`.
    pub fn next_key(&self, collection: &str) -> DocStoreResult<DocumentKey> {
        validate_collection(collection)?;
        self.inner.key_generator.next_key(collection)
    }

    /// Reserves a caller-supplied key so generated keys skip past it
    /// before its batch is applied.
    pub(crate) fn observe_key(&self, key: &str) {
        self.inner.key_generator.observe(key);
    }

    pub fn node_tag(&self) -> &str {
        self.inner.key_generator.node_tag()
    }

    pub fn statistics(&self) -> StoreStatistics {
        let snapshot = self.inner.current.read_with(Arc::clone);
        StoreStatistics {
            requests: self.inner.requests.load(Ordering::Relaxed),
            documents: snapshot.documents.len(),
            attachments: snapshot.attachment_count,
            batches: self.inner.batches.load(Ordering::Relaxed),
            last_revision: snapshot.revision,
        }
    }

    /// Rejects every later operation with [ErrorKind::StoreClosed].
    pub fn close(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            log::debug!("Document store closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_open(&self) -> DocStoreResult<()> {
        self.inner.ensure_open()
    }

    /// Blocks every writer until the guard drops.
    #[cfg(test)]
    pub(crate) fn hold_writes(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.inner.write_lock.lock()
    }

    pub(crate) fn tokenizer(&self) -> &Tokenizer {
        &self.inner.tokenizer
    }

    /// Counts a request and returns the last committed snapshot.
    pub(crate) fn read_snapshot(&self) -> DocStoreResult<Arc<Snapshot>> {
        self.inner.ensure_open()?;
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
        Ok(self.inner.current.read_with(Arc::clone))
    }
}

struct DocumentStoreInner {
    current: Atomic<Arc<Snapshot>>,
    write_lock: Mutex<()>,
    key_generator: KeyGenerator,
    tokenizer: Tokenizer,
    closed: AtomicBool,
    requests: AtomicU64,
    batches: AtomicU64,
}

impl DocumentStoreInner {
    fn ensure_open(&self) -> DocStoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            log::error!("Document store is closed");
            return Err(DocStoreError::new(
                "Document store is closed",
                ErrorKind::StoreClosed,
            ));
        }
        Ok(())
    }

    fn apply(&self, commands: Vec<BatchCommand>, check_revisions: bool) -> DocStoreResult<BatchResult> {
        self.ensure_open()?;
        self.requests.fetch_add(1, Ordering::Relaxed);
        for command in &commands {
            validate_command(command)?;
        }

        let _guard = self.write_lock.lock();
        let mut next = Snapshot::clone(&self.current.read());

        if check_revisions {
            check_expected_revisions(&next, &commands)?;
        }

        let modified = chrono::Utc::now().timestamp_millis();
        let mut touched = IndexMap::with_capacity(commands.len());
        for command in commands {
            match command {
                BatchCommand::Put {
                    key,
                    collection,
                    mut document,
                    ..
                } => {
                    next.revision += 1;
                    document.set_metadata(&key, &collection, next.revision, modified);
                    let previous = next.documents.get(&key);
                    next.indexes
                        .on_put(&key, previous, &document, &self.tokenizer);
                    next.documents.insert(key.clone(), document.clone());
                    self.key_generator.observe(&key);
                    touched.insert(key, Some(document));
                }
                BatchCommand::Delete { key, .. } => {
                    if let Some(previous) = next.documents.remove(&key) {
                        next.indexes.on_delete(&key, &previous, &self.tokenizer);
                        if let Some(attachments) = next.attachments.remove(&key) {
                            next.attachment_count -= attachments.len();
                        }
                    }
                    touched.insert(key, None);
                }
                BatchCommand::PutAttachment { key, attachment } => {
                    if !next.documents.contains_key(&key) {
                        log::error!(
                            "Cannot store attachment {} for missing document {}",
                            attachment.name(),
                            key
                        );
                        return Err(DocStoreError::new(
                            &format!("Document {} not found", key),
                            ErrorKind::NotFound,
                        )
                        .with_keys(vec![key]));
                    }
                    let mut names = next.attachments.get(&key).cloned().unwrap_or_default();
                    if names
                        .insert(attachment.name().to_string(), attachment)
                        .is_none()
                    {
                        next.attachment_count += 1;
                    }
                    next.attachments.insert(key, names);
                }
                BatchCommand::DeleteAttachment { key, name } => {
                    let mut now_empty = false;
                    if let Some(names) = next.attachments.get_mut(&key) {
                        if names.remove(&name).is_some() {
                            next.attachment_count -= 1;
                        }
                        now_empty = names.is_empty();
                    }
                    if now_empty {
                        next.attachments.remove(&key);
                    }
                }
            }
        }

        let revision = next.revision;
        *self.current.write() = Arc::new(next);
        self.batches.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "Applied batch of {} documents at revision {}",
            touched.len(),
            revision
        );
        Ok(BatchResult::new(revision, touched))
    }
}

fn check_expected_revisions(snapshot: &Snapshot, commands: &[BatchCommand]) -> DocStoreResult<()> {
    let mut conflicts = Vec::new();
    let mut messages = Vec::new();
    for command in commands {
        if let Some(expected) = command.expected_revision() {
            let actual = snapshot.revision_of(command.key());
            if actual != expected {
                messages.push(format!(
                    "{} (expected revision {}, actual {})",
                    command.key(),
                    expected,
                    actual
                ));
                conflicts.push(command.key().to_string());
            }
        }
    }

    if conflicts.is_empty() {
        return Ok(());
    }
    log::error!("Concurrency conflict on {}", messages.join(", "));
    Err(DocStoreError::new(
        &format!("Concurrency conflict on {}", messages.join(", ")),
        ErrorKind::ConcurrencyConflict,
    )
    .with_keys(conflicts))
}

pub(crate) fn validate_command(command: &BatchCommand) -> DocStoreResult<()> {
    validate_key(command.key())?;
    match command {
        BatchCommand::Put {
            key,
            collection,
            document,
            ..
        } => {
            validate_collection(collection)?;
            validate_body(key, collection, document)
        }
        BatchCommand::DeleteAttachment { name, .. } => validate_attachment_name(name),
        BatchCommand::PutAttachment { attachment, .. } => validate_attachment_name(attachment.name()),
        BatchCommand::Delete { .. } => Ok(()),
    }
}

fn validate_collection(collection: &str) -> DocStoreResult<()> {
    if collection.trim().is_empty() {
        log::error!("Collection name cannot be empty");
        return Err(DocStoreError::new(
            "Collection name cannot be empty",
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

/// Metadata is owned by the store: `_revision` and `_modified` may not be
/// written, `_id` and `_collection` only when they agree with the command.
fn validate_body(key: &str, collection: &str, document: &Document) -> DocStoreResult<()> {
    for field in [DOC_REVISION, DOC_MODIFIED] {
        if document.contains_key(field) {
            log::error!("Document {} sets reserved field {}", key, field);
            return Err(DocStoreError::new(
                &format!("Field {} is maintained by the store and cannot be set", field),
                ErrorKind::ValidationError,
            )
            .with_keys(vec![key.to_string()]));
        }
    }

    for (field, expected) in [(DOC_ID, key), (DOC_COLLECTION, collection)] {
        match document.get(field) {
            None => {}
            Some(Value::String(value)) if value == expected => {}
            Some(value) => {
                log::error!("Document {} has {} {} but expected {}", key, field, value, expected);
                return Err(DocStoreError::new(
                    &format!("Field {} must be {:?}, found {}", field, expected, value),
                    ErrorKind::ValidationError,
                )
                .with_keys(vec![key.to_string()]));
            }
        }
    }
    Ok(())
}

/// Keys referenced by `path`: a string value or the strings of an array.
pub(crate) fn referenced_keys<'a>(document: &'a Document, path: &str) -> Vec<&'a str> {
    match document.get(path) {
        Some(Value::String(key)) => vec![key.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use std::thread;

    fn store() -> DocumentStore {
        DocumentStore::new("A", Tokenizer::default())
    }

    #[test]
    fn test_put_then_get() {
        let store = store();
        let body = doc! { Name: "RavenDB database", UnitsInStock: 10 };
        let key = store.put("Products", None, body.clone()).unwrap();
        assert_eq!(key, "products/1-A");

        let stored = store.get(&key).unwrap();
        assert_eq!(stored.without_metadata(), body);
        assert_eq!(stored.key(), Some("products/1-A"));
        assert_eq!(stored.collection(), Some("Products"));
        assert_eq!(stored.revision(), Some(1));
        assert!(stored.last_modified().is_some());
    }

    #[test]
    fn test_get_missing() {
        let err = store().get("products/404-A").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::NotFound);
    }

    #[test]
    fn test_get_many_omits_missing() {
        let store = store();
        store.put("Products", Some("products/1-A"), doc! { a: 1 }).unwrap();
        store.put("Products", Some("products/2-A"), doc! { a: 2 }).unwrap();

        let found = store
            .get_many(&["products/1-A", "products/404-A", "products/2-A"])
            .unwrap();
        assert_eq!(
            found.keys().cloned().collect::<Vec<_>>(),
            vec!["products/1-A".to_string(), "products/2-A".to_string()]
        );
    }

    #[test]
    fn test_revisions_are_monotonic() {
        let store = store();
        store.put("Products", Some("products/1-A"), doc! { a: 1 }).unwrap();
        store.put("Products", Some("products/2-A"), doc! { a: 1 }).unwrap();
        store.put("Products", Some("products/1-A"), doc! { a: 2 }).unwrap();
        assert_eq!(store.revision_of("products/1-A").unwrap(), Some(3));

        store.delete("products/1-A").unwrap();
        assert_eq!(store.revision_of("products/1-A").unwrap(), None);
        store.put("Products", Some("products/1-A"), doc! { a: 3 }).unwrap();
        assert_eq!(store.revision_of("products/1-A").unwrap(), Some(4));
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = store();
        let key = store.put("Products", None, doc! { a: 1 }).unwrap();
        store.delete(&key).unwrap();
        assert_eq!(store.get(&key).unwrap_err().kind(), &ErrorKind::NotFound);
        store.delete(&key).unwrap();
        assert!(!store.contains(&key).unwrap());
    }

    #[test]
    fn test_conflict_rejects_whole_batch() {
        let store = store();
        store.put("Products", Some("products/1-A"), doc! { a: 1 }).unwrap();
        store.put("Products", Some("products/2-A"), doc! { a: 1 }).unwrap();

        let err = store
            .apply_batch(vec![
                BatchCommand::put("products/1-A", "Products", doc! { a: 2 })
                    .with_expected_revision(1),
                BatchCommand::put("products/2-A", "Products", doc! { a: 2 })
                    .with_expected_revision(1),
                BatchCommand::put("products/3-A", "Products", doc! { a: 2 }),
            ])
            .unwrap_err();

        assert_eq!(err.kind(), &ErrorKind::ConcurrencyConflict);
        assert_eq!(err.affected_keys(), &["products/2-A".to_string()]);
        assert_eq!(store.get("products/1-A").unwrap().get("a"), Some(&Value::from(1)));
        assert!(!store.contains("products/3-A").unwrap());
        assert_eq!(store.statistics().last_revision(), 2);
    }

    #[test]
    fn test_expected_revision_zero_means_absent() {
        let store = store();
        store
            .apply_batch(vec![
                BatchCommand::put("users/1-A", "Users", doc! { a: 1 }).with_expected_revision(0),
            ])
            .unwrap();
        let err = store
            .apply_batch(vec![
                BatchCommand::put("users/1-A", "Users", doc! { a: 1 }).with_expected_revision(0),
            ])
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConcurrencyConflict);
    }

    #[test]
    fn test_unchecked_batch_ignores_revisions() {
        let store = store();
        store.put("Products", Some("products/1-A"), doc! { a: 1 }).unwrap();
        store
            .apply_batch_unchecked(vec![
                BatchCommand::put("products/1-A", "Products", doc! { a: 2 })
                    .with_expected_revision(42),
            ])
            .unwrap();
        assert_eq!(store.get("products/1-A").unwrap().get("a"), Some(&Value::from(2)));
    }

    #[test]
    fn test_reserved_fields_rejected() {
        let store = store();
        let err = store
            .put("Products", None, doc! { "_revision": 4 })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);

        let err = store
            .put("Products", Some("products/1-A"), doc! { "_id": "products/2-A" })
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);

        store
            .put("Products", Some("products/1-A"), doc! { "_id": "products/1-A" })
            .unwrap();
    }

    #[test]
    fn test_invalid_key_and_collection() {
        let store = store();
        let err = store.put("Products", Some(""), doc! {}).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidKey);
        let err = store.put(" ", None, doc! {}).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_caller_key_advances_generator() {
        let store = store();
        store.put("Products", Some("products/7-A"), doc! {}).unwrap();
        let key = store.put("Products", None, doc! {}).unwrap();
        assert_eq!(key, "products/8-A");
    }

    #[test]
    fn test_huge_caller_key_never_wraps_generator() {
        let store = store();
        store
            .put("Products", Some("products/18446744073709551615-A"), doc! {})
            .unwrap();
        assert_eq!(store.put("Products", None, doc! {}).unwrap(), "products/1-A");

        store
            .put("Products", Some("products/18446744073709551614-A"), doc! {})
            .unwrap();
        let err = store.put("Products", None, doc! {}).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidKey);
        assert_eq!(store.count("Products").unwrap(), 3);
    }

    #[test]
    fn test_get_with_includes() {
        let store = store();
        store
            .put("Categories", Some("categories/1-A"), doc! { Name: "Databases" })
            .unwrap();
        store
            .put(
                "Products",
                Some("products/1-A"),
                doc! { Name: "RavenDB", Category: "categories/1-A", Related: ["products/9-A"] },
            )
            .unwrap();

        let result = store
            .get_with_includes(&["products/1-A", "products/2-A"], &["Category", "Related"])
            .unwrap();
        assert_eq!(result.documents.len(), 1);
        assert_eq!(
            result.included["categories/1-A"]
                .as_ref()
                .and_then(|d| d.get_str("Name")),
            Some("Databases")
        );
        assert!(result.included["products/9-A"].is_none());
    }

    #[test]
    fn test_attachments() {
        let store = store();
        let key = store.put("Products", None, doc! { Name: "Rook" }).unwrap();

        let stored = store
            .store_attachment(&key, "rook-suit", &b"png bytes"[..], "image/png")
            .unwrap();
        let loaded = store.get_attachment(&key, "rook-suit").unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.data(), b"png bytes");
        assert_eq!(store.attachment_names(&key).unwrap(), vec!["rook-suit".to_string()]);
        assert_eq!(store.statistics().attachments(), 1);

        store.delete_attachment(&key, "rook-suit").unwrap();
        store.delete_attachment(&key, "rook-suit").unwrap();
        assert!(store.attachment_names(&key).unwrap().is_empty());
        assert_eq!(
            store.get_attachment(&key, "rook-suit").unwrap_err().kind(),
            &ErrorKind::NotFound
        );
    }

    #[test]
    fn test_attachment_errors_and_cascade() {
        let store = store();
        let err = store
            .store_attachment("products/1-A", "a", &b"x"[..], "text/plain")
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::NotFound);

        let key = store.put("Products", None, doc! {}).unwrap();
        let err = store
            .store_attachment(&key, "", &b"x"[..], "text/plain")
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);

        store.store_attachment(&key, "a", &b"x"[..], "text/plain").unwrap();
        store.delete(&key).unwrap();
        assert_eq!(store.statistics().attachments(), 0);
        assert_eq!(
            store.attachment_names(&key).unwrap_err().kind(),
            &ErrorKind::NotFound
        );
    }

    #[test]
    fn test_counts_and_collections() {
        let store = store();
        store.put("Products", None, doc! {}).unwrap();
        store.put("Products", None, doc! {}).unwrap();
        store.put("Categories", None, doc! {}).unwrap();
        assert_eq!(store.count("Products").unwrap(), 2);
        assert_eq!(store.count("Orders").unwrap(), 0);
        assert_eq!(
            store.collections().unwrap(),
            vec!["Categories".to_string(), "Products".to_string()]
        );
    }

    #[test]
    fn test_index_management() {
        let store = store();
        store.put("Products", None, doc! { UnitsInStock: 3 }).unwrap();
        store
            .create_index("Products", "UnitsInStock", IndexType::Field)
            .unwrap();
        assert!(store
            .has_index("Products", "UnitsInStock", IndexType::Field)
            .unwrap());

        let err = store
            .create_index("Products", "UnitsInStock", IndexType::Field)
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::IndexAlreadyExists);
        assert_eq!(store.list_indexes().unwrap().len(), 1);

        store
            .drop_index("Products", "UnitsInStock", IndexType::Field)
            .unwrap();
        let err = store
            .drop_index("Products", "UnitsInStock", IndexType::Field)
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::IndexNotFound);
    }

    #[test]
    fn test_closed_store() {
        let store = store();
        store.close();
        assert!(store.is_closed());
        assert_eq!(
            store.get("products/1-A").unwrap_err().kind(),
            &ErrorKind::StoreClosed
        );
        assert_eq!(
            store.put("Products", None, doc! {}).unwrap_err().kind(),
            &ErrorKind::StoreClosed
        );
    }

    #[test]
    fn test_readers_keep_their_snapshot() {
        let store = store();
        store.put("Products", Some("products/1-A"), doc! { a: 1 }).unwrap();
        let snapshot = store.read_snapshot().unwrap();
        store.put("Products", Some("products/1-A"), doc! { a: 2 }).unwrap();
        assert_eq!(snapshot.get("products/1-A").unwrap().get("a"), Some(&Value::from(1)));
    }

    #[test]
    fn test_concurrent_writers() {
        let store = store();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        store.put("Products", None, doc! { i: i }).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let statistics = store.statistics();
        assert_eq!(statistics.documents(), 1000);
        assert_eq!(statistics.last_revision(), 1000);
        assert_eq!(statistics.batches(), 1000);
    }
}
