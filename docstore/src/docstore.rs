use crate::bulk::{BulkLoader, BulkLoaderOptions};
use crate::collection::{Document, DocumentKey};
use crate::docstore_builder::DocStoreBuilder;
use crate::docstore_config::DocStoreConfig;
use crate::errors::DocStoreResult;
use crate::index::{IndexDescriptor, IndexType};
use crate::query::Query;
use crate::session::{Session, SessionOptions};
use crate::store::{Attachment, BatchCommand, BatchResult, DocumentStore, StoreStatistics};
use indexmap::IndexMap;
use std::io::Read;
use std::sync::Arc;

/// An embedded document store.
///
/// `DocStore` is the entry point: it opens [Session]s for units of work,
/// [BulkLoader]s for ingestion and [Query]s for reads, and exposes the
/// underlying [DocumentStore] operations directly.
///
/// Clones share the same store and can be handed to other threads.
///
/// ```rust
/// use docstore::{doc, DocStore};
///
/// let store = DocStore::builder().open().unwrap();
///
/// let mut session = store.open_session();
/// let key = session.store("Products", doc! { Name: "Rook", UnitsInStock: 6 }).unwrap();
/// session.commit().unwrap();
///
/// assert_eq!(store.get(&key).unwrap().get_str("Name"), Some("Rook"));
/// store.close();
/// assert!(store.get(&key).is_err());
/// ```
#[derive(Clone)]
pub struct DocStore {
    inner: Arc<DocStoreInner>,
}

struct DocStoreInner {
    config: DocStoreConfig,
    store: DocumentStore,
}

impl DocStore {
    pub fn builder() -> DocStoreBuilder {
        DocStoreBuilder::new()
    }

    pub(crate) fn open(config: DocStoreConfig) -> DocStoreResult<Self> {
        config.initialize()?;
        let store = DocumentStore::new(&config.node_tag(), config.tokenizer());
        log::debug!("Opened document store with node tag {}", store.node_tag());
        Ok(DocStore {
            inner: Arc::new(DocStoreInner { config, store }),
        })
    }

    pub fn config(&self) -> &DocStoreConfig {
        &self.inner.config
    }

    /// The underlying store, for direct batch-level access.
    pub fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    /// Opens a session with the configured request limit.
    pub fn open_session(&self) -> Session {
        self.open_session_with_options(self.inner.config.session_options())
    }

    pub fn open_session_with_options(&self, options: SessionOptions) -> Session {
        Session::new(self.inner.store.clone(), options)
    }

    /// Runs `func` in a new session and commits it if `func` succeeds.
    pub fn with_session<F, R>(&self, func: F) -> DocStoreResult<R>
    where
        F: FnOnce(&mut Session) -> DocStoreResult<R>,
    {
        let mut session = self.open_session();
        let result = func(&mut session)?;
        session.commit()?;
        Ok(result)
    }

    /// Opens a bulk loader with the configured buffering limits.
    pub fn open_bulk_loader(&self) -> DocStoreResult<BulkLoader> {
        self.open_bulk_loader_with_options(self.inner.config.bulk_options())
    }

    pub fn open_bulk_loader_with_options(&self, options: BulkLoaderOptions) -> DocStoreResult<BulkLoader> {
        self.inner.store.ensure_open()?;
        BulkLoader::new(self.inner.store.clone(), options)
    }

    pub fn query(&self, collection: &str) -> Query {
        Query::new(self.inner.store.clone(), collection)
    }

    pub fn put(&self, collection: &str, key: Option<&str>, document: Document) -> DocStoreResult<String> {
        self.inner.store.put(collection, key, document)
    }

    pub fn get(&self, key: &str) -> DocStoreResult<Document> {
        self.inner.store.get(key)
    }

    pub fn get_many<S: AsRef<str>>(&self, keys: &[S]) -> DocStoreResult<IndexMap<String, Document>> {
        self.inner.store.get_many(keys)
    }

    pub fn delete(&self, key: &str) -> DocStoreResult<()> {
        self.inner.store.delete(key)
    }

    pub fn apply_batch(&self, commands: Vec<BatchCommand>) -> DocStoreResult<BatchResult> {
        self.inner.store.apply_batch(commands)
    }

    pub fn contains(&self, key: &str) -> DocStoreResult<bool> {
        self.inner.store.contains(key)
    }

    pub fn count(&self, collection: &str) -> DocStoreResult<usize> {
        self.inner.store.count(collection)
    }

    pub fn collections(&self) -> DocStoreResult<Vec<String>> {
        self.inner.store.collections()
    }

    pub fn next_key(&self, collection: &str) -> DocStoreResult<DocumentKey> {
        self.inner.store.next_key(collection)
    }

    pub fn store_attachment<R: Read>(
        &self,
        key: &str,
        name: &str,
        reader: R,
        content_type: &str,
    ) -> DocStoreResult<Attachment> {
        self.inner
            .store
            .store_attachment(key, name, reader, content_type)
    }

    pub fn get_attachment(&self, key: &str, name: &str) -> DocStoreResult<Attachment> {
        self.inner.store.get_attachment(key, name)
    }

    pub fn attachment_names(&self, key: &str) -> DocStoreResult<Vec<String>> {
        self.inner.store.attachment_names(key)
    }

    pub fn delete_attachment(&self, key: &str, name: &str) -> DocStoreResult<()> {
        self.inner.store.delete_attachment(key, name)
    }

    pub fn create_index(&self, collection: &str, field: &str, index_type: IndexType) -> DocStoreResult<IndexDescriptor> {
        self.inner.store.create_index(collection, field, index_type)
    }

    pub fn drop_index(&self, collection: &str, field: &str, index_type: IndexType) -> DocStoreResult<()> {
        self.inner.store.drop_index(collection, field, index_type)
    }

    pub fn has_index(&self, collection: &str, field: &str, index_type: IndexType) -> DocStoreResult<bool> {
        self.inner.store.has_index(collection, field, index_type)
    }

    pub fn list_indexes(&self) -> DocStoreResult<Vec<IndexDescriptor>> {
        self.inner.store.list_indexes()
    }

    pub fn statistics(&self) -> StoreStatistics {
        self.inner.store.statistics()
    }

    /// Closes the store; every later operation fails with
    /// [StoreClosed](crate::errors::ErrorKind::StoreClosed).
    pub fn close(&self) {
        self.inner.store.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.store.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::errors::ErrorKind;
    use crate::filter::field;

    #[test]
    fn test_clones_share_store() {
        let store = DocStore::builder().open().unwrap();
        let other = store.clone();
        let key = store.put("Products", None, doc! { Name: "Rook" }).unwrap();
        assert!(other.contains(&key).unwrap());
        assert_eq!(other.statistics().documents(), 1);
    }

    #[test]
    fn test_with_session_commits() {
        let store = DocStore::builder().open().unwrap();
        let key = store
            .with_session(|session| session.store("Products", doc! { Name: "Pawn" }))
            .unwrap();
        assert_eq!(store.get(&key).unwrap().get_str("Name"), Some("Pawn"));

        let result: DocStoreResult<()> = store.with_session(|session| {
            session.store("Products", doc! { Name: "Queen" })?;
            Err(crate::errors::DocStoreError::new("stop", ErrorKind::InvalidOperation))
        });
        assert!(result.is_err());
        assert_eq!(store.count("Products").unwrap(), 1);
    }

    #[test]
    fn test_query_and_indexes() {
        let store = DocStore::builder().open().unwrap();
        for units in [3, 7, 9] {
            store
                .put("Products", None, doc! { UnitsInStock: units })
                .unwrap();
        }
        store
            .create_index("Products", "UnitsInStock", IndexType::Field)
            .unwrap();
        assert!(store
            .has_index("Products", "UnitsInStock", IndexType::Field)
            .unwrap());
        assert_eq!(
            store
                .query("Products")
                .filter(field("UnitsInStock").gt(5))
                .count()
                .unwrap(),
            2
        );
        assert_eq!(store.list_indexes().unwrap().len(), 1);
        store
            .drop_index("Products", "UnitsInStock", IndexType::Field)
            .unwrap();
        assert!(store.list_indexes().unwrap().is_empty());
    }

    #[test]
    fn test_closed_store() {
        let store = DocStore::builder().open().unwrap();
        store.close();
        assert!(store.is_closed());
        let err = store.open_bulk_loader().err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::StoreClosed);
        let err = store.open_session().load("products/1-A").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreClosed);
    }
}
