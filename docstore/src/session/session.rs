use crate::collection::Document;
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::query::Query;
use crate::session::{Entity, SessionOptions, TrackedEntity, TrackingState};
use crate::store::{referenced_keys, Attachment, BatchCommand, DocumentStore};
use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::HashSet;
use std::io::Read;
use uuid::Uuid;

/// A unit of work against the store.
///
/// A session caches every document it loads and tracks the changes made to
/// them. Nothing is written until [Session::commit], which sends every
/// change as one atomic batch. Loaded documents are committed with a
/// revision check, so a concurrent edit fails the commit with
/// [ErrorKind::ConcurrencyConflict] instead of being overwritten.
///
/// A session is meant to be used by one caller at a time and for a short
/// span of work.
pub struct Session {
    id: Uuid,
    store: DocumentStore,
    options: SessionOptions,
    entities: IndexMap<String, TrackedEntity>,
    missing: HashSet<String>,
    pending_attachments: Vec<BatchCommand>,
    requests: u32,
}

impl Session {
    pub(crate) fn new(store: DocumentStore, options: SessionOptions) -> Self {
        let id = Uuid::new_v4();
        log::debug!("Opened session {}", id);
        Session {
            id,
            store,
            options,
            entities: IndexMap::new(),
            missing: HashSet::new(),
            pending_attachments: Vec::new(),
            requests: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Number of requests this session has sent to the store.
    pub fn number_of_requests(&self) -> u32 {
        self.requests
    }

    /// Tracks `document` for insertion or update and returns its key.
    ///
    /// * Without `_id`, a key such as `products/1-A` is generated and the
    ///   document is tracked as [TrackingState::New].
    /// * With the `_id` of a tracked document, the tracked value is replaced;
    ///   the commit decides whether it changed.
    /// * With any other `_id`, the document is tracked as new and overwrites
    ///   whatever the store holds under that key.
    pub fn store(&mut self, collection: &str, mut document: Document) -> DocStoreResult<String> {
        let key = match document.key() {
            Some(key) => key.to_string(),
            None => {
                let key = self.store.next_key(collection)?.into_string();
                document.set_key(&key);
                key
            }
        };

        match self.entities.get_mut(&key) {
            Some(entity) => {
                let previous = std::mem::replace(&mut entity.document, document);
                if let Err(err) = entity.body(&key) {
                    entity.document = previous;
                    return Err(err);
                }
                entity.collection = collection.to_string();
                entity.deleted = false;
            }
            None => {
                crate::collection::validate_key(&key)?;
                let entity = TrackedEntity::new(collection, document);
                entity.body(&key)?;
                self.store.observe_key(&key);
                self.missing.remove(&key);
                self.entities.insert(key.clone(), entity);
            }
        }
        Ok(key)
    }

    /// Returns the document stored under `key`, or `None` if it does not
    /// exist.
    ///
    /// Documents already in the session, and keys already known to be
    /// missing, are answered without a request.
    pub fn load(&mut self, key: &str) -> DocStoreResult<Option<Document>> {
        if let Some(answer) = self.cached(key) {
            return Ok(answer);
        }
        self.fetch(&[key.to_string()], &[])?;
        Ok(self.cached(key).flatten())
    }

    /// Loads every key in one request. Every requested key is present in the
    /// result; documents that do not exist map to `None`.
    pub fn load_many<S: AsRef<str>>(&mut self, keys: &[S]) -> DocStoreResult<IndexMap<String, Option<Document>>> {
        self.include_paths(Vec::new()).load_many(keys)
    }

    /// Starts a load that also fetches the documents referenced by `path`
    /// in the same request.
    ///
    /// ```rust
    /// # use docstore::{doc, DocStoreBuilder};
    /// let store = DocStoreBuilder::new().open().unwrap();
    /// let mut session = store.open_session();
    /// let category = session.store("Categories", doc! { Name: "Chess" }).unwrap();
    /// let product = session
    ///     .store("Products", doc! { Name: "Rook", Category: (category.clone()) })
    ///     .unwrap();
    /// session.commit().unwrap();
    ///
    /// let mut session = store.open_session();
    /// session.include("Category").load(&product).unwrap();
    /// session.load(&category).unwrap();
    /// assert_eq!(session.number_of_requests(), 1);
    /// ```
    pub fn include(&mut self, path: &str) -> LoadBuilder<'_> {
        self.include_paths(vec![path.to_string()])
    }

    fn include_paths(&mut self, paths: Vec<String>) -> LoadBuilder<'_> {
        LoadBuilder {
            session: self,
            paths,
        }
    }

    /// Mutable access to a tracked document for in-place edits.
    pub fn get_mut(&mut self, key: &str) -> DocStoreResult<&mut Document> {
        match self.entities.get_mut(key) {
            Some(entity) if !entity.deleted => Ok(&mut entity.document),
            _ => {
                log::error!("Document {} is not tracked by session {}", key, self.id);
                Err(DocStoreError::new(
                    &format!("Document {} is not tracked by this session", key),
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    /// Marks `key` for deletion on the next commit. A loaded document is
    /// deleted only if its revision is unchanged.
    pub fn delete(&mut self, key: &str) -> DocStoreResult<()> {
        crate::collection::validate_key(key)?;
        match self.entities.get_mut(key) {
            Some(entity) => entity.deleted = true,
            None => {
                let mut entity = TrackedEntity::new("", Document::new());
                entity.deleted = true;
                self.entities.insert(key.to_string(), entity);
            }
        }
        Ok(())
    }

    /// Reads `reader` now and stores it as attachment `name` of `key` on the
    /// next commit.
    pub fn store_attachment<R: Read>(
        &mut self,
        key: &str,
        name: &str,
        reader: R,
        content_type: &str,
    ) -> DocStoreResult<()> {
        crate::collection::validate_key(key)?;
        let attachment = Attachment::from_reader(name, content_type, reader)?;
        self.pending_attachments
            .push(BatchCommand::put_attachment(key, attachment));
        Ok(())
    }

    /// Removes attachment `name` of `key` on the next commit.
    pub fn delete_attachment(&mut self, key: &str, name: &str) -> DocStoreResult<()> {
        crate::collection::validate_key(key)?;
        crate::store::validate_attachment_name(name)?;
        self.pending_attachments
            .push(BatchCommand::delete_attachment(key, name));
        Ok(())
    }

    /// Sends every pending change to the store as a single atomic batch.
    ///
    /// A session without changes makes no request. On success the tracked
    /// documents take the stored values and revisions and deleted documents
    /// leave the session. On failure the session is left as it was, so the
    /// caller can reload and retry.
    pub fn commit(&mut self) -> DocStoreResult<()> {
        let commands = self.pending_commands()?;
        if commands.is_empty() {
            log::debug!("Session {} has nothing to commit", self.id);
            return Ok(());
        }

        self.count_request()?;
        let result = self.store.apply_batch(commands)?;

        for (key, stored) in result.documents() {
            match stored {
                Some(document) => {
                    self.entities
                        .insert(key.clone(), TrackedEntity::loaded(document.clone()));
                }
                None => {
                    self.entities.shift_remove(key);
                    self.missing.insert(key.clone());
                }
            }
        }
        self.pending_attachments.clear();

        log::debug!(
            "Session {} committed {} documents at revision {}",
            self.id,
            result.documents().len(),
            result.revision()
        );
        Ok(())
    }

    /// `true` if a commit would send anything.
    pub fn has_changes(&self) -> bool {
        !self.pending_attachments.is_empty()
            || self
                .entities
                .values()
                .any(|entity| entity.state() != TrackingState::Unchanged)
    }

    /// Tracking state of `key`, or `None` if the session does not track it.
    pub fn tracking_state(&self, key: &str) -> Option<TrackingState> {
        self.entities.get(key).map(TrackedEntity::state)
    }

    /// Stops tracking `key`, discarding its pending changes.
    pub fn evict(&mut self, key: &str) {
        self.entities.shift_remove(key);
        self.missing.remove(key);
        self.pending_attachments.retain(|command| command.key() != key);
    }

    /// Stops tracking everything, discarding every pending change.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.missing.clear();
        self.pending_attachments.clear();
    }

    /// Starts a query over `collection`. Queries read the store directly,
    /// not the session's tracked documents, and count as a request.
    pub fn query(&mut self, collection: &str) -> DocStoreResult<Query> {
        self.count_request()?;
        Ok(Query::new(self.store.clone(), collection))
    }

    /// Tracks `entity` and writes its generated key back when it had none.
    pub fn store_entity<T: Entity>(&mut self, entity: &mut T) -> DocStoreResult<String> {
        let mut document = entity.to_document()?.without_metadata();
        if let Some(id) = entity.id() {
            document.set_key(id);
        }
        let key = self.store(T::collection_name(), document)?;
        entity.set_id(&key);
        Ok(key)
    }

    pub fn load_entity<T: Entity>(&mut self, key: &str) -> DocStoreResult<Option<T>> {
        match self.load(key)? {
            Some(document) => Ok(Some(T::from_document(&document)?)),
            None => Ok(None),
        }
    }

    pub fn load_entities<T: Entity, S: AsRef<str>>(&mut self, keys: &[S]) -> DocStoreResult<IndexMap<String, Option<T>>> {
        self.load_many(keys)?
            .into_iter()
            .map(|(key, document)| {
                let entity = document.as_ref().map(T::from_document).transpose()?;
                Ok((key, entity))
            })
            .collect()
    }

    pub fn delete_entity<T: Entity>(&mut self, entity: &T) -> DocStoreResult<()> {
        match entity.id() {
            Some(id) => self.delete(id),
            None => {
                log::error!("Cannot delete an entity without an id");
                Err(DocStoreError::new(
                    "Cannot delete an entity without an id",
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    /// `Some(answer)` when the session can answer a load of `key` itself.
    fn cached(&self, key: &str) -> Option<Option<Document>> {
        if let Some(entity) = self.entities.get(key) {
            return Some(if entity.deleted {
                None
            } else {
                Some(entity.document.clone())
            });
        }
        if self.missing.contains(key) {
            return Some(None);
        }
        None
    }

    fn is_known(&self, key: &str) -> bool {
        self.entities.contains_key(key) || self.missing.contains(key)
    }

    /// Fetches `keys` and the documents they reference through `paths` in a
    /// single request, and tracks everything that comes back.
    fn fetch(&mut self, keys: &[String], paths: &[String]) -> DocStoreResult<()> {
        self.count_request()?;
        let result = self.store.get_with_includes(keys, paths)?;

        for key in keys {
            if !result.documents.contains_key(key) && !self.entities.contains_key(key) {
                self.missing.insert(key.clone());
            }
        }
        for (key, document) in result.documents {
            self.track_loaded(key, document);
        }
        for (key, document) in result.included {
            match document {
                Some(document) => self.track_loaded(key, document),
                None => {
                    if !self.entities.contains_key(&key) {
                        self.missing.insert(key);
                    }
                }
            }
        }
        Ok(())
    }

    /// Documents already tracked keep the session's version.
    fn track_loaded(&mut self, key: String, document: Document) {
        self.missing.remove(&key);
        self.entities
            .entry(key)
            .or_insert_with(|| TrackedEntity::loaded(document));
    }

    fn count_request(&mut self) -> DocStoreResult<()> {
        if self.requests >= self.options.get_max_requests() {
            log::error!(
                "Session {} exceeded its limit of {} requests",
                self.id,
                self.options.get_max_requests()
            );
            return Err(DocStoreError::new(
                &format!(
                    "The maximum number of requests ({}) allowed for this session has been reached",
                    self.options.get_max_requests()
                ),
                ErrorKind::InvalidOperation,
            ));
        }
        self.requests += 1;
        Ok(())
    }

    fn pending_commands(&self) -> DocStoreResult<Vec<BatchCommand>> {
        let mut commands = Vec::new();
        for (key, entity) in &self.entities {
            match entity.state() {
                TrackingState::Unchanged => {}
                TrackingState::New => {
                    commands.push(BatchCommand::put(key, &entity.collection, entity.body(key)?));
                }
                TrackingState::Modified => {
                    let mut command = BatchCommand::put(key, &entity.collection, entity.body(key)?);
                    if let Some(revision) = entity.revision {
                        command = command.with_expected_revision(revision);
                    }
                    commands.push(command);
                }
                TrackingState::Deleted => {
                    let mut command = BatchCommand::delete(key);
                    if let Some(revision) = entity.revision {
                        command = command.with_expected_revision(revision);
                    }
                    commands.push(command);
                }
            }
        }
        commands.extend(self.pending_attachments.iter().cloned());
        Ok(commands)
    }
}

/// A load that co-fetches referenced documents, started with
/// [Session::include].
pub struct LoadBuilder<'a> {
    session: &'a mut Session,
    paths: Vec<String>,
}

impl<'a> LoadBuilder<'a> {
    /// Adds another include path.
    pub fn include(mut self, path: &str) -> Self {
        self.paths.push(path.to_string());
        self
    }

    pub fn load(self, key: &str) -> DocStoreResult<Option<Document>> {
        let mut loaded = self.load_many(&[key])?;
        Ok(loaded.swap_remove(key).flatten())
    }

    /// Loads `keys` and their includes in at most one request.
    pub fn load_many<S: AsRef<str>>(self, keys: &[S]) -> DocStoreResult<IndexMap<String, Option<Document>>> {
        let session = self.session;
        let mut wanted: Vec<String> = Vec::new();

        for key in keys {
            let key = key.as_ref();
            match session.cached(key) {
                // a cached document may still reference unloaded keys
                Some(Some(document)) => wanted.extend(
                    self.paths
                        .iter()
                        .flat_map(|path| referenced_keys(&document, path))
                        .filter(|referenced| !session.is_known(referenced))
                        .map(String::from),
                ),
                Some(None) => {}
                None => wanted.push(key.to_string()),
            }
        }
        let to_fetch: Vec<String> = wanted.into_iter().unique().collect();

        if !to_fetch.is_empty() {
            session.fetch(&to_fetch, &self.paths)?;
        }

        Ok(keys
            .iter()
            .map(|key| {
                let key = key.as_ref();
                (key.to_string(), session.cached(key).flatten())
            })
            .collect())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.has_changes() {
            log::debug!("Session {} dropped with uncommitted changes", self.id);
        }
    }
}
