use crate::collection::Document;
use crate::common::{Value, DOC_MODIFIED, DOC_REVISION, RESERVED_FIELDS};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use std::fmt::Display;

/// Where a tracked document stands relative to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackingState {
    /// Loaded or committed, and not edited since.
    Unchanged,
    /// Loaded, then edited in the session.
    Modified,
    /// Stored in the session but not known to be persisted.
    New,
    /// Marked for deletion on the next commit.
    Deleted,
}

impl Display for TrackingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingState::Unchanged => write!(f, "Unchanged"),
            TrackingState::Modified => write!(f, "Modified"),
            TrackingState::New => write!(f, "New"),
            TrackingState::Deleted => write!(f, "Deleted"),
        }
    }
}

/// A document owned by a session.
///
/// `snapshot` is the document as last read from or written to the store;
/// `Modified` is derived by comparing it with `document`.
#[derive(Debug, Clone)]
pub(crate) struct TrackedEntity {
    pub(crate) collection: String,
    pub(crate) document: Document,
    pub(crate) snapshot: Option<Document>,
    pub(crate) revision: Option<u64>,
    pub(crate) deleted: bool,
}

impl TrackedEntity {
    pub(crate) fn loaded(document: Document) -> Self {
        TrackedEntity {
            collection: document.collection().unwrap_or_default().to_string(),
            revision: document.revision(),
            snapshot: Some(document.clone()),
            document,
            deleted: false,
        }
    }

    pub(crate) fn new(collection: &str, document: Document) -> Self {
        TrackedEntity {
            collection: collection.to_string(),
            document,
            snapshot: None,
            revision: None,
            deleted: false,
        }
    }

    pub(crate) fn state(&self) -> TrackingState {
        if self.deleted {
            return TrackingState::Deleted;
        }
        match &self.snapshot {
            None => TrackingState::New,
            Some(snapshot) if same_body(snapshot, &self.document) => TrackingState::Unchanged,
            Some(_) => TrackingState::Modified,
        }
    }

    /// The body to send to the store, with metadata stripped.
    ///
    /// Store-maintained fields may be carried over from the load but not
    /// changed.
    pub(crate) fn body(&self, key: &str) -> DocStoreResult<Document> {
        for field in [DOC_REVISION, DOC_MODIFIED] {
            let current = self.document.get(field);
            let loaded = self.snapshot.as_ref().and_then(|s| s.get(field));
            if current.is_some() && current != loaded {
                log::error!("Document {} changes reserved field {}", key, field);
                return Err(DocStoreError::new(
                    &format!("Field {} is maintained by the store and cannot be set", field),
                    ErrorKind::ValidationError,
                )
                .with_keys(vec![key.to_string()]));
            }
        }
        Ok(self.document.without_metadata())
    }
}

/// Compares two documents ignoring the store-maintained fields.
pub(crate) fn same_body(a: &Document, b: &Document) -> bool {
    a.iter().filter(is_user_field).eq(b.iter().filter(is_user_field))
}

fn is_user_field((name, _): &(&String, &Value)) -> bool {
    !RESERVED_FIELDS.contains(&name.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn loaded() -> Document {
        let mut doc = doc! { Name: "Rook" };
        doc.set_metadata("products/1-A", "Products", 3, 100);
        doc
    }

    #[test]
    fn test_states() {
        let mut entity = TrackedEntity::loaded(loaded());
        assert_eq!(entity.state(), TrackingState::Unchanged);
        assert_eq!(entity.revision, Some(3));
        assert_eq!(entity.collection, "Products");

        entity.document.put("Name", "Pawn").unwrap();
        assert_eq!(entity.state(), TrackingState::Modified);

        entity.document.put("Name", "Rook").unwrap();
        assert_eq!(entity.state(), TrackingState::Unchanged);

        entity.deleted = true;
        assert_eq!(entity.state(), TrackingState::Deleted);

        let entity = TrackedEntity::new("Products", doc! { Name: "Rook" });
        assert_eq!(entity.state(), TrackingState::New);
    }

    #[test]
    fn test_metadata_free_replacement_is_unchanged() {
        let mut entity = TrackedEntity::loaded(loaded());
        entity.document = doc! { Name: "Rook" };
        assert_eq!(entity.state(), TrackingState::Unchanged);
    }

    #[test]
    fn test_body_strips_metadata() {
        let entity = TrackedEntity::loaded(loaded());
        assert_eq!(entity.body("products/1-A").unwrap(), doc! { Name: "Rook" });
    }

    #[test]
    fn test_body_rejects_reserved_changes() {
        let mut entity = TrackedEntity::loaded(loaded());
        entity.document.put("_revision", 99).unwrap();
        let err = entity.body("products/1-A").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);

        let entity = TrackedEntity::new("Products", doc! { "_modified": 1 });
        assert!(entity.body("products/1-A").is_err());
    }
}
