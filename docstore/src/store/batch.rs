use crate::collection::Document;
use crate::store::Attachment;
use indexmap::IndexMap;

/// One write inside an atomic batch.
///
/// `expected_revision` makes a command conditional: the batch fails with
/// [ConcurrencyConflict](crate::errors::ErrorKind::ConcurrencyConflict) when
/// the stored revision differs. A missing document has revision `0`.
#[derive(Debug, Clone)]
pub enum BatchCommand {
    Put {
        key: String,
        collection: String,
        document: Document,
        expected_revision: Option<u64>,
    },
    Delete {
        key: String,
        expected_revision: Option<u64>,
    },
    PutAttachment {
        key: String,
        attachment: Attachment,
    },
    DeleteAttachment {
        key: String,
        name: String,
    },
}

impl BatchCommand {
    pub fn put(key: &str, collection: &str, document: Document) -> Self {
        BatchCommand::Put {
            key: key.to_string(),
            collection: collection.to_string(),
            document,
            expected_revision: None,
        }
    }

    pub fn delete(key: &str) -> Self {
        BatchCommand::Delete {
            key: key.to_string(),
            expected_revision: None,
        }
    }

    pub fn put_attachment(key: &str, attachment: Attachment) -> Self {
        BatchCommand::PutAttachment {
            key: key.to_string(),
            attachment,
        }
    }

    pub fn delete_attachment(key: &str, name: &str) -> Self {
        BatchCommand::DeleteAttachment {
            key: key.to_string(),
            name: name.to_string(),
        }
    }

    /// Makes a `Put` or `Delete` conditional on the stored revision.
    /// Attachment commands ignore it.
    pub fn with_expected_revision(mut self, revision: u64) -> Self {
        match &mut self {
            BatchCommand::Put {
                expected_revision, ..
            }
            | BatchCommand::Delete {
                expected_revision, ..
            } => *expected_revision = Some(revision),
            _ => {}
        }
        self
    }

    pub fn key(&self) -> &str {
        match self {
            BatchCommand::Put { key, .. }
            | BatchCommand::Delete { key, .. }
            | BatchCommand::PutAttachment { key, .. }
            | BatchCommand::DeleteAttachment { key, .. } => key,
        }
    }

    pub(crate) fn expected_revision(&self) -> Option<u64> {
        match self {
            BatchCommand::Put {
                expected_revision, ..
            }
            | BatchCommand::Delete {
                expected_revision, ..
            } => *expected_revision,
            _ => None,
        }
    }

    pub(crate) fn estimated_size(&self) -> usize {
        match self {
            BatchCommand::Put { key, document, .. } => key.len() + document.estimated_size(),
            BatchCommand::PutAttachment { key, attachment } => key.len() + attachment.size(),
            BatchCommand::Delete { key, .. } | BatchCommand::DeleteAttachment { key, .. } => {
                key.len()
            }
        }
    }
}

/// Outcome of a successful batch.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    revision: u64,
    documents: IndexMap<String, Option<Document>>,
}

impl BatchResult {
    pub(crate) fn new(revision: u64, documents: IndexMap<String, Option<Document>>) -> Self {
        BatchResult {
            revision,
            documents,
        }
    }

    /// The store revision after the batch.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Every document the batch touched, in command order: the stored
    /// document (metadata included) for puts, `None` for deletes.
    pub fn documents(&self) -> &IndexMap<String, Option<Document>> {
        &self.documents
    }

    pub fn document(&self, key: &str) -> Option<&Document> {
        self.documents.get(key).and_then(Option::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_expected_revision() {
        let put = BatchCommand::put("products/1-A", "Products", doc! { Name: "x" })
            .with_expected_revision(4);
        assert_eq!(put.expected_revision(), Some(4));
        assert_eq!(put.key(), "products/1-A");

        let delete = BatchCommand::delete("products/1-A");
        assert_eq!(delete.expected_revision(), None);

        let attachment = Attachment::from_bytes("a", "text/plain", vec![1, 2]);
        let put_attachment =
            BatchCommand::put_attachment("products/1-A", attachment).with_expected_revision(1);
        assert_eq!(put_attachment.expected_revision(), None);
        assert_eq!(put_attachment.estimated_size(), "products/1-A".len() + 2);
    }
}
