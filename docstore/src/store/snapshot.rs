use crate::collection::Document;
use crate::index::IndexSet;
use crate::store::Attachment;
use im::{HashMap, OrdMap};

/// One committed, immutable state of the store.
///
/// Every part is a persistent map, so cloning a snapshot is O(1) and a
/// writer can build the next state while readers keep using this one.
#[derive(Clone, Default)]
pub(crate) struct Snapshot {
    pub(crate) documents: HashMap<String, Document>,
    pub(crate) attachments: HashMap<String, OrdMap<String, Attachment>>,
    pub(crate) attachment_count: usize,
    pub(crate) indexes: IndexSet,
    pub(crate) revision: u64,
}

impl Snapshot {
    pub(crate) fn get(&self, key: &str) -> Option<&Document> {
        self.documents.get(key)
    }

    /// Stored revision of `key`; `0` when the document does not exist.
    pub(crate) fn revision_of(&self, key: &str) -> u64 {
        self.documents
            .get(key)
            .and_then(Document::revision)
            .unwrap_or(0)
    }

    pub(crate) fn attachment(&self, key: &str, name: &str) -> Option<&Attachment> {
        self.attachments.get(key).and_then(|names| names.get(name))
    }
}
