use std::fmt::Display;

/// Point in time counters of a [DocumentStore](crate::store::DocumentStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStatistics {
    pub(crate) requests: u64,
    pub(crate) documents: usize,
    pub(crate) attachments: usize,
    pub(crate) batches: u64,
    pub(crate) last_revision: u64,
}

impl StoreStatistics {
    /// Number of read, write and query requests served.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn attachments(&self) -> usize {
        self.attachments
    }

    /// Number of successfully applied batches.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    pub fn last_revision(&self) -> u64 {
        self.last_revision
    }
}

impl Display for StoreStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "requests: {}, documents: {}, attachments: {}, batches: {}, last revision: {}",
            self.requests, self.documents, self.attachments, self.batches, self.last_revision
        )
    }
}
