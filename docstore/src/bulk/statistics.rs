use std::fmt::Display;

/// Progress counters of a [BulkLoader](crate::bulk::BulkLoader).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkLoadStatistics {
    pub(crate) documents_submitted: u64,
    pub(crate) documents_flushed: u64,
    pub(crate) chunks_flushed: u64,
    pub(crate) chunks_failed: u64,
}

impl BulkLoadStatistics {
    /// Documents handed to [store](crate::bulk::BulkLoader::store).
    pub fn documents_submitted(&self) -> u64 {
        self.documents_submitted
    }

    /// Documents committed to the store.
    pub fn documents_flushed(&self) -> u64 {
        self.documents_flushed
    }

    pub fn chunks_flushed(&self) -> u64 {
        self.chunks_flushed
    }

    pub fn chunks_failed(&self) -> u64 {
        self.chunks_failed
    }
}

impl Display for BulkLoadStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} submitted, {} flushed in {} chunks, {} chunks failed",
            self.documents_submitted, self.documents_flushed, self.chunks_flushed, self.chunks_failed
        )
    }
}
