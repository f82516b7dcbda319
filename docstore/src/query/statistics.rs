use std::fmt::Display;
use std::time::Duration;

/// Facts about one query execution, available from
/// [QueryCursor::statistics](crate::query::QueryCursor::statistics).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryStatistics {
    pub(crate) total_results: usize,
    pub(crate) skipped_results: usize,
    pub(crate) returned_results: usize,
    pub(crate) index_name: Option<String>,
    pub(crate) index_only: bool,
    pub(crate) snapshot_revision: u64,
    pub(crate) duration: Duration,
}

impl QueryStatistics {
    /// Number of matching documents before paging.
    pub fn total_results(&self) -> usize {
        self.total_results
    }

    pub fn skipped_results(&self) -> usize {
        self.skipped_results
    }

    /// Number of documents in the returned page.
    pub fn returned_results(&self) -> usize {
        self.returned_results
    }

    /// Name of the field or full-text index that seeded the candidates,
    /// `None` for a collection scan.
    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    /// `true` when the result was computed without reading any document.
    pub fn is_index_only(&self) -> bool {
        self.index_only
    }

    /// Store revision of the snapshot the query ran against.
    pub fn snapshot_revision(&self) -> u64 {
        self.snapshot_revision
    }

    /// Time spent planning the query.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Display for QueryStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "total: {}, skipped: {}, returned: {}, index: {}, index only: {}, revision: {}",
            self.total_results,
            self.skipped_results,
            self.returned_results,
            self.index_name.as_deref().unwrap_or("<collection scan>"),
            self.index_only,
            self.snapshot_revision
        )
    }
}
