use crate::collection::Document;
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::query::QueryStatistics;
use crate::store::Snapshot;
use std::sync::Arc;

/// Lazy iterator over the page of a query.
///
/// The matching keys are planned up front; each document is read from the
/// query's snapshot and projected only when the cursor reaches it. Writes
/// committed after the query started are not visible.
pub struct QueryCursor {
    snapshot: Arc<Snapshot>,
    keys: std::vec::IntoIter<String>,
    projection: Option<Vec<String>>,
    statistics: QueryStatistics,
}

impl QueryCursor {
    pub(crate) fn new(
        snapshot: Arc<Snapshot>,
        keys: Vec<String>,
        projection: Option<Vec<String>>,
        statistics: QueryStatistics,
    ) -> Self {
        QueryCursor {
            snapshot,
            keys: keys.into_iter(),
            projection,
            statistics,
        }
    }

    pub fn statistics(&self) -> &QueryStatistics {
        &self.statistics
    }

    /// Number of documents not yet returned.
    pub fn remaining(&self) -> usize {
        self.keys.len()
    }

    /// Keys of the documents not yet returned, in result order.
    pub fn keys(&self) -> &[String] {
        self.keys.as_slice()
    }

    fn load(&self, key: &str) -> DocStoreResult<Document> {
        let document = match self.snapshot.get(key) {
            Some(document) => document,
            None => {
                log::error!("Planned document {} missing from its snapshot", key);
                return Err(DocStoreError::new(
                    &format!("Document {} missing from query snapshot", key),
                    ErrorKind::InternalError,
                ));
            }
        };

        match &self.projection {
            Some(fields) => document.project(fields),
            None => Ok(document.clone()),
        }
    }
}

impl Iterator for QueryCursor {
    type Item = DocStoreResult<Document>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.keys.next()?;
        Some(self.load(&key))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.keys.size_hint()
    }
}

impl ExactSizeIterator for QueryCursor {}
