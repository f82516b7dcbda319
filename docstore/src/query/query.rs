use crate::collection::Document;
use crate::common::SortOrder;
use crate::errors::DocStoreResult;
use crate::filter::{field, Filter};
use crate::query::{plan, validate, QueryCursor, QuerySpec};
use crate::store::DocumentStore;

/// A query over one collection.
///
/// ```rust
/// use docstore::DocStoreBuilder;
/// use docstore::filter::field;
/// use docstore::doc;
///
/// let store = DocStoreBuilder::new().open().unwrap();
/// store.put("Products", None, doc! { Name: "Rook", UnitsInStock: 7 }).unwrap();
///
/// let names: Vec<String> = store
///     .query("Products")
///     .filter(field("UnitsInStock").gt(5).and(field("UnitsInStock").lt(11)))
///     .order_by_descending("Name")
///     .skip(0)
///     .take(10)
///     .select(&["Name"])
///     .execute()
///     .unwrap()
///     .filter_map(|doc| doc.ok()?.get_str("Name").map(String::from))
///     .collect();
/// assert_eq!(names, vec!["Rook"]);
/// ```
#[derive(Clone)]
pub struct Query {
    store: DocumentStore,
    spec: QuerySpec,
}

impl Query {
    pub(crate) fn new(store: DocumentStore, collection: &str) -> Self {
        Query {
            store,
            spec: QuerySpec {
                collection: collection.to_string(),
                ..Default::default()
            },
        }
    }

    /// Adds a condition. Calling `filter` more than once combines the
    /// conditions with `and`.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.spec.filter = Some(match self.spec.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    /// Full-text search: keeps documents whose `field` contains any of
    /// `terms`.
    pub fn search<I, S>(self, field_name: &str, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter(field(field_name).search(terms))
    }

    pub fn order_by(mut self, field_name: &str, order: SortOrder) -> Self {
        self.spec.sort = Some((field_name.to_string(), order));
        self
    }

    pub fn order_by_descending(self, field_name: &str) -> Self {
        self.order_by(field_name, SortOrder::Descending)
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.spec.skip = skip;
        self
    }

    pub fn take(mut self, take: usize) -> Self {
        self.spec.take = Some(take);
        self
    }

    /// Returns only `fields` (plus `_id`) from each document.
    pub fn select<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.spec.projection = Some(fields.iter().map(|f| f.as_ref().to_string()).collect());
        self
    }

    pub fn collection(&self) -> &str {
        &self.spec.collection
    }

    /// Checks the filter, sort and projection without running the query.
    pub fn validate(&self) -> DocStoreResult<()> {
        validate(&self.spec)
    }

    /// Plans the query against the current snapshot and returns a cursor
    /// over the requested page.
    pub fn execute(&self) -> DocStoreResult<QueryCursor> {
        let snapshot = self.store.read_snapshot()?;
        let plan = plan(&snapshot, &self.spec, self.store.tokenizer())?;
        Ok(QueryCursor::new(
            snapshot,
            plan.keys,
            self.spec.projection.clone(),
            plan.statistics,
        ))
    }

    /// Collects the whole page.
    pub fn to_vec(&self) -> DocStoreResult<Vec<Document>> {
        self.execute()?.collect()
    }

    /// Number of matching documents, ignoring skip and take.
    pub fn count(&self) -> DocStoreResult<usize> {
        let mut query = self.clone();
        query.spec.take = Some(0);
        Ok(query.execute()?.statistics().total_results())
    }

    /// The first document of the page, if any.
    pub fn first(&self) -> DocStoreResult<Option<Document>> {
        let mut query = self.clone();
        query.spec.take = Some(1);
        query.execute()?.next().transpose()
    }
}
