use crate::collection::Document;
use crate::common::{SortOrder, Tokenizer, Value};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use crate::filter::{
    conjuncts, is_all_filter, EqualsFilter, Filter, InFilter, RangeFilter, SearchFilter,
};
use crate::index::{IndexDescriptor, IndexType};
use crate::query::QueryStatistics;
use crate::store::Snapshot;
use im::OrdSet;
use std::cmp::Ordering;
use std::time::Instant;

/// What a query asks for, independent of the store it runs on.
#[derive(Clone, Default)]
pub(crate) struct QuerySpec {
    pub(crate) collection: String,
    pub(crate) filter: Option<Filter>,
    pub(crate) sort: Option<(String, SortOrder)>,
    pub(crate) skip: usize,
    pub(crate) take: Option<usize>,
    pub(crate) projection: Option<Vec<String>>,
}

pub(crate) struct QueryPlan {
    pub(crate) keys: Vec<String>,
    pub(crate) statistics: QueryStatistics,
}

/// Candidate keys produced by an index, and the conditions left to check.
struct Seed {
    index: Option<IndexDescriptor>,
    candidates: OrdSet<String>,
    residual: Vec<Filter>,
}

pub(crate) fn validate(spec: &QuerySpec) -> DocStoreResult<()> {
    if let Some(filter) = &spec.filter {
        filter.validate()?;
    }

    if let Some((field, _)) = &spec.sort {
        if field.trim().is_empty() {
            log::error!("Query on {} sorts by an empty field", spec.collection);
            return Err(DocStoreError::new(
                "Sort field cannot be empty",
                ErrorKind::FilterError,
            ));
        }
    }

    if let Some(fields) = &spec.projection {
        if fields.iter().any(|field| field.trim().is_empty()) {
            log::error!("Query on {} projects an empty field", spec.collection);
            return Err(DocStoreError::new(
                "Projection field cannot be empty",
                ErrorKind::FilterError,
            ));
        }
    }
    Ok(())
}

/// Plans `spec` against `snapshot`: chooses the candidate source, applies
/// the residual conditions, sorts and pages. Documents are read only when
/// a condition or the sort needs them.
pub(crate) fn plan(snapshot: &Snapshot, spec: &QuerySpec, tokenizer: &Tokenizer) -> DocStoreResult<QueryPlan> {
    validate(spec)?;
    let started = Instant::now();

    let seed = seed(snapshot, spec, tokenizer);
    let index_only = seed.residual.is_empty() && spec.sort.is_none();

    let (total, skipped, keys) = if index_only {
        // the index already holds the answer; only the page is copied out
        page(seed.candidates.iter(), seed.candidates.len(), spec)
    } else {
        let mut matches: Vec<(&String, Value)> = Vec::new();
        for key in seed.candidates.iter() {
            let document = match snapshot.get(key) {
                Some(document) => document,
                None => continue,
            };
            if !matches_all(&seed.residual, document, tokenizer)? {
                continue;
            }
            let sort_value = match &spec.sort {
                Some((field, _)) => document.get_or_null(field),
                None => Value::Null,
            };
            matches.push((key, sort_value));
        }

        if let Some((_, order)) = &spec.sort {
            // nulls and missing fields are the lowest values; ties go to the
            // lower key in both directions
            matches.sort_by(|(key_a, a), (key_b, b)| match order.apply(a.cmp(b)) {
                Ordering::Equal => key_a.cmp(key_b),
                other => other,
            });
        }
        let total = matches.len();
        page(matches.iter().map(|(key, _)| *key), total, spec)
    };

    let statistics = QueryStatistics {
        total_results: total,
        skipped_results: skipped,
        returned_results: keys.len(),
        index_name: seed.index.as_ref().map(IndexDescriptor::name),
        index_only,
        snapshot_revision: snapshot.revision,
        duration: started.elapsed(),
    };
    log::debug!("Query on {}: {}", spec.collection, statistics);

    Ok(QueryPlan { keys, statistics })
}

/// Copies the `skip..skip + take` window of `keys` out of `total` matches.
fn page<'a, I>(keys: I, total: usize, spec: &QuerySpec) -> (usize, usize, Vec<String>)
where
    I: Iterator<Item = &'a String>,
{
    let skipped = spec.skip.min(total);
    let keys = keys
        .skip(skipped)
        .take(spec.take.unwrap_or(usize::MAX))
        .cloned()
        .collect();
    (total, skipped, keys)
}

fn matches_all(filters: &[Filter], document: &Document, tokenizer: &Tokenizer) -> DocStoreResult<bool> {
    for filter in filters {
        if !filter.apply(document, tokenizer)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn seed(snapshot: &Snapshot, spec: &QuerySpec, tokenizer: &Tokenizer) -> Seed {
    let conditions: Vec<Filter> = match &spec.filter {
        Some(filter) if !is_all_filter(filter) => conjuncts(filter),
        _ => Vec::new(),
    };

    for (position, condition) in conditions.iter().enumerate() {
        if let Some((index, candidates)) = index_scan(snapshot, &spec.collection, condition, tokenizer) {
            let residual = conditions
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != position)
                .map(|(_, f)| f.clone())
                .collect();
            return Seed {
                index: Some(index),
                candidates,
                residual,
            };
        }
    }

    Seed {
        index: None,
        candidates: snapshot.indexes.collection_keys(&spec.collection),
        residual: conditions,
    }
}

/// Answers `condition` from an index of `collection`, if one fits.
fn index_scan(
    snapshot: &Snapshot,
    collection: &str,
    condition: &Filter,
    tokenizer: &Tokenizer,
) -> Option<(IndexDescriptor, OrdSet<String>)> {
    let field = condition.field_name()?;
    let indexes = &snapshot.indexes;

    if let Some(search) = condition.downcast::<SearchFilter>() {
        let index = indexes.text_index(collection, field)?;
        let candidates = index.find_any(search.tokens(tokenizer));
        return Some((
            IndexDescriptor::new(collection, field, IndexType::FullText),
            candidates,
        ));
    }

    let index = indexes.field_index(collection, field)?;
    let candidates = if let Some(equals) = condition.downcast::<EqualsFilter>() {
        index.find_eq(equals.value())
    } else if let Some(range) = condition.downcast::<RangeFilter>() {
        index.find_range(range.lower(), range.upper())
    } else if let Some(within) = condition.downcast::<InFilter>() {
        within
            .values()
            .iter()
            .fold(OrdSet::new(), |acc, value| acc.union(index.find_eq(value)))
    } else {
        return None;
    };

    Some((
        IndexDescriptor::new(collection, field, IndexType::Field),
        candidates,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::{all, field};
    use crate::store::DocumentStore;

    fn store() -> DocumentStore {
        let store = DocumentStore::new("A", Tokenizer::default());
        for (i, (name, units)) in [
            ("Rook", 6),
            ("Pawn", 8),
            ("Bishop", 4),
            ("Queen", 8),
            ("King", 10),
            ("Knight", 11),
        ]
        .into_iter()
        .enumerate()
        {
            let key = format!("products/{}-A", i + 1);
            store
                .put(
                    "Products",
                    Some(&key),
                    doc! { Name: name, UnitsInStock: units },
                )
                .unwrap();
        }
        store
            .put("Categories", Some("categories/1-A"), doc! { Name: "Chess" })
            .unwrap();
        store
    }

    fn run(store: &DocumentStore, spec: QuerySpec) -> QueryPlan {
        let snapshot = store.read_snapshot().unwrap();
        plan(&snapshot, &spec, store.tokenizer()).unwrap()
    }

    fn products(filter: Filter) -> QuerySpec {
        QuerySpec {
            collection: "Products".to_string(),
            filter: Some(filter),
            ..Default::default()
        }
    }

    #[test]
    fn test_collection_scan() {
        let store = store();
        let plan = run(&store, products(all()));
        assert_eq!(plan.keys.len(), 6);
        assert!(plan.statistics.is_index_only());
        assert_eq!(plan.statistics.index_name(), None);
    }

    #[test]
    fn test_range_sorted_descending_with_key_ties() {
        let store = store();
        let mut spec = products(field("UnitsInStock").gt(5).and(field("UnitsInStock").lt(11)));
        spec.sort = Some(("UnitsInStock".to_string(), SortOrder::Descending));
        let plan = run(&store, spec);
        assert_eq!(
            plan.keys,
            vec!["products/5-A", "products/2-A", "products/4-A", "products/1-A"]
        );
        assert_eq!(plan.statistics.total_results(), 4);
        assert!(!plan.statistics.is_index_only());
    }

    #[test]
    fn test_sort_ascending_nulls_first() {
        let store = store();
        store
            .put("Products", Some("products/7-A"), doc! { Name: "Nameless" })
            .unwrap();
        let mut spec = products(all());
        spec.sort = Some(("UnitsInStock".to_string(), SortOrder::Ascending));
        let plan = run(&store, spec);
        assert_eq!(plan.keys[0], "products/7-A");
        assert_eq!(plan.keys[1], "products/3-A");
    }

    #[test]
    fn test_paging() {
        let store = store();
        let mut spec = products(all());
        spec.sort = Some(("Name".to_string(), SortOrder::Ascending));
        spec.skip = 2;
        spec.take = Some(3);
        let plan = run(&store, spec);
        assert_eq!(plan.keys, vec!["products/6-A", "products/2-A", "products/4-A"]);
        assert_eq!(plan.statistics.total_results(), 6);
        assert_eq!(plan.statistics.skipped_results(), 2);
        assert_eq!(plan.statistics.returned_results(), 3);

        let mut spec = products(all());
        spec.skip = 10;
        let plan = run(&store, spec);
        assert!(plan.keys.is_empty());
        assert_eq!(plan.statistics.skipped_results(), 6);
    }

    #[test]
    fn test_field_index_seeds_candidates() {
        let store = store();
        store
            .create_index("Products", "UnitsInStock", IndexType::Field)
            .unwrap();

        let plan = run(&store, products(field("UnitsInStock").eq(8)));
        assert_eq!(plan.keys, vec!["products/2-A", "products/4-A"]);
        assert_eq!(plan.statistics.index_name(), Some("Products/ByUnitsInStock"));
        assert!(plan.statistics.is_index_only());

        let plan = run(
            &store,
            products(field("Name").eq("Queen").and(field("UnitsInStock").gte(8))),
        );
        assert_eq!(plan.keys, vec!["products/4-A"]);
        assert_eq!(plan.statistics.index_name(), Some("Products/ByUnitsInStock"));
        assert!(!plan.statistics.is_index_only());

        let plan = run(&store, products(field("UnitsInStock").in_array(vec![4, 11])));
        assert_eq!(plan.keys, vec!["products/3-A", "products/6-A"]);
    }

    #[test]
    fn test_index_only_count_copies_page_only() {
        let store = store();
        store
            .create_index("Products", "UnitsInStock", IndexType::Field)
            .unwrap();

        let mut spec = products(field("UnitsInStock").gte(6));
        spec.take = Some(0);
        let plan = run(&store, spec);
        assert!(plan.statistics.is_index_only());
        assert_eq!(plan.statistics.total_results(), 5);
        assert!(plan.keys.is_empty());

        let mut spec = products(field("UnitsInStock").gte(6));
        spec.skip = 1;
        spec.take = Some(2);
        let plan = run(&store, spec);
        assert_eq!(plan.keys, vec!["products/2-A", "products/4-A"]);
        assert_eq!(plan.statistics.total_results(), 5);
        assert_eq!(plan.statistics.skipped_results(), 1);
        assert_eq!(plan.statistics.returned_results(), 2);
    }

    #[test]
    fn test_large_integers_match_in_index_and_scan() {
        let store = DocumentStore::new("A", Tokenizer::default());
        let big = 1_i64 << 53;
        store.put("P", Some("p/1-A"), doc! { v: big }).unwrap();
        store.put("P", Some("p/2-A"), doc! { v: (big + 1) }).unwrap();
        let spec = QuerySpec {
            collection: "P".to_string(),
            filter: Some(field("v").eq(big as f64)),
            ..Default::default()
        };

        let scanned = run(&store, spec.clone());
        store.create_index("P", "v", IndexType::Field).unwrap();
        let indexed = run(&store, spec);
        assert_eq!(indexed.statistics.index_name(), Some("P/Byv"));
        assert_eq!(scanned.keys, vec!["p/1-A"]);
        assert_eq!(indexed.keys, scanned.keys);
    }

    #[test]
    fn test_text_index_and_scan_agree() {
        let store = store();
        let spec = products(field("Name").search(["rook", "QUEEN"]));
        let scanned = run(&store, spec.clone());
        assert_eq!(scanned.statistics.index_name(), None);

        store
            .create_index("Products", "Name", IndexType::FullText)
            .unwrap();
        let indexed = run(&store, spec);
        assert_eq!(indexed.statistics.index_name(), Some("Products/SearchName"));
        assert_eq!(indexed.keys, scanned.keys);
        assert_eq!(indexed.keys, vec!["products/1-A", "products/4-A"]);
    }

    #[test]
    fn test_invalid_query_fails_before_results() {
        let store = store();
        let snapshot = store.read_snapshot().unwrap();
        let tokenizer = store.tokenizer();

        let err = plan(&snapshot, &products(field("UnitsInStock").gt(Value::Null)), tokenizer)
            .err()
            .unwrap();
        assert_eq!(err.kind(), &ErrorKind::FilterError);

        let mut spec = products(all());
        spec.sort = Some((String::new(), SortOrder::Ascending));
        assert!(plan(&snapshot, &spec, tokenizer).is_err());

        let mut spec = products(all());
        spec.projection = Some(vec!["".to_string()]);
        assert!(plan(&snapshot, &spec, tokenizer).is_err());

        let spec = products(field("Name").search(Vec::<String>::new()));
        assert!(plan(&snapshot, &spec, tokenizer).is_err());
    }
}
