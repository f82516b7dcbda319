use crate::collection::Document;
use crate::common::Tokenizer;
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use std::any::Any;
use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;

use super::{AllFilter, AndFilter, NotFilter, OrFilter};

/// A predicate over documents.
///
/// Filters are validated once before a query produces any result, then
/// applied to each candidate document. Full-text filters tokenize the
/// document field with the store's [Tokenizer], which is passed to
/// [FilterProvider::apply].
pub trait FilterProvider: Any + Send + Sync + Display {
    fn apply(&self, document: &Document, tokenizer: &Tokenizer) -> DocStoreResult<bool>;

    /// Checks the filter is well formed. Returns [ErrorKind::FilterError]
    /// otherwise.
    fn validate(&self) -> DocStoreResult<()> {
        Ok(())
    }

    /// The field the filter inspects, for single field filters.
    fn field_name(&self) -> Option<&str> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a [FilterProvider], combinable with [Filter::and],
/// [Filter::or] and [Filter::not].
#[derive(Clone)]
pub struct Filter {
    inner: Arc<dyn FilterProvider>,
}

impl Filter {
    pub fn new<T: FilterProvider + 'static>(inner: T) -> Self {
        Filter {
            inner: Arc::new(inner),
        }
    }

    pub fn and(&self, filter: Filter) -> Self {
        Filter::new(AndFilter::new(vec![self.clone(), filter]))
    }

    pub fn or(&self, filter: Filter) -> Self {
        Filter::new(OrFilter::new(vec![self.clone(), filter]))
    }

    pub fn not(&self) -> Self {
        Filter::new(NotFilter::new(self.clone()))
    }

    pub(crate) fn downcast<T: FilterProvider>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref::<T>()
    }
}

impl Display for Filter {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Deref for Filter {
    type Target = Arc<dyn FilterProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Default for Filter {
    fn default() -> Self {
        all()
    }
}

/// Matches every document.
pub fn all() -> Filter {
    Filter::new(AllFilter)
}

pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::new(AndFilter::new(filters))
}

pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::new(OrFilter::new(filters))
}

pub fn not(filter: Filter) -> Filter {
    Filter::new(NotFilter::new(filter))
}

pub(crate) fn is_all_filter(filter: &Filter) -> bool {
    filter.as_any().is::<AllFilter>()
}

/// Splits a top level conjunction into its conditions. Any other filter is
/// returned as a single condition.
pub(crate) fn conjuncts(filter: &Filter) -> Vec<Filter> {
    match filter.downcast::<AndFilter>() {
        Some(and) => and.filters().to_vec(),
        None => vec![filter.clone()],
    }
}

pub(crate) fn validate_field_name(field: &str, filter: &dyn Display) -> DocStoreResult<()> {
    if field.trim().is_empty() {
        log::error!("Filter {} has an empty field name", filter);
        return Err(DocStoreError::new(
            "Filter field name cannot be empty",
            ErrorKind::FilterError,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::field;
    use std::fmt::Formatter;

    struct MockFilter;

    impl Display for MockFilter {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            write!(f, "MockFilter")
        }
    }

    impl FilterProvider for MockFilter {
        fn apply(&self, _document: &Document, _tokenizer: &Tokenizer) -> DocStoreResult<bool> {
            Ok(true)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_custom_filter() {
        let filter = Filter::new(MockFilter);
        let tokenizer = Tokenizer::default();
        assert!(filter.apply(&Document::new(), &tokenizer).unwrap());
        assert!(filter.validate().is_ok());
        assert!(filter.field_name().is_none());
        assert_eq!(filter.to_string(), "MockFilter");
    }

    #[test]
    fn test_combinators() {
        let tokenizer = Tokenizer::default();
        let doc = doc! { a: 1, b: 2 };

        let both = field("a").eq(1).and(field("b").eq(2));
        assert!(both.apply(&doc, &tokenizer).unwrap());

        let either = field("a").eq(5).or(field("b").eq(2));
        assert!(either.apply(&doc, &tokenizer).unwrap());

        let negated = field("a").eq(1).not();
        assert!(!negated.apply(&doc, &tokenizer).unwrap());
    }

    #[test]
    fn test_conjuncts_flatten() {
        let filter = field("a").eq(1).and(field("b").eq(2)).and(field("c").eq(3));
        assert_eq!(conjuncts(&filter).len(), 3);
        assert_eq!(conjuncts(&field("a").eq(1)).len(), 1);
        assert_eq!(conjuncts(&field("a").eq(1).or(field("b").eq(1))).len(), 1);
    }

    #[test]
    fn test_all_filter() {
        assert!(is_all_filter(&all()));
        assert!(is_all_filter(&Filter::default()));
        assert!(!is_all_filter(&field("a").eq(1)));
    }
}
