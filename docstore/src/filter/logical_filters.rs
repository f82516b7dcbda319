use std::any::Any;
use std::fmt::Display;

use crate::collection::Document;
use crate::common::Tokenizer;
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};

use super::{Filter, FilterProvider};

pub(crate) struct AndFilter {
    filters: Vec<Filter>,
}

impl AndFilter {
    /// Nested conjunctions are flattened so the planner sees every condition.
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        let mut flat = Vec::with_capacity(filters.len());
        for filter in filters {
            match filter.downcast::<AndFilter>() {
                Some(and) => flat.extend(and.filters.iter().cloned()),
                None => flat.push(filter),
            }
        }
        AndFilter { filters: flat }
    }

    pub(crate) fn filters(&self) -> &[Filter] {
        &self.filters
    }
}

impl Display for AndFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", join(&self.filters, " && "))
    }
}

impl FilterProvider for AndFilter {
    #[inline]
    fn apply(&self, document: &Document, tokenizer: &Tokenizer) -> DocStoreResult<bool> {
        for filter in &self.filters {
            if !filter.apply(document, tokenizer)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn validate(&self) -> DocStoreResult<()> {
        validate_children(&self.filters, self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct OrFilter {
    filters: Vec<Filter>,
}

impl OrFilter {
    pub(crate) fn new(filters: Vec<Filter>) -> Self {
        OrFilter { filters }
    }
}

impl Display for OrFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", join(&self.filters, " || "))
    }
}

impl FilterProvider for OrFilter {
    #[inline]
    fn apply(&self, document: &Document, tokenizer: &Tokenizer) -> DocStoreResult<bool> {
        for filter in &self.filters {
            if filter.apply(document, tokenizer)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn validate(&self) -> DocStoreResult<()> {
        validate_children(&self.filters, self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct NotFilter {
    filter: Filter,
}

impl NotFilter {
    pub(crate) fn new(filter: Filter) -> Self {
        NotFilter { filter }
    }
}

impl Display for NotFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(not {})", self.filter)
    }
}

impl FilterProvider for NotFilter {
    #[inline]
    fn apply(&self, document: &Document, tokenizer: &Tokenizer) -> DocStoreResult<bool> {
        Ok(!self.filter.apply(document, tokenizer)?)
    }

    fn validate(&self) -> DocStoreResult<()> {
        self.filter.validate()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn join(filters: &[Filter], separator: &str) -> String {
    filters
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

fn validate_children(filters: &[Filter], parent: &dyn Display) -> DocStoreResult<()> {
    if filters.is_empty() {
        log::error!("Logical filter {} has no conditions", parent);
        return Err(DocStoreError::new(
            "Logical filter needs at least one condition",
            ErrorKind::FilterError,
        ));
    }
    filters.iter().try_for_each(|filter| filter.validate())
}
