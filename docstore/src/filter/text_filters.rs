use crate::collection::Document;
use crate::common::{Tokenizer, Value};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt::Display;

use super::{validate_field_name, FilterProvider};

/// Full-text search: matches documents whose field contains any of the
/// search terms.
pub(crate) struct SearchFilter {
    field: String,
    terms: Vec<String>,
    tokens: OnceCell<Vec<String>>,
}

impl SearchFilter {
    pub(crate) fn new(field: String, terms: Vec<String>) -> Self {
        SearchFilter {
            field,
            terms,
            tokens: OnceCell::new(),
        }
    }

    /// The search terms run through `tokenizer`, computed once.
    pub(crate) fn tokens(&self, tokenizer: &Tokenizer) -> &[String] {
        self.tokens.get_or_init(|| {
            let mut tokens: Vec<String> = self
                .terms
                .iter()
                .flat_map(|term| tokenizer.tokenize(term))
                .collect();
            tokens.sort();
            tokens.dedup();
            tokens
        })
    }
}

impl Display for SearchFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(search({}, {:?}))", self.field, self.terms)
    }
}

impl FilterProvider for SearchFilter {
    fn apply(&self, document: &Document, tokenizer: &Tokenizer) -> DocStoreResult<bool> {
        let tokens = self.tokens(tokenizer);
        let matches = |text: &str| {
            tokenizer
                .tokenize(text)
                .iter()
                .any(|token| tokens.binary_search(token).is_ok())
        };

        Ok(match document.get(&self.field) {
            Some(Value::String(text)) => matches(text),
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).any(matches),
            _ => false,
        })
    }

    fn validate(&self) -> DocStoreResult<()> {
        validate_field_name(&self.field, self)?;
        if self.terms.iter().all(|term| term.trim().is_empty()) {
            log::error!("Search on {} has no terms", self.field);
            return Err(DocStoreError::new(
                &format!("Search on field {} needs at least one term", self.field),
                ErrorKind::FilterError,
            ));
        }
        Ok(())
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
