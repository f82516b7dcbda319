use crate::collection::Document;
use crate::common::{Tokenizer, Value};
use im::{OrdMap, OrdSet};
use std::collections::BTreeSet;

/// Term postings for one text field. String values and arrays of strings
/// are tokenized; anything else is not indexed.
#[derive(Clone, Debug)]
pub(crate) struct TextIndex {
    field: String,
    postings: OrdMap<String, OrdSet<String>>,
}

impl TextIndex {
    pub(crate) fn new(field: &str) -> Self {
        TextIndex {
            field: field.to_string(),
            postings: OrdMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, key: &str, document: &Document, tokenizer: &Tokenizer) {
        for term in self.terms_of(document, tokenizer) {
            match self.postings.get_mut(&term) {
                Some(keys) => {
                    keys.insert(key.to_string());
                }
                None => {
                    self.postings.insert(term, OrdSet::unit(key.to_string()));
                }
            }
        }
    }

    pub(crate) fn remove(&mut self, key: &str, document: &Document, tokenizer: &Tokenizer) {
        for term in self.terms_of(document, tokenizer) {
            let now_empty = match self.postings.get_mut(&term) {
                Some(keys) => {
                    keys.remove(key);
                    keys.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.postings.remove(&term);
            }
        }
    }

    /// Keys of documents containing any of the already tokenized `terms`.
    pub(crate) fn find_any(&self, terms: &[String]) -> OrdSet<String> {
        terms
            .iter()
            .filter_map(|term| self.postings.get(term))
            .fold(OrdSet::new(), |acc, keys| acc.union(keys.clone()))
    }

    pub(crate) fn term_count(&self) -> usize {
        self.postings.len()
    }

    fn terms_of(&self, document: &Document, tokenizer: &Tokenizer) -> BTreeSet<String> {
        let mut terms = BTreeSet::new();
        match document.get(&self.field) {
            Some(Value::String(text)) => terms.extend(tokenizer.tokenize(text)),
            Some(Value::Array(items)) => {
                for text in items.iter().filter_map(Value::as_str) {
                    terms.extend(tokenizer.tokenize(text));
                }
            }
            _ => {}
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn test_find_any() {
        let tokenizer = Tokenizer::default();
        let mut index = TextIndex::new("Name");
        index.insert("products/1-A", &doc! { Name: "Product #999995" }, &tokenizer);
        index.insert("products/2-A", &doc! { Name: "Product #999996" }, &tokenizer);
        index.insert("products/3-A", &doc! { Name: "Product #999997" }, &tokenizer);

        let keys = index.find_any(&["999996".to_string(), "999995".to_string()]);
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("products/1-A"));
        assert!(keys.contains("products/2-A"));

        assert_eq!(index.find_any(&["product".to_string()]).len(), 3);
        assert!(index.find_any(&["missing".to_string()]).is_empty());
    }

    #[test]
    fn test_array_values_and_remove() {
        let tokenizer = Tokenizer::default();
        let mut index = TextIndex::new("Tags");
        let doc = doc! { Tags: ["red wine", "cheese"] };
        index.insert("items/1-A", &doc, &tokenizer);
        assert_eq!(index.term_count(), 3);
        assert!(index.find_any(&["wine".to_string()]).contains("items/1-A"));

        index.remove("items/1-A", &doc, &tokenizer);
        assert_eq!(index.term_count(), 0);
    }

    #[test]
    fn test_non_text_values_ignored() {
        let tokenizer = Tokenizer::default();
        let mut index = TextIndex::new("Name");
        index.insert("items/1-A", &doc! { Name: 42 }, &tokenizer);
        assert_eq!(index.term_count(), 0);
    }
}
