use super::{FieldIndex, IndexDescriptor, IndexType, TextIndex};
use crate::collection::Document;
use crate::common::Tokenizer;
use im::{OrdMap, OrdSet};

type IndexKey = (String, String);

/// Every derived index of one snapshot: collection membership plus the
/// field and full-text indexes created by callers.
///
/// The whole set is persistent, so a write batch edits a cheap copy and
/// publishes it together with the documents.
#[derive(Clone, Default)]
pub(crate) struct IndexSet {
    collections: OrdMap<String, OrdSet<String>>,
    field_indexes: OrdMap<IndexKey, FieldIndex>,
    text_indexes: OrdMap<IndexKey, TextIndex>,
}

impl IndexSet {
    pub(crate) fn on_put(
        &mut self,
        key: &str,
        previous: Option<&Document>,
        document: &Document,
        tokenizer: &Tokenizer,
    ) {
        if let Some(previous) = previous {
            self.on_delete(key, previous, tokenizer);
        }

        let collection = document.collection().unwrap_or_default();
        match self.collections.get_mut(collection) {
            Some(keys) => {
                keys.insert(key.to_string());
            }
            None => {
                self.collections
                    .insert(collection.to_string(), OrdSet::unit(key.to_string()));
            }
        }

        for index_key in keys_of(&self.field_indexes, collection) {
            if let Some(index) = self.field_indexes.get_mut(&index_key) {
                index.insert(key, document);
            }
        }
        for index_key in keys_of(&self.text_indexes, collection) {
            if let Some(index) = self.text_indexes.get_mut(&index_key) {
                index.insert(key, document, tokenizer);
            }
        }
    }

    pub(crate) fn on_delete(&mut self, key: &str, document: &Document, tokenizer: &Tokenizer) {
        let collection = document.collection().unwrap_or_default();
        let now_empty = match self.collections.get_mut(collection) {
            Some(keys) => {
                keys.remove(key);
                keys.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.collections.remove(collection);
        }

        for index_key in keys_of(&self.field_indexes, collection) {
            if let Some(index) = self.field_indexes.get_mut(&index_key) {
                index.remove(key, document);
            }
        }
        for index_key in keys_of(&self.text_indexes, collection) {
            if let Some(index) = self.text_indexes.get_mut(&index_key) {
                index.remove(key, document, tokenizer);
            }
        }
    }

    /// Keys of every document in `collection`, in ascending key order.
    pub(crate) fn collection_keys(&self, collection: &str) -> OrdSet<String> {
        self.collections.get(collection).cloned().unwrap_or_default()
    }

    pub(crate) fn collection_count(&self, collection: &str) -> usize {
        self.collections.get(collection).map(OrdSet::len).unwrap_or(0)
    }

    pub(crate) fn collection_names(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }

    pub(crate) fn field_index(&self, collection: &str, field: &str) -> Option<&FieldIndex> {
        self.field_indexes
            .get(&(collection.to_string(), field.to_string()))
    }

    pub(crate) fn text_index(&self, collection: &str, field: &str) -> Option<&TextIndex> {
        self.text_indexes
            .get(&(collection.to_string(), field.to_string()))
    }

    pub(crate) fn has_index(&self, descriptor: &IndexDescriptor) -> bool {
        let key = index_key(descriptor);
        match descriptor.index_type() {
            IndexType::Field => self.field_indexes.contains_key(&key),
            IndexType::FullText => self.text_indexes.contains_key(&key),
        }
    }

    /// Builds a new index over `documents`, which must be the current
    /// members of the descriptor's collection.
    pub(crate) fn add_index<'a, I>(
        &mut self,
        descriptor: &IndexDescriptor,
        documents: I,
        tokenizer: &Tokenizer,
    ) where
        I: IntoIterator<Item = (&'a String, &'a Document)>,
    {
        let key = index_key(descriptor);
        match descriptor.index_type() {
            IndexType::Field => {
                let mut index = FieldIndex::new(descriptor.field());
                for (doc_key, document) in documents {
                    index.insert(doc_key, document);
                }
                self.field_indexes.insert(key, index);
            }
            IndexType::FullText => {
                let mut index = TextIndex::new(descriptor.field());
                for (doc_key, document) in documents {
                    index.insert(doc_key, document, tokenizer);
                }
                self.text_indexes.insert(key, index);
            }
        }
    }

    pub(crate) fn remove_index(&mut self, descriptor: &IndexDescriptor) -> bool {
        let key = index_key(descriptor);
        match descriptor.index_type() {
            IndexType::Field => self.field_indexes.remove(&key).is_some(),
            IndexType::FullText => self.text_indexes.remove(&key).is_some(),
        }
    }

    pub(crate) fn descriptors(&self) -> Vec<IndexDescriptor> {
        let fields = self
            .field_indexes
            .keys()
            .map(|(c, f)| IndexDescriptor::new(c, f, IndexType::Field));
        let texts = self
            .text_indexes
            .keys()
            .map(|(c, f)| IndexDescriptor::new(c, f, IndexType::FullText));
        let mut descriptors: Vec<_> = fields.chain(texts).collect();
        descriptors.sort();
        descriptors
    }
}

fn keys_of<V: Clone>(indexes: &OrdMap<IndexKey, V>, collection: &str) -> Vec<IndexKey> {
    if indexes.is_empty() {
        return Vec::new();
    }
    indexes
        .keys()
        .filter(|(c, _)| c == collection)
        .cloned()
        .collect()
}

fn index_key(descriptor: &IndexDescriptor) -> IndexKey {
    (
        descriptor.collection().to_string(),
        descriptor.field().to_string(),
    )
}
