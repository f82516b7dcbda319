use crate::collection::Document;
use crate::common::Value;
use im::{OrdMap, OrdSet};
use std::ops::Bound;

/// Ordered mapping of a field's value to the keys of the documents holding
/// it. Documents without the field are indexed under [Value::Null].
#[derive(Clone, Default, Debug)]
pub(crate) struct FieldIndex {
    field: String,
    entries: OrdMap<Value, OrdSet<String>>,
}

impl FieldIndex {
    pub(crate) fn new(field: &str) -> Self {
        FieldIndex {
            field: field.to_string(),
            entries: OrdMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, key: &str, document: &Document) {
        let value = document.get_or_null(&self.field);
        match self.entries.get_mut(&value) {
            Some(keys) => {
                keys.insert(key.to_string());
            }
            None => {
                self.entries.insert(value, OrdSet::unit(key.to_string()));
            }
        }
    }

    pub(crate) fn remove(&mut self, key: &str, document: &Document) {
        let value = document.get_or_null(&self.field);
        let now_empty = match self.entries.get_mut(&value) {
            Some(keys) => {
                keys.remove(key);
                keys.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.entries.remove(&value);
        }
    }

    /// Keys whose value equals `value`.
    pub(crate) fn find_eq(&self, value: &Value) -> OrdSet<String> {
        self.entries.get(value).cloned().unwrap_or_default()
    }

    /// Keys whose value lies within the bounds and is of the same kind as the
    /// bounds. Values of other kinds never satisfy a range.
    pub(crate) fn find_range(&self, lower: Bound<&Value>, upper: Bound<&Value>) -> OrdSet<String> {
        if is_empty_range(lower, upper) {
            return OrdSet::new();
        }
        let probe = match (lower, upper) {
            (Bound::Included(v), _) | (Bound::Excluded(v), _) => v.clone(),
            (_, Bound::Included(v)) | (_, Bound::Excluded(v)) => v.clone(),
            _ => return self.entries.values().fold(OrdSet::new(), |acc, s| acc.union(s.clone())),
        };
        let range = (lower.map(Value::clone), upper.map(Value::clone));

        let mut result = OrdSet::new();
        for (value, keys) in self.entries.range(range) {
            if value.same_kind(&probe) {
                result = result.union(keys.clone());
            }
        }
        result
    }

    /// Number of indexed entries, including documents without the field.
    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(OrdSet::len).sum()
    }
}

fn is_empty_range(lower: Bound<&Value>, upper: Bound<&Value>) -> bool {
    match (lower, upper) {
        (Bound::Included(lo), Bound::Included(hi)) => lo > hi,
        (Bound::Included(lo), Bound::Excluded(hi))
        | (Bound::Excluded(lo), Bound::Included(hi))
        | (Bound::Excluded(lo), Bound::Excluded(hi)) => lo >= hi,
        _ => false,
    }
}
