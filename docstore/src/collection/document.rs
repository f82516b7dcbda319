use im::OrdMap;
use smallvec::SmallVec;

use crate::common::{
    write_json_string, Value, DOC_COLLECTION, DOC_ID, DOC_MODIFIED, DOC_REVISION, FIELD_SEPARATOR,
    RESERVED_FIELDS,
};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use std::fmt::{Debug, Display};

pub type FieldVec = SmallVec<[String; 8]>;

/// A schema-less document: an ordered mapping of field name to [Value].
///
/// Nested documents are addressed with a `.` separated path, so for
/// `{"address": {"city": "Oslo"}}` the call `document.get("address.city")`
/// returns the city. Array elements are addressed by position
/// (`"tags.0"`).
///
/// The store maintains these metadata fields on every document it returns:
///
/// * `_id` - the document key.
/// * `_collection` - the collection the document belongs to.
/// * `_revision` - the revision assigned by the last write.
/// * `_modified` - the last write time in milliseconds since the epoch.
///
/// ## Cheap copies
///
/// The fields live in an `im::OrdMap`, so cloning a document is O(1) and
/// edits share structure with the original. Sessions rely on this to keep a
/// load-time snapshot of every tracked document.
#[derive(Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Document {
    data: OrdMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: OrdMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of top level entries.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, creating intermediate documents for an
    /// embedded key such as `"address.city"`.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::ValidationError] if the key or one of its path
    /// segments is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use docstore::collection::Document;
    /// use docstore::common::Value;
    ///
    /// let mut doc = Document::new();
    /// doc.put("Name", "RavenDB").unwrap();
    /// doc.put("address.city", "Hadera").unwrap();
    /// assert_eq!(doc.get("address.city"), Some(&Value::from("Hadera")));
    /// ```
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> DocStoreResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(DocStoreError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }

        let value = value.into();
        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value)
        } else {
            self.data.insert(key.to_string(), value);
            Ok(())
        }
    }

    /// Returns the value at `key`, following embedded paths into nested
    /// documents and arrays. Missing fields return `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(key) {
            return Some(value);
        }
        if !key.contains(FIELD_SEPARATOR) {
            return None;
        }

        let mut segments = key.split(FIELD_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.data.get(first)?;
        for segment in segments {
            current = match current {
                Value::Document(doc) => doc.data.get(segment)?,
                Value::Array(items) => {
                    let index = segment.parse::<usize>().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Returns the value at `key` or [Value::Null] when it is missing.
    pub fn get_or_null(&self, key: &str) -> Value {
        self.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Returns a mutable reference to a top level value.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Returns the string value at `key`, if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Removes the value at `key`. Removing a missing key is a no-op.
    ///
    /// Removing the last field of an embedded document removes the embedded
    /// document too.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if let Some(value) = self.data.remove(key) {
            return Some(value);
        }
        if !key.contains(FIELD_SEPARATOR) {
            return None;
        }
        let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        self.deep_remove(&splits)
    }

    /// Checks if a top level key exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Checks if a top level or embedded field exists.
    pub fn contains_field(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Returns every leaf field path, excluding the reserved metadata fields.
    pub fn fields(&self) -> FieldVec {
        self.fields_with_prefix("")
    }

    /// Iterates over the top level entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Merges `other` into this document, merging nested documents
    /// recursively and overwriting everything else.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.data.iter() {
            match (self.data.get_mut(key), value) {
                (Some(Value::Document(existing)), Value::Document(incoming)) => {
                    existing.merge(incoming)
                }
                _ => {
                    self.data.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Returns the document key stored in `_id`, if any.
    pub fn key(&self) -> Option<&str> {
        self.data.get(DOC_ID).and_then(Value::as_str)
    }

    /// Returns the collection stored in `_collection`, if any.
    pub fn collection(&self) -> Option<&str> {
        self.data.get(DOC_COLLECTION).and_then(Value::as_str)
    }

    /// Returns the revision stored in `_revision`, if any.
    pub fn revision(&self) -> Option<u64> {
        self.data
            .get(DOC_REVISION)
            .and_then(Value::as_i64)
            .and_then(|r| u64::try_from(r).ok())
    }

    /// Returns the last modified time stored in `_modified`, if any.
    pub fn last_modified(&self) -> Option<i64> {
        self.data.get(DOC_MODIFIED).and_then(Value::as_i64)
    }

    /// Returns a copy of this document with every reserved field removed.
    pub fn without_metadata(&self) -> Document {
        let mut data = self.data.clone();
        for field in RESERVED_FIELDS {
            data.remove(field);
        }
        Document { data }
    }

    /// Returns a copy containing only the given field paths. Missing fields
    /// are skipped; `_id` is always kept.
    pub fn project(&self, fields: &[String]) -> DocStoreResult<Document> {
        let mut projected = Document::new();
        if let Some(key) = self.key() {
            projected.data.insert(DOC_ID.to_string(), Value::from(key));
        }
        for field in fields {
            if let Some(value) = self.get(field) {
                projected.put(field, value.clone())?;
            }
        }
        Ok(projected)
    }

    pub(crate) fn set_metadata(
        &mut self,
        key: &str,
        collection: &str,
        revision: u64,
        modified: i64,
    ) {
        self.data.insert(DOC_ID.to_string(), Value::from(key));
        self.data
            .insert(DOC_COLLECTION.to_string(), Value::from(collection));
        self.data
            .insert(DOC_REVISION.to_string(), Value::from(revision));
        self.data.insert(DOC_MODIFIED.to_string(), Value::from(modified));
    }

    pub(crate) fn set_key(&mut self, key: &str) {
        self.data.insert(DOC_ID.to_string(), Value::from(key));
    }

    pub(crate) fn estimated_size(&self) -> usize {
        self.data
            .iter()
            .map(|(k, v)| k.len() + v.estimated_size())
            .sum()
    }

    pub(crate) fn write_json(&self, out: &mut String) {
        out.push('{');
        for (i, (key, value)) in self.data.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_json_string(key, out);
            out.push(':');
            value.write_json(out);
        }
        out.push('}');
    }

    fn fields_with_prefix(&self, prefix: &str) -> FieldVec {
        let mut fields = FieldVec::new();
        for (key, value) in self.data.iter() {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                continue;
            }

            let field = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
            };

            match value {
                Value::Document(doc) if !doc.is_empty() => {
                    fields.extend(doc.fields_with_prefix(&field))
                }
                _ => fields.push(field),
            }
        }
        fields
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> DocStoreResult<()> {
        let key = match splits.first() {
            Some(key) if !key.is_empty() => *key,
            _ => {
                log::error!("Invalid embedded key {:?}", splits.join(FIELD_SEPARATOR));
                return Err(DocStoreError::new(
                    "Document does not support empty key segments",
                    ErrorKind::ValidationError,
                ));
            }
        };

        if splits.len() == 1 {
            self.data.insert(key.to_string(), value);
            return Ok(());
        }

        let remaining = &splits[1..];
        match self.data.get_mut(key) {
            Some(Value::Document(nested)) => nested.deep_put(remaining, value),
            _ => {
                // a missing or scalar intermediate becomes a new document
                let mut nested = Document::new();
                nested.deep_put(remaining, value)?;
                self.data.insert(key.to_string(), Value::Document(nested));
                Ok(())
            }
        }
    }

    fn deep_remove(&mut self, splits: &[&str]) -> Option<Value> {
        let key = *splits.first()?;
        if splits.len() == 1 {
            return self.data.remove(key);
        }

        let remaining = &splits[1..];
        let (removed, now_empty) = match self.data.get_mut(key)? {
            Value::Document(nested) => {
                let removed = nested.deep_remove(remaining);
                (removed, nested.is_empty())
            }
            Value::Array(items) if remaining.len() == 1 => {
                let index = remaining[0].parse::<usize>().ok()?;
                if index < items.len() {
                    (Some(items.remove(index)), false)
                } else {
                    (None, false)
                }
            }
            _ => (None, false),
        };

        if now_empty {
            self.data.remove(key);
        }
        removed
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut out = String::new();
        self.write_json(&mut out);
        f.write_str(&out)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Document {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Strips the quotes `stringify!` leaves around string literal keys.
#[doc(hidden)]
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// # Examples
///
/// ```rust
/// use docstore::doc;
///
/// let units = 10;
/// let product = doc! {
///     "Name": "RavenDB database",
///     "Category": "categories/1-A",
///     "UnitsInStock": units,
///     "Tags": ["db", "nosql"],
///     "Supplier": { "Name": "Hibernating Rhinos" },
/// };
/// assert_eq!(product.get_str("Supplier.Name"), Some("Hibernating Rhinos"));
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            let mut doc = $crate::collection::Document::new();
            $(
                doc.put(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
