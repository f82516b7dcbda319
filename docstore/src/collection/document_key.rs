use crate::common::{KEY_COLLECTION_SEPARATOR, KEY_TAG_SEPARATOR, MAX_KEY_LENGTH};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use std::fmt::Display;
use std::ops::Deref;

/// A validated document key such as `products/1-A`.
///
/// Keys are case sensitive, non-empty, at most 512 bytes and free of control
/// characters. A key never changes once assigned to a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentKey(String);

impl DocumentKey {
    pub fn new(key: &str) -> DocStoreResult<Self> {
        validate_key(key)?;
        Ok(DocumentKey(key.to_string()))
    }

    /// Builds the conventional `{prefix}/{sequence}-{tag}` key.
    pub(crate) fn generated(prefix: &str, sequence: u64, node_tag: &str) -> Self {
        DocumentKey(format!(
            "{}{}{}{}{}",
            prefix, KEY_COLLECTION_SEPARATOR, sequence, KEY_TAG_SEPARATOR, node_tag
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns the part before the first `/`, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.0
            .split_once(KEY_COLLECTION_SEPARATOR)
            .map(|(prefix, _)| prefix)
    }
}

pub(crate) fn validate_key(key: &str) -> DocStoreResult<()> {
    if key.trim().is_empty() {
        log::error!("Document key cannot be empty");
        return Err(DocStoreError::new(
            "Document key cannot be empty",
            ErrorKind::InvalidKey,
        ));
    }

    if key.len() > MAX_KEY_LENGTH {
        log::error!("Document key is longer than {} bytes", MAX_KEY_LENGTH);
        return Err(DocStoreError::new(
            &format!("Document key is longer than {} bytes", MAX_KEY_LENGTH),
            ErrorKind::InvalidKey,
        ));
    }

    if key.chars().any(char::is_control) {
        log::error!("Document key {:?} contains control characters", key);
        return Err(DocStoreError::new(
            &format!("Document key {:?} contains control characters", key),
            ErrorKind::InvalidKey,
        ));
    }
    Ok(())
}

impl Deref for DocumentKey {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DocumentKey> for String {
    fn from(key: DocumentKey) -> Self {
        key.0
    }
}

impl TryFrom<&str> for DocumentKey {
    type Error = DocStoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        DocumentKey::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_key() {
        let key = DocumentKey::new("products/1-A").unwrap();
        assert_eq!(key.as_str(), "products/1-A");
        assert_eq!(key.prefix(), Some("products"));
        assert_eq!(key.to_string(), "products/1-A");
    }

    #[test]
    fn test_key_without_prefix() {
        let key = DocumentKey::new("settings").unwrap();
        assert_eq!(key.prefix(), None);
    }

    #[test]
    fn test_invalid_keys() {
        for key in ["", "   ", "a\nb"] {
            let err = DocumentKey::new(key).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidKey);
        }
        let long = "x".repeat(MAX_KEY_LENGTH + 1);
        assert!(DocumentKey::new(&long).is_err());
        let max = "x".repeat(MAX_KEY_LENGTH);
        assert!(DocumentKey::new(&max).is_ok());
    }

    #[test]
    fn test_generated() {
        let key = DocumentKey::generated("categories", 42, "B");
        assert_eq!(key.as_str(), "categories/42-B");
    }
}
