use std::fmt::Display;

/// Kind of derived index maintained for a collection field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexType {
    /// Ordered value index answering equality, range and `in` filters.
    Field,
    /// Term postings answering full-text searches.
    FullText,
}

impl Display for IndexType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexType::Field => write!(f, "Field"),
            IndexType::FullText => write!(f, "FullText"),
        }
    }
}

/// Identifies an index by collection, field and type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexDescriptor {
    collection: String,
    field: String,
    index_type: IndexType,
}

impl IndexDescriptor {
    pub fn new(collection: &str, field: &str, index_type: IndexType) -> Self {
        IndexDescriptor {
            collection: collection.to_string(),
            field: field.to_string(),
            index_type,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Returns the display name reported in query statistics, for example
    /// `Products/ByName` or `Products/SearchName`.
    pub fn name(&self) -> String {
        match self.index_type {
            IndexType::Field => format!("{}/By{}", self.collection, self.field),
            IndexType::FullText => format!("{}/Search{}", self.collection, self.field),
        }
    }
}

impl Display for IndexDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_name() {
        let field = IndexDescriptor::new("Products", "UnitsInStock", IndexType::Field);
        assert_eq!(field.name(), "Products/ByUnitsInStock");
        assert_eq!(field.collection(), "Products");
        assert_eq!(field.field(), "UnitsInStock");

        let text = IndexDescriptor::new("Products", "Name", IndexType::FullText);
        assert_eq!(text.to_string(), "Products/SearchName");
        assert_eq!(text.index_type(), IndexType::FullText);
    }
}
