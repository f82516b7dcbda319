use crate::collection::Document;
use crate::common::{Tokenizer, Value};
use crate::errors::DocStoreResult;
use std::any::Any;
use std::fmt::Display;

use super::{validate_field_name, FilterProvider};

pub(crate) struct AllFilter;

impl Display for AllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AllFilter")
    }
}

impl FilterProvider for AllFilter {
    #[inline]
    fn apply(&self, _document: &Document, _tokenizer: &Tokenizer) -> DocStoreResult<bool> {
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `field == value`. A missing field equals [Value::Null].
pub(crate) struct EqualsFilter {
    field: String,
    value: Value,
}

impl EqualsFilter {
    pub(crate) fn new(field: String, value: Value) -> Self {
        EqualsFilter { field, value }
    }

    pub(crate) fn value(&self) -> &Value {
        &self.value
    }
}

impl Display for EqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field, self.value)
    }
}

impl FilterProvider for EqualsFilter {
    #[inline]
    fn apply(&self, document: &Document, _tokenizer: &Tokenizer) -> DocStoreResult<bool> {
        Ok(document.get(&self.field).unwrap_or(&Value::Null) == &self.value)
    }

    fn validate(&self) -> DocStoreResult<()> {
        validate_field_name(&self.field, self)
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) struct NotEqualsFilter {
    field: String,
    value: Value,
}

impl NotEqualsFilter {
    pub(crate) fn new(field: String, value: Value) -> Self {
        NotEqualsFilter { field, value }
    }
}

impl Display for NotEqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} != {})", self.field, self.value)
    }
}

impl FilterProvider for NotEqualsFilter {
    #[inline]
    fn apply(&self, document: &Document, _tokenizer: &Tokenizer) -> DocStoreResult<bool> {
        Ok(document.get(&self.field).unwrap_or(&Value::Null) != &self.value)
    }

    fn validate(&self) -> DocStoreResult<()> {
        validate_field_name(&self.field, self)
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `field` equals any of `values`.
pub(crate) struct InFilter {
    field: String,
    values: Vec<Value>,
}

impl InFilter {
    pub(crate) fn new(field: String, values: Vec<Value>) -> Self {
        InFilter { field, values }
    }

    pub(crate) fn values(&self) -> &[Value] {
        &self.values
    }
}

impl Display for InFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} in {:?})", self.field, self.values)
    }
}

impl FilterProvider for InFilter {
    #[inline]
    fn apply(&self, document: &Document, _tokenizer: &Tokenizer) -> DocStoreResult<bool> {
        let value = document.get(&self.field).unwrap_or(&Value::Null);
        Ok(self.values.contains(value))
    }

    fn validate(&self) -> DocStoreResult<()> {
        validate_field_name(&self.field, self)
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::errors::ErrorKind;

    #[test]
    fn test_equals() {
        let tokenizer = Tokenizer::default();
        let doc = doc! { Name: "Rook", Units: 7, Supplier: { City: "Oslo" } };

        let filter = EqualsFilter::new("Name".into(), Value::from("Rook"));
        assert!(filter.apply(&doc, &tokenizer).unwrap());

        let filter = EqualsFilter::new("Units".into(), Value::from(7.0));
        assert!(filter.apply(&doc, &tokenizer).unwrap());

        let filter = EqualsFilter::new("Supplier.City".into(), Value::from("Oslo"));
        assert!(filter.apply(&doc, &tokenizer).unwrap());

        let filter = EqualsFilter::new("Missing".into(), Value::Null);
        assert!(filter.apply(&doc, &tokenizer).unwrap());
    }

    #[test]
    fn test_not_equals() {
        let tokenizer = Tokenizer::default();
        let doc = doc! { Name: "Rook" };
        let filter = NotEqualsFilter::new("Name".into(), Value::from("Pawn"));
        assert!(filter.apply(&doc, &tokenizer).unwrap());
        let filter = NotEqualsFilter::new("Name".into(), Value::from("Rook"));
        assert!(!filter.apply(&doc, &tokenizer).unwrap());
    }

    #[test]
    fn test_in() {
        let tokenizer = Tokenizer::default();
        let doc = doc! { Category: "categories/2-A" };
        let filter = InFilter::new(
            "Category".into(),
            vec![Value::from("categories/1-A"), Value::from("categories/2-A")],
        );
        assert!(filter.apply(&doc, &tokenizer).unwrap());

        let filter = InFilter::new("Category".into(), vec![]);
        assert!(!filter.apply(&doc, &tokenizer).unwrap());
    }

    #[test]
    fn test_empty_field_name() {
        let filter = EqualsFilter::new(" ".into(), Value::from(1));
        assert_eq!(filter.validate().unwrap_err().kind(), &ErrorKind::FilterError);
        assert!(filter.field_name().is_some());
    }
}
