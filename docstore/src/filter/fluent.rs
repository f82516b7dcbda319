use crate::common::Value;
use std::ops::Bound;

use super::{EqualsFilter, Filter, InFilter, NotEqualsFilter, RangeFilter, SearchFilter};

/// Starts a fluent filter on `field_name`.
///
/// ```rust
/// use docstore::filter::field;
///
/// let filter = field("UnitsInStock").gt(5).and(field("UnitsInStock").lt(11));
/// assert_eq!(
///     filter.to_string(),
///     "((UnitsInStock > 5) && (UnitsInStock < 11))"
/// );
/// ```
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(EqualsFilter::new(self.field_name, value.into()))
    }

    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        Filter::new(NotEqualsFilter::new(self.field_name, value.into()))
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.range(Bound::Excluded(value.into()), Bound::Unbounded)
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.range(Bound::Included(value.into()), Bound::Unbounded)
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.range(Bound::Unbounded, Bound::Excluded(value.into()))
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.range(Bound::Unbounded, Bound::Included(value.into()))
    }

    /// Inclusive on both ends.
    pub fn between<T: Into<Value>>(self, lower_bound: T, upper_bound: T) -> Filter {
        self.range(
            Bound::Included(lower_bound.into()),
            Bound::Included(upper_bound.into()),
        )
    }

    pub fn between_exclusive<T: Into<Value>>(self, lower_bound: T, upper_bound: T) -> Filter {
        self.range(
            Bound::Excluded(lower_bound.into()),
            Bound::Excluded(upper_bound.into()),
        )
    }

    pub fn range(self, lower: Bound<Value>, upper: Bound<Value>) -> Filter {
        Filter::new(RangeFilter::new(self.field_name, lower, upper))
    }

    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        Filter::new(InFilter::new(
            self.field_name,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Full-text search for any of `terms`.
    pub fn search<I, S>(self, terms: I) -> Filter
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Filter::new(SearchFilter::new(
            self.field_name,
            terms.into_iter().map(|t| t.as_ref().to_string()).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Tokenizer;
    use crate::doc;

    #[test]
    fn test_fluent_filters() {
        let tokenizer = Tokenizer::default();
        let doc = doc! { Name: "Product #7", UnitsInStock: 7 };

        assert!(field("UnitsInStock").eq(7).apply(&doc, &tokenizer).unwrap());
        assert!(field("UnitsInStock").ne(8).apply(&doc, &tokenizer).unwrap());
        assert!(field("UnitsInStock").gt(6).apply(&doc, &tokenizer).unwrap());
        assert!(field("UnitsInStock").gte(7).apply(&doc, &tokenizer).unwrap());
        assert!(field("UnitsInStock").lt(8).apply(&doc, &tokenizer).unwrap());
        assert!(field("UnitsInStock").lte(7).apply(&doc, &tokenizer).unwrap());
        assert!(field("UnitsInStock").between(7, 9).apply(&doc, &tokenizer).unwrap());
        assert!(!field("UnitsInStock")
            .between_exclusive(7, 9)
            .apply(&doc, &tokenizer)
            .unwrap());
        assert!(field("UnitsInStock")
            .in_array(vec![1, 7])
            .apply(&doc, &tokenizer)
            .unwrap());
        assert!(field("Name")
            .search(["#7", "#8"])
            .apply(&doc, &tokenizer)
            .unwrap());
    }

    #[test]
    fn test_field_names() {
        assert_eq!(field("Name").eq("x").field_name(), Some("Name"));
        assert_eq!(field("Name").search(["x"]).field_name(), Some("Name"));
    }
}
