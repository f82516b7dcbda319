use crate::collection::Document;
use crate::common::{Tokenizer, Value};
use crate::errors::{DocStoreError, DocStoreResult, ErrorKind};
use std::any::Any;
use std::fmt::Display;
use std::ops::Bound;

use super::{validate_field_name, FilterProvider};

/// Matches documents whose field lies between two optional bounds.
///
/// `gt`, `gte`, `lt`, `lte` and `between` all build a `RangeFilter`. A value
/// only satisfies a range when it is of the same kind as the bounds, so
/// `field("UnitsInStock").gt(5)` never matches a string or a missing field.
pub(crate) struct RangeFilter {
    field: String,
    lower: Bound<Value>,
    upper: Bound<Value>,
}

impl RangeFilter {
    pub(crate) fn new(field: String, lower: Bound<Value>, upper: Bound<Value>) -> Self {
        RangeFilter {
            field,
            lower,
            upper,
        }
    }

    pub(crate) fn lower(&self) -> Bound<&Value> {
        self.lower.as_ref()
    }

    pub(crate) fn upper(&self) -> Bound<&Value> {
        self.upper.as_ref()
    }

    fn bounds(&self) -> impl Iterator<Item = &Value> {
        let lower = match &self.lower {
            Bound::Included(v) | Bound::Excluded(v) => Some(v),
            Bound::Unbounded => None,
        };
        let upper = match &self.upper {
            Bound::Included(v) | Bound::Excluded(v) => Some(v),
            Bound::Unbounded => None,
        };
        lower.into_iter().chain(upper)
    }
}

impl Display for RangeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::with_capacity(2);
        match &self.lower {
            Bound::Included(v) => parts.push(format!("{} >= {}", self.field, v)),
            Bound::Excluded(v) => parts.push(format!("{} > {}", self.field, v)),
            Bound::Unbounded => {}
        }
        match &self.upper {
            Bound::Included(v) => parts.push(format!("{} <= {}", self.field, v)),
            Bound::Excluded(v) => parts.push(format!("{} < {}", self.field, v)),
            Bound::Unbounded => {}
        }
        write!(f, "({})", parts.join(" && "))
    }
}

impl FilterProvider for RangeFilter {
    #[inline]
    fn apply(&self, document: &Document, _tokenizer: &Tokenizer) -> DocStoreResult<bool> {
        let value = match document.get(&self.field) {
            Some(value) => value,
            None => return Ok(false),
        };

        let above = match &self.lower {
            Bound::Included(bound) => value.same_kind(bound) && value >= bound,
            Bound::Excluded(bound) => value.same_kind(bound) && value > bound,
            Bound::Unbounded => true,
        };
        if !above {
            return Ok(false);
        }

        let below = match &self.upper {
            Bound::Included(bound) => value.same_kind(bound) && value <= bound,
            Bound::Excluded(bound) => value.same_kind(bound) && value < bound,
            Bound::Unbounded => true,
        };
        Ok(below)
    }

    fn validate(&self) -> DocStoreResult<()> {
        validate_field_name(&self.field, self)?;

        if matches!(
            (&self.lower, &self.upper),
            (Bound::Unbounded, Bound::Unbounded)
        ) {
            log::error!("Range filter on {} has no bounds", self.field);
            return Err(DocStoreError::new(
                "Range filter needs at least one bound",
                ErrorKind::FilterError,
            ));
        }

        for bound in self.bounds() {
            if !bound.is_comparable() {
                log::error!(
                    "Cannot compare field {} against {} value {}",
                    self.field,
                    bound.type_name(),
                    bound
                );
                return Err(DocStoreError::new(
                    &format!(
                        "Range bound for field {} must be a string, number or bool, found {}",
                        self.field,
                        bound.type_name()
                    ),
                    ErrorKind::FilterError,
                ));
            }
        }

        let bounds: Vec<&Value> = self.bounds().collect();
        if bounds.len() == 2 && !bounds[0].same_kind(bounds[1]) {
            log::error!("Range filter {} mixes bound types", self);
            return Err(DocStoreError::new(
                &format!("Range bounds for field {} must be of the same type", self.field),
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
