/// Specifies the direction for sorting query results.
///
/// # Usage
/// ```text
/// let query = store.query("Products").order_by("Name", SortOrder::Descending);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort from smallest to largest value (A to Z, 0 to 9)
    Ascending,
    /// Sort from largest to smallest value (Z to A, 9 to 0)
    Descending,
}

impl SortOrder {
    /// Applies this direction to an ascending comparison result.
    #[inline]
    pub fn apply(&self, ordering: std::cmp::Ordering) -> std::cmp::Ordering {
        match self {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}
