//! Predicates for selecting documents in queries.
//!
//! Filters are built with the fluent API and combined with `and`, `or` and
//! `not`:
//!
//! - `field("Name").eq("Rook")`, `field("Name").ne("Rook")`
//! - `field("UnitsInStock").gt(5)`, `gte`, `lt`, `lte`, `between`
//! - `field("Category").in_array(vec!["categories/1-A"])`
//! - `field("Name").search(["#999996", "#999995"])` for full-text search
//! - `all()` matches every document

mod basic_filters;
mod filter;
mod fluent;
mod logical_filters;
mod range_filters;
mod text_filters;

pub(crate) use basic_filters::*;
pub use filter::*;
pub use fluent::*;
pub(crate) use logical_filters::*;
pub(crate) use range_filters::*;
pub(crate) use text_filters::*;
