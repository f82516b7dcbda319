mod cursor;
mod planner;
mod query;
mod statistics;

pub use cursor::*;
pub(crate) use planner::*;
pub use query::*;
pub use statistics::*;
