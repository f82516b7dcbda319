//! Bulk ingestion through a bounded background flusher.

mod bulk_loader;
mod options;
mod statistics;

pub use bulk_loader::*;
pub use options::*;
pub use statistics::*;
