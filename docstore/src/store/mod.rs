mod attachment;
mod batch;
mod document_store;
mod snapshot;
mod statistics;

pub use attachment::*;
pub use batch::*;
pub use document_store::*;
pub(crate) use snapshot::*;
pub use statistics::*;
