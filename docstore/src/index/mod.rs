mod descriptor;
mod field_index;
mod index_set;
mod text_index;

pub use descriptor::*;
pub(crate) use field_index::*;
pub(crate) use index_set::*;
pub(crate) use text_index::*;
