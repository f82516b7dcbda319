mod document;
mod document_key;
mod key_generator;

pub use document::*;
pub use document_key::*;
pub use key_generator::*;
