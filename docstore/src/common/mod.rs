mod constants;
mod lock;
mod sort_order;
mod tokenizer;
mod value;

pub use constants::*;
pub use lock::*;
pub use sort_order::*;
pub use tokenizer::*;
pub use value::*;
