pub mod models;
pub mod symbol_index;

pub use models::*;
pub use symbol_index::SymbolIndex;
