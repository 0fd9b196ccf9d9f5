pub mod tables;
pub mod tokens;

pub use tokens::{Block, Symbol, SymbolStream};
