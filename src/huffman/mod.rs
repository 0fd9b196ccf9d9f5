pub mod builder;
pub mod code_table;
pub mod encoder;
pub mod frequency;

pub use builder::{HuffmanTreeBuilder, TreeSet};
pub use code_table::CodeTable;
pub use encoder::{BlockKind, CompressedBlock, HuffmanEncoder};
pub use frequency::{BlockFrequencies, FrequencyTable};
