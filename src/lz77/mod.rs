pub mod matcher;

pub use matcher::{Lz77Matcher, Lz77Output};
