pub mod adler32;
pub mod assembler;
pub mod constants;
pub mod verify;

pub use adler32::{adler32, adler32_combine, Adler32};
pub use assembler::ContainerAssembler;
pub use constants::*;
pub use verify::verify;
