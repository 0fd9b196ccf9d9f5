pub mod bits;
pub mod deflate;
pub mod error;
pub mod huffman;
pub mod lz77;
pub mod scheduler;
pub mod zlib;

pub use deflate::{Block, Symbol, SymbolStream};
pub use error::{Error, Result};
pub use huffman::{BlockKind, CompressedBlock, HuffmanEncoder, HuffmanTreeBuilder};
pub use lz77::Lz77Matcher;
pub use scheduler::{encode_lane, BlockLaneScheduler, EncodedLane, SingleThreadedEncoder};
pub use zlib::{verify, ContainerAssembler};

use std::io::{Read, Write};

use deflate::tables::{MAX_BIT_LENGTH_CODE_LENGTH, MAX_CODE_LENGTH};

/// Compression level (1-9): trades LZ77 search effort for ratio.
///
/// - Levels 1-3: short hash chains, early exit on modest matches
/// - Levels 4-6: balanced (6 is the default)
/// - Levels 7-9: long chains, only a maximal match stops the search
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionLevel {
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    Level4 = 4,
    Level5 = 5,
    #[default]
    Level6 = 6,
    Level7 = 7,
    Level8 = 8,
    Level9 = 9,
}

impl CompressionLevel {
    /// Create from numeric level (1-9), clamped to valid range
    pub fn from_level(level: u8) -> Self {
        match level {
            0 | 1 => Self::Level1,
            2 => Self::Level2,
            3 => Self::Level3,
            4 => Self::Level4,
            5 => Self::Level5,
            6 => Self::Level6,
            7 => Self::Level7,
            8 => Self::Level8,
            _ => Self::Level9,
        }
    }

    /// Get numeric level (1-9)
    pub fn level(&self) -> u8 {
        *self as u8
    }
}

/// Configuration for encoding
#[derive(Clone, Debug)]
pub struct EncoderConfig {
    /// Uncompressed bytes per block (default: 1 MiB)
    pub block_size: usize,
    /// Blocks per round (default: 8)
    pub lane_count: usize,
    /// Number of worker threads (0 = auto, 1 = single-threaded)
    pub num_threads: usize,
    /// LZ77 search effort
    pub level: CompressionLevel,
    /// Code length bound for the literal/length and distance trees
    pub max_code_length: u8,
    /// Code length bound for the bit-length tree
    pub max_bit_length_code_length: u8,
    /// Per-lane output capacity in bytes; `None` uses the block's stored size
    pub lane_capacity: Option<usize>,
    /// Buffer size for I/O operations
    pub buffer_size: usize,
}

/// Largest accepted block size
pub const MAX_BLOCK_SIZE: usize = 1 << 30;

impl EncoderConfig {
    /// Reject settings the encoder cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(Error::InvalidConfiguration(format!(
                "block size {} outside 1..={}",
                self.block_size, MAX_BLOCK_SIZE
            )));
        }
        if self.lane_count == 0 {
            return Err(Error::InvalidConfiguration("lane count must be at least 1".to_string()));
        }
        if !(9..=MAX_CODE_LENGTH).contains(&self.max_code_length) {
            return Err(Error::InvalidConfiguration(format!(
                "max code length {} outside 9..={}",
                self.max_code_length, MAX_CODE_LENGTH
            )));
        }
        if !(5..=MAX_BIT_LENGTH_CODE_LENGTH).contains(&self.max_bit_length_code_length) {
            return Err(Error::InvalidConfiguration(format!(
                "max bit-length code length {} outside 5..={}",
                self.max_bit_length_code_length, MAX_BIT_LENGTH_CODE_LENGTH
            )));
        }
        if self.buffer_size == 0 {
            return Err(Error::InvalidConfiguration("buffer size must be nonzero".to_string()));
        }
        Ok(())
    }
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            block_size: 1024 * 1024,
            lane_count: 8,
            num_threads: 0,
            level: CompressionLevel::default(),
            max_code_length: MAX_CODE_LENGTH,
            max_bit_length_code_length: MAX_BIT_LENGTH_CODE_LENGTH,
            lane_capacity: None,
            buffer_size: 128 * 1024,
        }
    }
}

/// Statistics from an encoding operation
#[derive(Clone, Debug, Default)]
pub struct EncodeStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub blocks_written: u64,
    pub rounds: u64,
    /// Lanes that fell back to stored blocks
    pub stored_blocks: u64,
    pub fixed_blocks: u64,
    pub dynamic_blocks: u64,
    /// Adler-32 written to the trailer
    pub checksum: u32,
}

impl EncodeStats {
    /// Count one appended block under its kind
    pub fn record_kind(&mut self, kind: BlockKind) {
        match kind {
            BlockKind::Stored => self.stored_blocks += 1,
            BlockKind::Fixed => self.fixed_blocks += 1,
            BlockKind::Dynamic => self.dynamic_blocks += 1,
        }
    }
}

/// Trait for the complete encoding operation
pub trait Encoder {
    /// Encode raw input into a zlib stream
    fn encode<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<EncodeStats>;
}

/// Compress `data` into a zlib stream with the default configuration
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    compress_with(data, &EncoderConfig::default())
}

/// Compress `data` into a zlib stream
pub fn compress_with(data: &[u8], config: &EncoderConfig) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(data.len() / 2 + zlib::ZLIB_OVERHEAD);
    BlockLaneScheduler::new(config.clone()).encode(data, &mut output)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EncoderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.block_size, 1 << 20);
        assert_eq!(config.lane_count, 8);
        assert_eq!(config.level, CompressionLevel::Level6);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let bad = [
            EncoderConfig { block_size: 0, ..Default::default() },
            EncoderConfig { block_size: MAX_BLOCK_SIZE + 1, ..Default::default() },
            EncoderConfig { lane_count: 0, ..Default::default() },
            EncoderConfig { max_code_length: 8, ..Default::default() },
            EncoderConfig { max_code_length: 16, ..Default::default() },
            EncoderConfig { max_bit_length_code_length: 4, ..Default::default() },
            EncoderConfig { max_bit_length_code_length: 8, ..Default::default() },
            EncoderConfig { buffer_size: 0, ..Default::default() },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfiguration(_))),
                "{:?} should be rejected",
                config
            );
        }
    }

    #[test]
    fn test_compression_level_from_level() {
        assert_eq!(CompressionLevel::from_level(0), CompressionLevel::Level1);
        assert_eq!(CompressionLevel::from_level(6).level(), 6);
        assert_eq!(CompressionLevel::from_level(42), CompressionLevel::Level9);
    }

    #[test]
    fn test_record_kind() {
        let mut stats = EncodeStats::default();
        stats.record_kind(BlockKind::Stored);
        stats.record_kind(BlockKind::Dynamic);
        stats.record_kind(BlockKind::Dynamic);
        assert_eq!(stats.blocks_written, 0);
        assert_eq!(stats.stored_blocks, 1);
        assert_eq!(stats.dynamic_blocks, 2);
        assert_eq!(stats.fixed_blocks, 0);
    }

    #[test]
    fn test_compress_round_trip() {
        let data = b"compress me, compress me, compress me please".repeat(100);
        let out = compress(&data).unwrap();
        verify(&out, &data).unwrap();
    }
}
