use tracing::debug;

use crate::deflate::Block;
use crate::error::Result;
use crate::huffman::encoder::stored_block_bytes;
use crate::huffman::{CompressedBlock, HuffmanEncoder, HuffmanTreeBuilder};
use crate::lz77::Lz77Matcher;
use crate::zlib::adler32;
use crate::EncoderConfig;

/// A block after its lane finished: the encoded bits plus what the
/// assembler needs to fold it into the container checksum
#[derive(Clone, Debug)]
pub struct EncodedLane {
    /// Position of the source block in the whole input
    pub index: u64,
    /// Slot within the round
    pub lane: usize,
    pub block: CompressedBlock,
    /// Adler-32 of the source block
    pub checksum: u32,
    /// Source block length in bytes
    pub len: u64,
}

/// Per-worker lane state (matcher tables are reused across blocks)
pub struct LaneEncoder {
    matcher: Lz77Matcher,
    builder: HuffmanTreeBuilder,
    encoder: HuffmanEncoder,
    capacity: Option<usize>,
}

impl LaneEncoder {
    /// Build lane state for an already validated configuration
    pub fn new(config: &EncoderConfig) -> Self {
        Self {
            matcher: Lz77Matcher::new(config.level),
            builder: HuffmanTreeBuilder::new(
                config.max_code_length,
                config.max_bit_length_code_length,
            ),
            encoder: HuffmanEncoder::new(),
            capacity: config.lane_capacity,
        }
    }

    /// LZ77, then tree construction, then bit packing
    pub fn encode(&mut self, block: &Block) -> Result<EncodedLane> {
        let lz = self.matcher.compress(&block.data);
        let trees = self.builder.build(&lz.frequencies);
        let capacity = self.capacity.unwrap_or_else(|| stored_block_bytes(block.len()));
        let encoded =
            self.encoder.encode(&block.data, &lz.symbols, &lz.frequencies, &trees, capacity)?;

        debug!(
            index = block.index,
            lane = block.lane,
            bytes = block.len(),
            kind = ?encoded.kind(),
            bits = encoded.bit_len(),
            "lane encoded"
        );

        Ok(EncodedLane {
            index: block.index,
            lane: block.lane,
            block: encoded,
            checksum: adler32(&block.data),
            len: block.len() as u64,
        })
    }
}

/// Run one lane's full pipeline on `block`
pub fn encode_lane(block: &Block, config: &EncoderConfig) -> Result<EncodedLane> {
    config.validate()?;
    LaneEncoder::new(config).encode(block)
}
