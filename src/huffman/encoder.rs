use tracing::trace;

use super::builder::TreeSet;
use super::code_table::CodeTable;
use super::frequency::BlockFrequencies;
use crate::bits::BitWriter;
use crate::deflate::tables::{
    encode_distance, encode_length, fixed_distance_lengths, fixed_literal_lengths,
    CODE_LENGTH_ORDER, DISTANCE_EXTRA, END_OF_BLOCK, LENGTH_EXTRA, MAX_STORED_BLOCK,
};
use crate::deflate::{Symbol, SymbolStream};
use crate::error::{Error, Result};

/// How a block's bits were produced
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// BTYPE 00: raw bytes
    Stored,
    /// BTYPE 01: RFC 1951 fixed code
    Fixed,
    /// BTYPE 10: code tables sent in the block header
    Dynamic,
}

impl BlockKind {
    fn btype(self) -> u32 {
        match self {
            BlockKind::Stored => 0b00,
            BlockKind::Fixed => 0b01,
            BlockKind::Dynamic => 0b10,
        }
    }
}

/// One lane's encoded DEFLATE block (always non-final).
///
/// Huffman blocks hold their exact packed bits. Stored blocks hold the raw
/// bytes: their alignment padding depends on where they land in the final
/// stream, so the framing is written by [`CompressedBlock::append_to`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompressedBlock {
    kind: BlockKind,
    data: Vec<u8>,
    bit_len: u64,
}

impl CompressedBlock {
    pub fn stored(raw: &[u8]) -> Self {
        Self { kind: BlockKind::Stored, data: raw.to_vec(), bit_len: raw.len() as u64 * 8 }
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Packed bits (Huffman kinds) or raw payload (stored)
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Exact bit length for Huffman kinds; payload bits for stored blocks
    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// Append this block to `writer` at its current bit position
    pub fn append_to(&self, writer: &mut BitWriter) {
        match self.kind {
            BlockKind::Stored => write_stored_block(writer, &self.data, false),
            _ => writer.append_bits(&self.data, self.bit_len),
        }
    }
}

/// Size in bytes of `len` raw bytes encoded as byte-aligned stored blocks
/// (3 header bits padded to a byte, LEN, NLEN, payload per sub-block)
pub fn stored_block_bytes(len: usize) -> usize {
    let sub_blocks = len.div_ceil(MAX_STORED_BLOCK).max(1);
    len + 5 * sub_blocks
}

/// Write `data` as one or more stored blocks; only the last may be final.
/// An empty `data` still produces one (empty) stored block.
pub fn write_stored_block(writer: &mut BitWriter, data: &[u8], is_final: bool) {
    let mut chunks = data.chunks(MAX_STORED_BLOCK).peekable();
    if chunks.peek().is_none() {
        write_stored_chunk(writer, &[], is_final);
        return;
    }
    while let Some(chunk) = chunks.next() {
        let last = chunks.peek().is_none();
        write_stored_chunk(writer, chunk, is_final && last);
    }
}

fn write_stored_chunk(writer: &mut BitWriter, chunk: &[u8], is_final: bool) {
    let len = chunk.len() as u16;
    writer.write_bit(is_final); // BFINAL
    writer.write_bits(BlockKind::Stored.btype(), 2);
    writer.align_to_byte();
    writer.write_u16_le(len);
    writer.write_u16_le(!len);
    writer.write_bytes(chunk);
}

/// Huffman encoder for DEFLATE output
pub struct HuffmanEncoder {
    fixed_literal: CodeTable,
    fixed_distance: CodeTable,
}

impl HuffmanEncoder {
    pub fn new() -> Self {
        Self {
            fixed_literal: CodeTable::from_lengths(&fixed_literal_lengths()),
            fixed_distance: CodeTable::from_lengths(&fixed_distance_lengths()),
        }
    }

    /// Encode one block.
    ///
    /// Picks the cheaper of the dynamic trees and the fixed code, then packs
    /// the symbols while tracking the emitted size against `capacity` bytes.
    /// If the packed block would not fit, the Huffman attempt is dropped and
    /// `raw` is stored verbatim instead.
    pub fn encode(
        &self,
        raw: &[u8],
        symbols: &SymbolStream,
        freq: &BlockFrequencies,
        trees: &TreeSet,
        capacity: usize,
    ) -> Result<CompressedBlock> {
        let dynamic_bits =
            3 + trees.header_bits() + data_bits(freq, &trees.literal, &trees.distance);
        let fixed_bits = 3 + data_bits(freq, &self.fixed_literal, &self.fixed_distance);

        let (kind, literal, distance, estimate) = if fixed_bits <= dynamic_bits {
            (BlockKind::Fixed, &self.fixed_literal, &self.fixed_distance, fixed_bits)
        } else {
            (BlockKind::Dynamic, &trees.literal, &trees.distance, dynamic_bits)
        };

        let limit = capacity as u64 * 8;
        if estimate > limit {
            trace!(estimate, limit, "block would overflow, storing");
            return Ok(CompressedBlock::stored(raw));
        }

        let mut writer = BitWriter::with_capacity((estimate / 8 + 1) as usize);
        writer.write_bit(false); // BFINAL: the container's terminator ends the stream
        writer.write_bits(kind.btype(), 2);
        if kind == BlockKind::Dynamic {
            write_dynamic_header(&mut writer, trees);
        }

        for symbol in symbols.symbols() {
            write_symbol(&mut writer, symbol, literal, distance)?;
            if writer.bit_len() > limit {
                trace!(limit, "packed bits exceeded capacity, storing");
                return Ok(CompressedBlock::stored(raw));
            }
        }
        literal.write(&mut writer, END_OF_BLOCK);

        if writer.bit_len() > limit {
            return Ok(CompressedBlock::stored(raw));
        }

        debug_assert_eq!(writer.bit_len(), estimate);
        let (data, bit_len) = writer.finish_bits();
        Ok(CompressedBlock { kind, data, bit_len })
    }
}

impl Default for HuffmanEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the dynamic Huffman block header (RFC 1951 section 3.2.7)
fn write_dynamic_header(writer: &mut BitWriter, trees: &TreeSet) {
    writer.write_bits((trees.literal.len() - 257) as u32, 5); // HLIT
    writer.write_bits((trees.distance.len() - 1) as u32, 5); // HDIST
    writer.write_bits((trees.num_bit_length_codes - 4) as u32, 4); // HCLEN

    for &sym in CODE_LENGTH_ORDER.iter().take(trees.num_bit_length_codes) {
        writer.write_bits(trees.bit_length.length(sym) as u32, 3);
    }

    for code in &trees.rle {
        trees.bit_length.write(writer, code.symbol as usize);
        writer.write_bits(code.extra as u32, code.extra_bits());
    }
}

#[inline]
fn write_symbol(
    writer: &mut BitWriter,
    symbol: &Symbol,
    literal: &CodeTable,
    distance: &CodeTable,
) -> Result<()> {
    match *symbol {
        Symbol::Literal(byte) => literal.write(writer, byte as usize),
        Symbol::Match { length, distance: dist } => {
            let out_of_range = || Error::MatchOutOfRange { length, distance: dist };
            let (len_code, len_extra, len_bits) = encode_length(length).ok_or_else(out_of_range)?;
            let (dist_code, dist_extra, dist_bits) =
                encode_distance(dist).ok_or_else(out_of_range)?;

            literal.write(writer, len_code as usize);
            writer.write_bits(len_extra as u32, len_bits);
            distance.write(writer, dist_code as usize);
            writer.write_bits(dist_extra as u32, dist_bits);
        }
    }
    Ok(())
}

/// Exact size in bits of the symbol data (codes plus extra bits, EOB included)
fn data_bits(freq: &BlockFrequencies, literal: &CodeTable, distance: &CodeTable) -> u64 {
    let mut bits = 0u64;
    for (sym, &count) in freq.literal.counts().iter().enumerate().take(literal.len()) {
        if count == 0 {
            continue;
        }
        let mut per_symbol = literal.length(sym) as u64;
        if sym > END_OF_BLOCK {
            per_symbol += LENGTH_EXTRA[sym - 257] as u64;
        }
        bits += count as u64 * per_symbol;
    }
    for (sym, &count) in freq.distance.counts().iter().enumerate().take(distance.len()) {
        bits += count as u64 * (distance.length(sym) as u64 + DISTANCE_EXTRA[sym] as u64);
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::huffman::HuffmanTreeBuilder;
    use crate::lz77::Lz77Matcher;
    use std::io::Read;

    /// Encode `data` as a single lane and close it with a final empty block
    fn encode_raw_deflate(data: &[u8], capacity: Option<usize>) -> (CompressedBlock, Vec<u8>) {
        let lz = Lz77Matcher::default().compress(data);
        let trees = HuffmanTreeBuilder::default().build(&lz.frequencies);
        let capacity = capacity.unwrap_or_else(|| stored_block_bytes(data.len()));
        let block = HuffmanEncoder::new()
            .encode(data, &lz.symbols, &lz.frequencies, &trees, capacity)
            .unwrap();

        let mut writer = BitWriter::new();
        block.append_to(&mut writer);
        write_stored_block(&mut writer, &[], true);
        (block, writer.finish())
    }

    fn inflate(stream: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        flate2::read::DeflateDecoder::new(stream).read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_short_block_uses_fixed_code() {
        let (block, stream) = encode_raw_deflate(b"Hello", None);
        assert_eq!(block.kind(), BlockKind::Fixed);
        // BFINAL=0, BTYPE=01
        assert_eq!(stream[0] & 0x07, 0b010);
        assert_eq!(inflate(&stream), b"Hello");
    }

    #[test]
    fn test_text_block_uses_dynamic_code() {
        let mut state = 0x2545_F491_4F6C_DD1Du64;
        let text: Vec<u8> = (0..20_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                b"ACGT"[(state & 3) as usize]
            })
            .collect();
        let (block, stream) = encode_raw_deflate(&text, None);
        assert_eq!(block.kind(), BlockKind::Dynamic);
        assert_eq!(stream[0] & 0x07, 0b100);
        assert_eq!(inflate(&stream), text);
    }

    #[test]
    fn test_empty_block() {
        let (block, stream) = encode_raw_deflate(b"", None);
        assert_ne!(block.kind(), BlockKind::Stored);
        assert!(inflate(&stream).is_empty());
    }

    #[test]
    fn test_incompressible_block_is_stored() {
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let data: Vec<u8> = (0..70_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                (state >> 24) as u8
            })
            .collect();
        let (block, stream) = encode_raw_deflate(&data, None);
        assert_eq!(block.kind(), BlockKind::Stored);
        // Two sub-blocks (65535 + 4465) plus the final empty block
        assert_eq!(stream.len(), data.len() + 5 * 2 + 5);
        assert_eq!(inflate(&stream), data);
    }

    #[test]
    fn test_tight_capacity_falls_back_to_stored() {
        let data = b"abcdefghijklmnopqrstuvwxyz".repeat(4);
        let (block, stream) = encode_raw_deflate(&data, Some(4));
        assert_eq!(block.kind(), BlockKind::Stored);
        assert_eq!(inflate(&stream), data);
    }

    #[test]
    fn test_estimate_matches_emitted_bits() {
        let data = b"abracadabra abracadabra abracadabra, said the wizard".repeat(50);
        let (block, _) = encode_raw_deflate(&data, None);
        assert_ne!(block.kind(), BlockKind::Stored);
        assert!(block.bit_len() <= block.data().len() as u64 * 8);
        assert!(block.bit_len() > (block.data().len() as u64 - 1) * 8);
    }

    #[test]
    fn test_unaligned_blocks_concatenate() {
        let parts: [&[u8]; 3] = [b"first lane, first lane", b"", b"third lane third lane third"];
        let mut writer = BitWriter::new();
        let encoder = HuffmanEncoder::new();
        for part in parts {
            let lz = Lz77Matcher::default().compress(part);
            let trees = HuffmanTreeBuilder::default().build(&lz.frequencies);
            let block = encoder
                .encode(part, &lz.symbols, &lz.frequencies, &trees, stored_block_bytes(part.len()))
                .unwrap();
            block.append_to(&mut writer);
        }
        write_stored_block(&mut writer, &[], true);
        assert_eq!(inflate(&writer.finish()), parts.concat());
    }

    #[test]
    fn test_match_out_of_range_is_an_error() {
        let symbols: SymbolStream =
            [Symbol::Match { length: 300, distance: 1 }, Symbol::Literal(1)].into_iter().collect();
        let freq = BlockFrequencies::new();
        let trees = HuffmanTreeBuilder::default().build(&freq);
        let result = HuffmanEncoder::new().encode(&[1; 301], &symbols, &freq, &trees, 1000);
        assert!(matches!(result, Err(Error::MatchOutOfRange { length: 300, .. })));
    }

    #[test]
    fn test_stored_block_bytes() {
        assert_eq!(stored_block_bytes(0), 5);
        assert_eq!(stored_block_bytes(65535), 65540);
        assert_eq!(stored_block_bytes(65536), 65546);
    }
}
