use std::io::Write;

use tracing::trace;

use super::adler32::{adler32, adler32_combine};
use super::constants::{ZLIB_HEADER, ZLIB_TERMINATOR};
use crate::bits::BitWriter;
use crate::error::Result;
use crate::huffman::encoder::write_stored_block;
use crate::huffman::CompressedBlock;

/// Stitches independently encoded blocks into one zlib stream.
///
/// Blocks are appended at the bit level in the order `append` is called;
/// completed bytes are flushed to the underlying writer as they form, so only
/// the trailing partial byte is held back.
pub struct ContainerAssembler<W: Write> {
    writer: W,
    bits: BitWriter,
    checksum: u32,
    input_bytes: u64,
    output_bytes: u64,
    blocks: u64,
}

impl<W: Write> ContainerAssembler<W> {
    pub fn new(writer: W) -> Self {
        let mut bits = BitWriter::with_capacity(64 * 1024);
        bits.write_bytes(&ZLIB_HEADER);
        Self { writer, bits, checksum: adler32(&[]), input_bytes: 0, output_bytes: 0, blocks: 0 }
    }

    /// Append the next block with the Adler-32 and length of its source bytes
    pub fn append(&mut self, block: &CompressedBlock, checksum: u32, len: u64) -> Result<()> {
        block.append_to(&mut self.bits);
        self.checksum = adler32_combine(self.checksum, checksum, len);
        self.input_bytes += len;
        self.blocks += 1;
        self.flush_bytes()
    }

    /// Combined Adler-32 of every block appended so far
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn input_bytes(&self) -> u64 {
        self.input_bytes
    }

    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Write the sync marker (if unaligned), terminator and trailer.
    ///
    /// Returns the inner writer and the total number of bytes written.
    pub fn finish(mut self) -> Result<(W, u64)> {
        if !self.bits.is_aligned() {
            trace!(bit_len = self.bits.bit_len(), "appending sync marker");
            write_stored_block(&mut self.bits, &[], false);
        }
        self.bits.write_bytes(&ZLIB_TERMINATOR);
        self.bits.write_bytes(&self.checksum.to_be_bytes());
        self.flush_bytes()?;

        self.writer.flush()?;
        Ok((self.writer, self.output_bytes))
    }

    fn flush_bytes(&mut self) -> Result<()> {
        let bytes = self.bits.take_bytes();
        if !bytes.is_empty() {
            self.writer.write_all(&bytes)?;
            self.output_bytes += bytes.len() as u64;
        }
        Ok(())
    }
}
