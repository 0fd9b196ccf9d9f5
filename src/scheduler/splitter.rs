use std::io::{ErrorKind, Read};

use crate::deflate::Block;
use crate::error::Result;

/// Cuts an input stream into fixed-size blocks, one round at a time.
///
/// Every block is exactly `block_size` bytes except the last, which holds
/// whatever remains. Empty input yields no blocks.
pub struct BlockSplitter<R: Read> {
    reader: R,
    block_size: usize,
    next_index: u64,
    bytes_read: u64,
    eof: bool,
}

impl<R: Read> BlockSplitter<R> {
    pub fn new(reader: R, block_size: usize) -> Self {
        Self { reader, block_size, next_index: 0, bytes_read: 0, eof: false }
    }

    /// Read the next block; `lane` is the slot it will occupy in its round
    pub fn next_block(&mut self, lane: usize) -> Result<Option<Block>> {
        if self.eof {
            return Ok(None);
        }

        let mut data = vec![0u8; self.block_size];
        let filled = read_full(&mut self.reader, &mut data)?;
        if filled < self.block_size {
            self.eof = true;
            data.truncate(filled);
        }
        if filled == 0 {
            return Ok(None);
        }

        let block = Block::new(self.next_index, lane, data);
        self.next_index += 1;
        self.bytes_read += filled as u64;
        Ok(Some(block))
    }

    /// Read up to `lanes` blocks; an empty round means the input is exhausted
    pub fn next_round(&mut self, lanes: usize) -> Result<Vec<Block>> {
        let mut round = Vec::with_capacity(lanes);
        for lane in 0..lanes {
            match self.next_block(lane)? {
                Some(block) => round.push(block),
                None => break,
            }
        }
        Ok(round)
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Number of blocks handed out so far
    pub fn blocks_read(&self) -> u64 {
        self.next_index
    }
}

/// Fill `buf` unless the reader runs dry first; returns the bytes read
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out at most `step` bytes per call
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_empty_input() {
        let mut splitter = BlockSplitter::new(Cursor::new(Vec::new()), 16);
        assert!(splitter.next_round(4).unwrap().is_empty());
        assert_eq!(splitter.bytes_read(), 0);
    }

    #[test]
    fn test_rounds_and_partial_tail() {
        let data: Vec<u8> = (0..100u8).collect();
        let mut splitter = BlockSplitter::new(Cursor::new(data.clone()), 16);

        let first = splitter.next_round(4).unwrap();
        assert_eq!(first.len(), 4);
        assert_eq!(first[3].index, 3);
        assert_eq!(first[3].lane, 3);
        assert_eq!(first[0].data, &data[..16]);

        let second = splitter.next_round(4).unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(second[0].index, 4);
        assert_eq!(second[0].lane, 0);
        assert_eq!(second[2].len(), 100 - 6 * 16);

        assert!(splitter.next_round(4).unwrap().is_empty());
        assert_eq!(splitter.bytes_read(), 100);
        assert_eq!(splitter.blocks_read(), 7);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail() {
        let mut splitter = BlockSplitter::new(Cursor::new(vec![7u8; 64]), 16);
        let round = splitter.next_round(8).unwrap();
        assert_eq!(round.len(), 4);
        assert!(round.iter().all(|b| b.len() == 16));
        assert!(splitter.next_round(8).unwrap().is_empty());
    }

    #[test]
    fn test_short_reads_fill_blocks() {
        let data = vec![1u8; 50];
        let mut splitter = BlockSplitter::new(Trickle { data: &data, step: 3 }, 20);
        let round = splitter.next_round(8).unwrap();
        let sizes: Vec<usize> = round.iter().map(Block::len).collect();
        assert_eq!(sizes, vec![20, 20, 10]);
    }
}
