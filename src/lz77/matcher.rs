use tracing::trace;

use crate::deflate::tables::{MAX_MATCH, MIN_MATCH, WINDOW_SIZE};
use crate::deflate::{Symbol, SymbolStream};
use crate::huffman::BlockFrequencies;
use crate::CompressionLevel;

/// Hash table size (2^15 buckets keyed on 3-byte prefixes)
const HASH_BITS: u32 = 15;
const HASH_SIZE: usize = 1 << HASH_BITS;

const WINDOW_MASK: usize = WINDOW_SIZE - 1;

/// Empty chain slot
const NIL: u32 = u32::MAX;

/// Search effort for a compression level: (max chain depth, nice length)
pub fn search_params(level: CompressionLevel) -> (usize, usize) {
    match level.level() {
        1 => (4, 8),
        2 => (8, 16),
        3 => (16, 32),
        4 => (32, 64),
        5 => (64, 128),
        6 => (128, 128),
        7 => (256, MAX_MATCH),
        8 => (1024, MAX_MATCH),
        _ => (4096, MAX_MATCH),
    }
}

/// LZ77 output for one block
#[derive(Clone, Debug)]
pub struct Lz77Output {
    pub symbols: SymbolStream,
    pub frequencies: BlockFrequencies,
}

/// Greedy hash-chain matcher over a single block.
///
/// The window starts empty for every call to [`Lz77Matcher::compress`], so a
/// block never references bytes outside itself.
pub struct Lz77Matcher {
    /// Most recent position for each hash bucket
    head: Vec<u32>,
    /// Previous position with the same hash, indexed by `pos & WINDOW_MASK`
    prev: Vec<u32>,
    max_chain: usize,
    nice_length: usize,
}

impl Lz77Matcher {
    pub fn new(level: CompressionLevel) -> Self {
        let (max_chain, nice_length) = search_params(level);
        Self { head: vec![NIL; HASH_SIZE], prev: vec![NIL; WINDOW_SIZE], max_chain, nice_length }
    }

    /// Replace repeated substrings of `data` with back-references.
    ///
    /// `data.len()` must be below `u32::MAX`; the encoder configuration caps
    /// block sizes well under that.
    pub fn compress(&mut self, data: &[u8]) -> Lz77Output {
        debug_assert!(data.len() < NIL as usize);

        self.head.fill(NIL);

        let mut symbols = SymbolStream::with_capacity(data.len() / 2);
        let mut frequencies = BlockFrequencies::new();
        let mut matches = 0usize;
        let mut pos = 0;

        while pos < data.len() {
            match self.find_longest_match(data, pos) {
                Some((length, distance)) => {
                    let (length16, distance16) = (length as u16, distance as u16);
                    symbols.push(Symbol::Match { length: length16, distance: distance16 });
                    frequencies.record_match(length16, distance16);
                    for p in pos..pos + length {
                        self.insert(data, p);
                    }
                    pos += length;
                    matches += 1;
                }
                None => {
                    symbols.push(Symbol::Literal(data[pos]));
                    frequencies.record_literal(data[pos]);
                    self.insert(data, pos);
                    pos += 1;
                }
            }
        }

        trace!(bytes = data.len(), symbols = symbols.len(), matches, "lz77 pass complete");

        Lz77Output { symbols, frequencies }
    }

    #[inline]
    fn insert(&mut self, data: &[u8], pos: usize) {
        if pos + MIN_MATCH > data.len() {
            return;
        }
        let h = hash3(data, pos);
        self.prev[pos & WINDOW_MASK] = self.head[h];
        self.head[h] = pos as u32;
    }

    /// Longest match for `pos` among earlier positions in the window.
    ///
    /// Candidates are visited nearest-first and only a strictly longer match
    /// replaces the current best, so equal lengths keep the smaller distance.
    fn find_longest_match(&self, data: &[u8], pos: usize) -> Option<(usize, usize)> {
        let remaining = data.len() - pos;
        if remaining < MIN_MATCH {
            return None;
        }

        let max_len = remaining.min(MAX_MATCH);
        let nice = self.nice_length.min(max_len);

        let mut best_len = MIN_MATCH - 1;
        let mut best_dist = 0;
        let mut candidate = self.head[hash3(data, pos)];
        let mut chain = self.max_chain;

        while candidate != NIL && chain > 0 {
            let cand = candidate as usize;
            let distance = pos - cand;
            if distance > WINDOW_SIZE {
                break;
            }

            // Cheap rejection: a longer match must agree at best_len
            if data[cand + best_len] == data[pos + best_len] && data[cand] == data[pos] {
                let len = match_length(data, cand, pos, max_len);
                if len > best_len {
                    best_len = len;
                    best_dist = distance;
                    if len >= nice {
                        break;
                    }
                }
            }

            let next = self.prev[cand & WINDOW_MASK];
            // Slots are recycled every WINDOW_SIZE positions; a link that does
            // not point backwards belongs to a newer position.
            if next == NIL || next as usize >= cand {
                break;
            }
            candidate = next;
            chain -= 1;
        }

        (best_len >= MIN_MATCH).then_some((best_len, best_dist))
    }
}

impl Default for Lz77Matcher {
    fn default() -> Self {
        Self::new(CompressionLevel::default())
    }
}

#[inline]
fn hash3(data: &[u8], pos: usize) -> usize {
    let v = (data[pos] as u32) << 16 | (data[pos + 1] as u32) << 8 | data[pos + 2] as u32;
    (v.wrapping_mul(0x9E37_79B1) >> (32 - HASH_BITS)) as usize
}

/// Length of the common prefix of `data[a..]` and `data[b..]`, capped at `max`
#[inline]
fn match_length(data: &[u8], a: usize, b: usize, max: usize) -> usize {
    data[a..a + max].iter().zip(&data[b..b + max]).take_while(|(x, y)| x == y).count()
}
