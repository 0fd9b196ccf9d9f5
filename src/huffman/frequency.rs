use crate::deflate::tables::{
    encode_distance, encode_length, BIT_LENGTH_ALPHABET_SIZE, DISTANCE_ALPHABET_SIZE,
    END_OF_BLOCK, LITERAL_ALPHABET_SIZE,
};
use crate::deflate::{Symbol, SymbolStream};
use crate::error::{Error, Result};

/// Symbol occurrence counts, a flat array indexed by symbol code
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencyTable<const N: usize> {
    counts: [u32; N],
}

/// Literal/length alphabet frequencies (286 symbols)
pub type LiteralFrequencies = FrequencyTable<LITERAL_ALPHABET_SIZE>;

/// Distance alphabet frequencies (30 symbols)
pub type DistanceFrequencies = FrequencyTable<DISTANCE_ALPHABET_SIZE>;

/// Code length alphabet frequencies (19 symbols)
pub type BitLengthFrequencies = FrequencyTable<BIT_LENGTH_ALPHABET_SIZE>;

impl<const N: usize> FrequencyTable<N> {
    pub fn new() -> Self {
        Self { counts: [0; N] }
    }

    #[inline]
    pub fn increment(&mut self, symbol: usize) {
        self.counts[symbol] += 1;
    }

    #[inline]
    pub fn get(&self, symbol: usize) -> u32 {
        self.counts[symbol]
    }

    pub fn counts(&self) -> &[u32; N] {
        &self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }
}

impl<const N: usize> Default for FrequencyTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Both main-alphabet frequency tables for one block
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockFrequencies {
    pub literal: LiteralFrequencies,
    pub distance: DistanceFrequencies,
}

impl BlockFrequencies {
    /// Tables with only the end-of-block code counted
    pub fn new() -> Self {
        let mut literal = LiteralFrequencies::new();
        literal.increment(END_OF_BLOCK);
        Self { literal, distance: DistanceFrequencies::new() }
    }

    /// Count one symbol
    #[inline]
    pub fn record(&mut self, symbol: &Symbol) -> Result<()> {
        match *symbol {
            Symbol::Literal(byte) => self.literal.increment(byte as usize),
            Symbol::Match { length, distance } => {
                let (len_code, _, _) =
                    encode_length(length).ok_or(Error::MatchOutOfRange { length, distance })?;
                let (dist_code, _, _) =
                    encode_distance(distance).ok_or(Error::MatchOutOfRange { length, distance })?;
                self.literal.increment(len_code as usize);
                self.distance.increment(dist_code as usize);
            }
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn record_literal(&mut self, byte: u8) {
        self.literal.increment(byte as usize);
    }

    /// Count a match the caller already knows to be in range
    #[inline]
    pub(crate) fn record_match(&mut self, length: u16, distance: u16) {
        let codes = encode_length(length).zip(encode_distance(distance));
        debug_assert!(codes.is_some(), "match {}/{} out of range", length, distance);
        if let Some(((len_code, _, _), (dist_code, _, _))) = codes {
            self.literal.increment(len_code as usize);
            self.distance.increment(dist_code as usize);
        }
    }

    /// Count every symbol of a stream (plus the implicit end-of-block)
    pub fn from_stream(stream: &SymbolStream) -> Result<Self> {
        let mut freq = Self::new();
        for symbol in stream.symbols() {
            freq.record(symbol)?;
        }
        Ok(freq)
    }
}

impl Default for BlockFrequencies {
    fn default() -> Self {
        Self::new()
    }
}
