/// One LZ77 output symbol. The end-of-block marker is implicit: every
/// [`SymbolStream`] ends with it and encoders always emit it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Symbol {
    /// A literal byte
    Literal(u8),
    /// A back-reference: copy `length` bytes from `distance` bytes back
    Match { length: u16, distance: u16 },
}

impl Symbol {
    /// Returns the uncompressed size this symbol represents
    #[inline]
    pub fn uncompressed_size(&self) -> usize {
        match self {
            Symbol::Literal(_) => 1,
            Symbol::Match { length, .. } => *length as usize,
        }
    }
}

/// Ordered LZ77 output for one block
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SymbolStream {
    symbols: Vec<Symbol>,
}

impl SymbolStream {
    pub fn new() -> Self {
        Self { symbols: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { symbols: Vec::with_capacity(capacity) }
    }

    #[inline]
    pub fn push(&mut self, symbol: Symbol) {
        self.symbols.push(symbol);
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of explicit symbols (the implicit end-of-block is not counted)
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Total uncompressed size of this stream
    pub fn uncompressed_size(&self) -> usize {
        self.symbols.iter().map(Symbol::uncompressed_size).sum()
    }

    /// Expand the stream back into bytes. Back-references only ever point
    /// inside the stream itself, so no outside window is needed.
    pub fn expand(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.uncompressed_size());
        for symbol in &self.symbols {
            match *symbol {
                Symbol::Literal(byte) => out.push(byte),
                Symbol::Match { length, distance } => {
                    let start = out.len() - distance as usize;
                    // Overlapping copies (distance < length) repeat the pattern
                    for i in 0..length as usize {
                        out.push(out[start + i]);
                    }
                }
            }
        }
        out
    }
}

impl FromIterator<Symbol> for SymbolStream {
    fn from_iter<I: IntoIterator<Item = Symbol>>(iter: I) -> Self {
        Self { symbols: iter.into_iter().collect() }
    }
}

/// One unit of raw input, owned by the lane that processes it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    /// Position of this block in the whole input (0-based)
    pub index: u64,
    /// Lane slot within the current round
    pub lane: usize,
    /// Raw bytes
    pub data: Vec<u8>,
}

impl Block {
    pub fn new(index: u64, lane: usize, data: Vec<u8>) -> Self {
        Self { index, lane, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncompressed_size() {
        let stream: SymbolStream = [
            Symbol::Literal(b'a'),
            Symbol::Literal(b'b'),
            Symbol::Match { length: 10, distance: 2 },
        ]
        .into_iter()
        .collect();

        assert_eq!(stream.len(), 3);
        assert_eq!(stream.uncompressed_size(), 12);
    }

    #[test]
    fn test_expand_overlapping_match() {
        let stream: SymbolStream =
            [Symbol::Literal(b'A'), Symbol::Literal(b'B'), Symbol::Match { length: 6, distance: 2 }]
                .into_iter()
                .collect();

        assert_eq!(stream.expand(), b"ABABABAB");
    }

    #[test]
    fn test_empty_stream() {
        let stream = SymbolStream::new();
        assert!(stream.is_empty());
        assert!(stream.expand().is_empty());
    }
}
