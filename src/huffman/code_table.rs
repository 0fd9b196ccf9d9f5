use crate::bits::writer::reverse_bits;
use crate::bits::BitWriter;

/// Canonical Huffman code assignment for one alphabet.
///
/// Codes are canonical and MSB-first (RFC 1951 section 3.2.2); the
/// bit-reversed form is kept alongside so emission is a single
/// [`BitWriter::write_bits`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeTable {
    lengths: Vec<u8>,
    codes: Vec<u16>,
    reversed: Vec<u16>,
}

impl CodeTable {
    /// Build canonical codes from code lengths (0 = symbol unused)
    pub fn from_lengths(lengths: &[u8]) -> Self {
        let max_bits = lengths.iter().copied().max().unwrap_or(0) as usize;

        // Count codes of each length
        let mut bl_count = vec![0u32; max_bits + 1];
        for &len in lengths {
            if len > 0 {
                bl_count[len as usize] += 1;
            }
        }

        // Compute first code for each bit length
        let mut next_code = vec![0u32; max_bits + 1];
        let mut code = 0u32;
        for bits in 1..=max_bits {
            code = (code + bl_count[bits - 1]) << 1;
            next_code[bits] = code;
        }

        // Assign consecutive codes in symbol order within each length
        let mut codes = vec![0u16; lengths.len()];
        let mut reversed = vec![0u16; lengths.len()];
        for (sym, &len) in lengths.iter().enumerate() {
            if len > 0 {
                let c = next_code[len as usize];
                next_code[len as usize] += 1;
                codes[sym] = c as u16;
                reversed[sym] = reverse_bits(c, len) as u16;
            }
        }

        Self { lengths: lengths.to_vec(), codes, reversed }
    }

    /// Number of symbols in the alphabet
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn lengths(&self) -> &[u8] {
        &self.lengths
    }

    #[inline]
    pub fn length(&self, symbol: usize) -> u8 {
        self.lengths[symbol]
    }

    /// (MSB-first code, length) for a symbol
    #[inline]
    pub fn code(&self, symbol: usize) -> (u16, u8) {
        (self.codes[symbol], self.lengths[symbol])
    }

    /// Emit the code for `symbol`
    #[inline]
    pub fn write(&self, writer: &mut BitWriter, symbol: usize) {
        debug_assert!(self.lengths[symbol] > 0, "symbol {} has no code", symbol);
        writer.write_bits(self.reversed[symbol] as u32, self.lengths[symbol]);
    }

    /// Kraft sum scaled by 2^max_length: equals 2^max_length for a complete code
    pub fn kraft_sum(&self, max_length: u8) -> u64 {
        self.lengths.iter().filter(|&&l| l > 0).map(|&l| 1u64 << (max_length - l)).sum()
    }

    /// Whether the used codes exactly fill the code space
    pub fn is_complete(&self) -> bool {
        let max = self.lengths.iter().copied().max().unwrap_or(0);
        max > 0 && self.kraft_sum(max) == 1u64 << max
    }

    /// Whether no code is a prefix of (or equal to) another
    pub fn is_prefix_free(&self) -> bool {
        let used: Vec<(u16, u8)> =
            (0..self.len()).filter(|&s| self.lengths[s] > 0).map(|s| self.code(s)).collect();

        for (i, &(a, la)) in used.iter().enumerate() {
            // An oversubscribed length class runs past its code space
            if (a as u32) >> la != 0 {
                return false;
            }
            for &(b, lb) in &used[i + 1..] {
                let shared = la.min(lb);
                if a >> (la - shared) == b >> (lb - shared) {
                    return false;
                }
            }
        }
        true
    }
}
