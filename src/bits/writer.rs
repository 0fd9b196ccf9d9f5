/// Bit-level writer for DEFLATE output
///
/// Writes bits LSB-first to match DEFLATE format. Completed bytes live in
/// `output`; up to 7 pending bits live in the accumulator, so a stream may
/// end mid-byte and be continued by [`BitWriter::append_bits`].
pub struct BitWriter {
    /// Accumulated output bytes
    output: Vec<u8>,
    /// Pending bits, LSB-first
    acc: u64,
    /// Number of pending bits in `acc` (0-7 between calls)
    pending: u32,
    /// Bits drained by `take_bytes` (keeps `bit_len` absolute)
    drained_bits: u64,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::with_capacity(65536)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { output: Vec::with_capacity(capacity), acc: 0, pending: 0, drained_bits: 0 }
    }

    /// Write `n` bits (0-32) from value in LSB-first order
    #[inline]
    pub fn write_bits(&mut self, value: u32, n: u8) {
        debug_assert!(n <= 32);

        if n == 0 {
            return;
        }

        let mask = (1u64 << n) - 1;
        self.acc |= (value as u64 & mask) << self.pending;
        self.pending += n as u32;

        while self.pending >= 8 {
            self.output.push(self.acc as u8);
            self.acc >>= 8;
            self.pending -= 8;
        }
    }

    /// Write a single bit
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(bit as u32, 1);
    }

    /// Pad to byte boundary with zero bits
    pub fn align_to_byte(&mut self) {
        if self.pending > 0 {
            self.output.push(self.acc as u8);
            self.acc = 0;
            self.pending = 0;
        }
    }

    /// Whether the next bit starts a fresh byte
    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.pending == 0
    }

    /// Write a 16-bit value in little-endian
    pub fn write_u16_le(&mut self, value: u16) {
        self.write_bytes(&value.to_le_bytes());
    }

    /// Write raw bytes
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.pending == 0 {
            self.output.extend_from_slice(bytes);
        } else {
            for &b in bytes {
                self.write_bits(b as u32, 8);
            }
        }
    }

    /// Append a packed LSB-first bit sequence of `bit_len` bits.
    ///
    /// The sequence continues packing into the current partial byte; no
    /// realignment happens between the two streams.
    pub fn append_bits(&mut self, bytes: &[u8], bit_len: u64) {
        debug_assert!(bit_len <= bytes.len() as u64 * 8);

        let whole = (bit_len / 8) as usize;
        let tail = (bit_len % 8) as u8;

        self.write_bytes(&bytes[..whole]);
        if tail > 0 {
            self.write_bits(bytes[whole] as u32, tail);
        }
    }

    /// Total number of bits written so far
    #[inline]
    pub fn bit_len(&self) -> u64 {
        self.drained_bits + self.output.len() as u64 * 8 + self.pending as u64
    }

    /// Remove and return the completed bytes, keeping any partial byte
    pub fn take_bytes(&mut self) -> Vec<u8> {
        self.drained_bits += self.output.len() as u64 * 8;
        std::mem::take(&mut self.output)
    }

    /// Finish and return the output bytes
    pub fn finish(mut self) -> Vec<u8> {
        self.align_to_byte();
        self.output
    }

    /// Finish without padding semantics: returns the bytes (last one possibly
    /// partial) and the exact number of meaningful bits
    pub fn finish_bits(mut self) -> (Vec<u8>, u64) {
        let bit_len = self.bit_len() - self.drained_bits;
        self.align_to_byte();
        (self.output, bit_len)
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Reverse the bottom `n` bits of `value`
pub fn reverse_bits(value: u32, n: u8) -> u32 {
    if n == 0 {
        return 0;
    }
    value.reverse_bits() >> (32 - n as u32)
}
