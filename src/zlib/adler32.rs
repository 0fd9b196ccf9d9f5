//! Adler-32 checksum (RFC 1950) with support for combining block checksums.

use super::constants::ADLER_BASE;

/// Largest n such that 255*n*(n+1)/2 + (n+1)*(BASE-1) <= 2^32-1
const NMAX: usize = 5552;

/// Running Adler-32 state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

impl Adler32 {
    pub fn new() -> Self {
        Self { a: 1, b: 0 }
    }

    pub fn update(&mut self, data: &[u8]) {
        // Modulo only at chunk boundaries
        for chunk in data.chunks(NMAX) {
            for &byte in chunk {
                self.a += byte as u32;
                self.b += self.a;
            }
            self.a %= ADLER_BASE;
            self.b %= ADLER_BASE;
        }
    }

    pub fn finish(&self) -> u32 {
        (self.b << 16) | self.a
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Adler-32 of `data`
#[must_use]
pub fn adler32(data: &[u8]) -> u32 {
    let mut state = Adler32::new();
    state.update(data);
    state.finish()
}

/// Checksum of `A || B` from `adler32(A)`, `adler32(B)` and `B.len()`
#[must_use]
pub fn adler32_combine(first: u32, second: u32, second_len: u64) -> u32 {
    let base = ADLER_BASE as u64;
    let rem = second_len % base;

    let mut sum1 = (first & 0xFFFF) as u64;
    let mut sum2 = rem * sum1 % base;
    sum1 += (second & 0xFFFF) as u64 + base - 1;
    sum2 += (first >> 16) as u64 + (second >> 16) as u64 + base - rem;

    if sum1 >= base {
        sum1 -= base;
    }
    if sum1 >= base {
        sum1 -= base;
    }
    if sum2 >= base << 1 {
        sum2 -= base << 1;
    }
    if sum2 >= base {
        sum2 -= base;
    }

    (sum1 | (sum2 << 16)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adler32_empty() {
        assert_eq!(adler32(&[]), 1);
    }

    #[test]
    fn test_adler32_known_values() {
        assert_eq!(adler32(b"a"), 0x0062_0062);
        assert_eq!(adler32(b"abc"), 0x024D_0127);
        assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
        assert_eq!(adler32(b"123456789"), 0x091E_01DE);
    }

    #[test]
    fn test_incremental_update() {
        let data: Vec<u8> = (0..20_000u32).map(|i| (i * 7 % 251) as u8).collect();
        let mut state = Adler32::new();
        for chunk in data.chunks(999) {
            state.update(chunk);
        }
        assert_eq!(state.finish(), adler32(&data));
    }

    #[test]
    fn test_large_run_of_ff() {
        // Exercises the deferred modulo at its worst case
        let data = vec![0xFF; NMAX * 3 + 17];
        let mut a = 1u64;
        let mut b = 0u64;
        for &byte in &data {
            a = (a + byte as u64) % ADLER_BASE as u64;
            b = (b + a) % ADLER_BASE as u64;
        }
        assert_eq!(adler32(&data), ((b << 16) | a) as u32);
    }

    #[test]
    fn test_combine_matches_whole() {
        let data: Vec<u8> =
            (0..200_000u32).map(|i| (i.wrapping_mul(2_654_435_761) >> 13) as u8).collect();
        for split in [0, 1, 5552, 65_521, 100_000, data.len()] {
            let (left, right) = data.split_at(split);
            let combined = adler32_combine(adler32(left), adler32(right), right.len() as u64);
            assert_eq!(combined, adler32(&data), "split at {}", split);
        }
    }

    #[test]
    fn test_combine_many_blocks_in_order() {
        let data = b"the quick brown fox jumps over the lazy dog ".repeat(3000);
        let mut combined = adler32(&[]);
        for chunk in data.chunks(4096) {
            combined = adler32_combine(combined, adler32(chunk), chunk.len() as u64);
        }
        assert_eq!(combined, adler32(&data));
    }
}
