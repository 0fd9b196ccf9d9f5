/// zlib header: CM = 8 (deflate), CINFO = 7 (32K window), FLEVEL = 2, FCHECK
pub const ZLIB_HEADER: [u8; 2] = [0x78, 0x9C];

/// Final empty stored block, byte-aligned
pub const ZLIB_TERMINATOR: [u8; 5] = [
    0x01, // BFINAL = 1, BTYPE = 00, padding
    0x00, 0x00, // LEN = 0
    0xFF, 0xFF, // NLEN
];

/// Adler-32 trailer size
pub const ZLIB_TRAILER_SIZE: usize = 4;

/// Fixed bytes around the lane blocks (header, terminator, trailer)
pub const ZLIB_OVERHEAD: usize = ZLIB_HEADER.len() + ZLIB_TERMINATOR.len() + ZLIB_TRAILER_SIZE;

/// Largest possible sync marker: 3 header bits padded out plus LEN/NLEN
pub const SYNC_MARKER_MAX_SIZE: usize = 5;

/// Adler-32 modulus
pub const ADLER_BASE: u32 = 65_521;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_check_bits() {
        let value = (ZLIB_HEADER[0] as u16) << 8 | ZLIB_HEADER[1] as u16;
        assert_eq!(value % 31, 0);
        assert_eq!(ZLIB_HEADER[0] & 0x0F, 8);
        assert_eq!(ZLIB_HEADER[0] >> 4, 7);
        // FDICT clear
        assert_eq!(ZLIB_HEADER[1] & 0x20, 0);
    }
}
