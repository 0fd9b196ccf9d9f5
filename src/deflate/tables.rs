//! Fixed tables and alphabet constants from RFC 1951.

/// Literal/length alphabet size (0-255 literals, 256 EOB, 257-285 lengths)
pub const LITERAL_ALPHABET_SIZE: usize = 286;

/// Distance alphabet size (codes 0-29)
pub const DISTANCE_ALPHABET_SIZE: usize = 30;

/// Code length (bit-length) alphabet size (0-18)
pub const BIT_LENGTH_ALPHABET_SIZE: usize = 19;

/// End of block symbol
pub const END_OF_BLOCK: usize = 256;

/// Maximum code length for literal/length and distance alphabets
pub const MAX_CODE_LENGTH: u8 = 15;

/// Maximum code length for the code length alphabet
pub const MAX_BIT_LENGTH_CODE_LENGTH: u8 = 7;

/// Shortest back-reference DEFLATE can express
pub const MIN_MATCH: usize = 3;

/// Longest back-reference DEFLATE can express
pub const MAX_MATCH: usize = 258;

/// Back-reference window (32 KiB)
pub const WINDOW_SIZE: usize = 32768;

/// Largest payload of a single stored block (LEN is 16 bits)
pub const MAX_STORED_BLOCK: usize = 65535;

/// Base match length for length codes 257-285, indexed by (code - 257)
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

/// Extra bits for length codes 257-285
pub const LENGTH_EXTRA: [u8; 29] =
    [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0];

/// Base distance for distance codes 0-29
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits for distance codes 0-29
pub const DISTANCE_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13,
];

/// Extra bits for the run-length symbols 16, 17, 18 of the code length alphabet
pub const BIT_LENGTH_EXTRA: [u8; 3] = [2, 3, 7];

/// Order of code length alphabet for dynamic Huffman blocks
pub const CODE_LENGTH_ORDER: [usize; 19] =
    [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

/// (length - 3) -> index into LENGTH_BASE
static LENGTH_CODE: [u8; 256] = build_length_codes();

/// (distance - 1) -> distance code. Entries 0-255 cover distances 1-256
/// directly; entries 256-511 cover larger distances in steps of 128.
static DISTANCE_CODE: [u8; 512] = build_distance_codes();

const fn build_length_codes() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut code = 0;
    while code < 28 {
        let start = (LENGTH_BASE[code] - 3) as usize;
        let count = 1usize << LENGTH_EXTRA[code];
        let mut i = 0;
        while i < count {
            table[start + i] = code as u8;
            i += 1;
        }
        code += 1;
    }
    // 258 has its own code, overriding the last slot of code 284
    table[255] = 28;
    table
}

const fn build_distance_codes() -> [u8; 512] {
    let mut table = [0u8; 512];
    let mut code = 0;
    while code < 30 {
        let start = (DISTANCE_BASE[code] - 1) as usize;
        let count = 1usize << DISTANCE_EXTRA[code];
        let mut d = start;
        while d < start + count {
            if d < 256 {
                table[d] = code as u8;
            } else {
                table[256 + (d >> 7)] = code as u8;
            }
            d += 1;
        }
        code += 1;
    }
    table
}

/// Map a match length to its literal/length symbol.
/// Returns (symbol 257-285, extra_value, extra_bits)
#[inline]
pub fn encode_length(length: u16) -> Option<(u16, u16, u8)> {
    if !(MIN_MATCH as u16..=MAX_MATCH as u16).contains(&length) {
        return None;
    }
    let idx = LENGTH_CODE[(length - 3) as usize] as usize;
    Some((257 + idx as u16, length - LENGTH_BASE[idx], LENGTH_EXTRA[idx]))
}

/// Map a match distance to its distance symbol.
/// Returns (symbol 0-29, extra_value, extra_bits)
#[inline]
pub fn encode_distance(distance: u16) -> Option<(u16, u16, u8)> {
    if distance == 0 || distance as usize > WINDOW_SIZE {
        return None;
    }
    let d = (distance - 1) as usize;
    let slot = if d < 256 { d } else { 256 + (d >> 7) };
    let code = DISTANCE_CODE[slot] as usize;
    Some((code as u16, distance - DISTANCE_BASE[code], DISTANCE_EXTRA[code]))
}

/// Fixed Huffman literal/length code lengths (RFC 1951 section 3.2.6)
pub fn fixed_literal_lengths() -> [u8; 288] {
    let mut lengths = [0u8; 288];
    lengths[0..=143].fill(8);
    lengths[144..=255].fill(9);
    lengths[256..=279].fill(7);
    lengths[280..=287].fill(8);
    lengths
}

/// Fixed Huffman distance code lengths (all 5 bits)
pub fn fixed_distance_lengths() -> [u8; 32] {
    [5u8; 32]
}
