//! Length-limited canonical Huffman tree construction.
//!
//! Code lengths come from the classic lowest-pair merge. When that tree is
//! deeper than the format allows, the lengths are recomputed with
//! package-merge, which yields the optimal complete code under the limit.

use tracing::trace;

use super::code_table::CodeTable;
use super::frequency::{BitLengthFrequencies, BlockFrequencies};
use crate::deflate::tables::{
    BIT_LENGTH_EXTRA, CODE_LENGTH_ORDER, END_OF_BLOCK, MAX_BIT_LENGTH_CODE_LENGTH,
    MAX_CODE_LENGTH,
};

/// One entry of the run-length encoded code length sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RleCode {
    /// Code length alphabet symbol (0-15 literal length, 16-18 repeat codes)
    pub symbol: u8,
    /// Value of the repeat code's extra bits
    pub extra: u8,
}

impl RleCode {
    fn literal(length: u8) -> Self {
        Self { symbol: length, extra: 0 }
    }

    /// Number of extra bits following this symbol
    #[inline]
    pub fn extra_bits(&self) -> u8 {
        match self.symbol {
            16..=18 => BIT_LENGTH_EXTRA[(self.symbol - 16) as usize],
            _ => 0,
        }
    }
}

/// Everything needed to emit one dynamic block
#[derive(Clone, Debug)]
pub struct TreeSet {
    /// Literal/length code, trimmed to HLIT + 257 symbols
    pub literal: CodeTable,
    /// Distance code, trimmed to HDIST + 1 symbols
    pub distance: CodeTable,
    /// Code length alphabet code (19 symbols)
    pub bit_length: CodeTable,
    /// Run-length encoded literal/length + distance code lengths
    pub rle: Vec<RleCode>,
    /// Number of code length code lengths transmitted (HCLEN + 4)
    pub num_bit_length_codes: usize,
}

impl TreeSet {
    /// Size in bits of the dynamic header after BFINAL/BTYPE
    pub fn header_bits(&self) -> u64 {
        let mut bits = 5 + 5 + 4 + 3 * self.num_bit_length_codes as u64;
        for code in &self.rle {
            bits += self.bit_length.length(code.symbol as usize) as u64 + code.extra_bits() as u64;
        }
        bits
    }
}

/// Builds the three code tables of a dynamic block from frequency tables
#[derive(Clone, Copy, Debug)]
pub struct HuffmanTreeBuilder {
    max_code_length: u8,
    max_bit_length_code_length: u8,
}

impl HuffmanTreeBuilder {
    pub fn new(max_code_length: u8, max_bit_length_code_length: u8) -> Self {
        Self { max_code_length, max_bit_length_code_length }
    }

    pub fn build(&self, freq: &BlockFrequencies) -> TreeSet {
        let mut lit_lengths = compute_code_lengths(freq.literal.counts(), self.max_code_length);
        let mut dist_lengths = compute_code_lengths(freq.distance.counts(), self.max_code_length);
        debug_assert!(lit_lengths[END_OF_BLOCK] > 0);

        // HLIT covers at least the literals and EOB, HDIST at least one code
        let num_lit = last_used(&lit_lengths).max(END_OF_BLOCK + 1);
        let num_dist = last_used(&dist_lengths).max(1);
        lit_lengths.truncate(num_lit);
        dist_lengths.truncate(num_dist);

        let combined: Vec<u8> = lit_lengths.iter().chain(dist_lengths.iter()).copied().collect();
        let rle = rle_encode_lengths(&combined);

        let mut cl_freq = BitLengthFrequencies::new();
        for code in &rle {
            cl_freq.increment(code.symbol as usize);
        }
        let cl_lengths = compute_code_lengths(cl_freq.counts(), self.max_bit_length_code_length);

        // Code length code lengths are sent in CODE_LENGTH_ORDER; trailing
        // zeros are dropped but at least 4 are always sent
        let num_bit_length_codes = CODE_LENGTH_ORDER
            .iter()
            .rposition(|&sym| cl_lengths[sym] > 0)
            .map_or(4, |i| (i + 1).max(4));

        trace!(num_lit, num_dist, rle = rle.len(), num_bit_length_codes, "built dynamic trees");

        TreeSet {
            literal: CodeTable::from_lengths(&lit_lengths),
            distance: CodeTable::from_lengths(&dist_lengths),
            bit_length: CodeTable::from_lengths(&cl_lengths),
            rle,
            num_bit_length_codes,
        }
    }
}

impl Default for HuffmanTreeBuilder {
    fn default() -> Self {
        Self::new(MAX_CODE_LENGTH, MAX_BIT_LENGTH_CODE_LENGTH)
    }
}

/// Index one past the last nonzero length
fn last_used(lengths: &[u8]) -> usize {
    lengths.iter().rposition(|&l| l > 0).map_or(0, |i| i + 1)
}

/// Compute Huffman code lengths for `frequencies`, no longer than `max_bits`.
///
/// Returns one length per symbol (0 for unused symbols). The result is always
/// a complete code: when fewer than two symbols are used, phantom symbols
/// fill the remaining 1-bit codes so that decoders see a full tree.
///
/// `frequencies.len()` must be at least 2 and at most `2^max_bits`.
pub fn compute_code_lengths(frequencies: &[u32], max_bits: u8) -> Vec<u8> {
    let n = frequencies.len();
    debug_assert!(n >= 2);
    debug_assert!(n <= 1usize << max_bits);

    let mut lengths = vec![0u8; n];

    // Leaves sorted by (frequency, symbol)
    let mut leaves: Vec<(u64, usize)> = frequencies
        .iter()
        .enumerate()
        .filter(|(_, &f)| f > 0)
        .map(|(s, &f)| (f as u64, s))
        .collect();
    leaves.sort_unstable();

    match leaves.len() {
        0 => {
            lengths[0] = 1;
            lengths[1] = 1;
            return lengths;
        }
        1 => {
            let sym = leaves[0].1;
            let partner = if sym == 0 { 1 } else { 0 };
            lengths[sym] = 1;
            lengths[partner] = 1;
            return lengths;
        }
        _ => {}
    }

    let depths = huffman_depths(&leaves);
    let deepest = depths.iter().copied().max().unwrap_or(0);

    let leaf_lengths = if deepest > max_bits as u32 {
        trace!(deepest, max_bits, "limiting code lengths");
        package_merge(&leaves, max_bits)
    } else {
        depths.iter().map(|&d| d as u8).collect()
    };

    for (&(_, sym), len) in leaves.iter().zip(leaf_lengths) {
        lengths[sym] = len;
    }
    lengths
}

/// Leaf depths of an optimal prefix code, by repeatedly merging the two
/// lightest nodes. `leaves` must be sorted by weight.
///
/// Uses the two-queue method over flat arrays: leaves are consumed in sorted
/// order and internal nodes are created in nondecreasing weight order, so the
/// lightest node is always at the front of one of the two queues.
fn huffman_depths(leaves: &[(u64, usize)]) -> Vec<u32> {
    let n = leaves.len();
    let total = 2 * n - 1;

    let mut weight: Vec<u64> = Vec::with_capacity(total);
    weight.extend(leaves.iter().map(|&(w, _)| w));
    let mut parent = vec![0usize; total];

    let mut next_leaf = 0;
    let mut next_internal = n;

    for node in n..total {
        let mut pick = || {
            let take_leaf = next_leaf < n
                && (next_internal >= node || weight[next_leaf] <= weight[next_internal]);
            if take_leaf {
                next_leaf += 1;
                next_leaf - 1
            } else {
                next_internal += 1;
                next_internal - 1
            }
        };
        let a = pick();
        let b = pick();
        weight.push(weight[a] + weight[b]);
        parent[a] = node;
        parent[b] = node;
    }

    // Children always have smaller indices than their parent; the root is last
    let mut depth = vec![0u32; total];
    for i in (0..total - 1).rev() {
        depth[i] = depth[parent[i]] + 1;
    }
    depth.truncate(n);
    depth
}

#[derive(Clone, Copy)]
enum Item {
    Leaf(usize),
    /// Package of items `2k` and `2k + 1` of the previous list
    Package,
}

/// Optimal code lengths limited to `max_bits` (package-merge).
///
/// `leaves` must be sorted by weight. Returns lengths in leaf order.
fn package_merge(leaves: &[(u64, usize)], max_bits: u8) -> Vec<u8> {
    let n = leaves.len();
    let leaf_items: Vec<(u64, Item)> =
        leaves.iter().enumerate().map(|(i, &(w, _))| (w, Item::Leaf(i))).collect();

    let mut lists: Vec<Vec<(u64, Item)>> = Vec::with_capacity(max_bits as usize);
    let mut current = leaf_items.clone();

    for _ in 1..max_bits {
        let packages = current.chunks_exact(2).map(|pair| (pair[0].0 + pair[1].0, Item::Package));

        // Stable merge; leaves win ties
        let mut merged = Vec::with_capacity(n + current.len() / 2);
        let mut packages = packages.peekable();
        let mut leaf_iter = leaf_items.iter().copied().peekable();
        loop {
            let take_leaf = match (leaf_iter.peek(), packages.peek()) {
                (Some(l), Some(p)) => l.0 <= p.0,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let item = if take_leaf { leaf_iter.next() } else { packages.next() };
            merged.extend(item);
        }

        lists.push(std::mem::replace(&mut current, merged));
    }

    // Select the 2n - 2 lightest items of the top list and expand packages:
    // each package selected in a list selects two items of the list below,
    // always a prefix of it.
    let mut lengths = vec![0u8; n];
    let mut take = 2 * n - 2;
    let mut list = current;
    loop {
        let mut packages = 0;
        for &(_, item) in &list[..take] {
            match item {
                Item::Leaf(i) => lengths[i] += 1,
                Item::Package => packages += 1,
            }
        }
        match lists.pop() {
            Some(below) => {
                take = 2 * packages;
                list = below;
            }
            None => break,
        }
    }
    lengths
}

/// RLE encode code lengths using symbols 16 (repeat previous 3-6 times),
/// 17 (3-10 zeros) and 18 (11-138 zeros)
pub fn rle_encode_lengths(lengths: &[u8]) -> Vec<RleCode> {
    let mut result = Vec::new();
    let mut i = 0;

    while i < lengths.len() {
        let len = lengths[i];
        let run = lengths[i..].iter().take_while(|&&l| l == len).count();
        i += run;

        if len == 0 {
            let mut left = run;
            while left > 0 {
                if left >= 11 {
                    let count = left.min(138);
                    result.push(RleCode { symbol: 18, extra: (count - 11) as u8 });
                    left -= count;
                } else if left >= 3 {
                    let count = left.min(10);
                    result.push(RleCode { symbol: 17, extra: (count - 3) as u8 });
                    left -= count;
                } else {
                    result.push(RleCode::literal(0));
                    left -= 1;
                }
            }
        } else {
            // The first length is always sent; 16 can only repeat it
            result.push(RleCode::literal(len));
            let mut left = run - 1;
            while left > 0 {
                if left >= 3 {
                    let count = left.min(6);
                    result.push(RleCode { symbol: 16, extra: (count - 3) as u8 });
                    left -= count;
                } else {
                    result.push(RleCode::literal(len));
                    left -= 1;
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deflate::tables::{DISTANCE_ALPHABET_SIZE, LITERAL_ALPHABET_SIZE};
    use crate::deflate::{Symbol, SymbolStream};

    fn kraft_is_complete(lengths: &[u8]) -> bool {
        let max = *lengths.iter().max().unwrap();
        let sum: u64 = lengths.iter().filter(|&&l| l > 0).map(|&l| 1u64 << (max - l)).sum();
        sum == 1u64 << max
    }

    fn expand_rle(codes: &[RleCode]) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        for code in codes {
            match code.symbol {
                16 => {
                    let prev = *out.last().unwrap();
                    out.extend(std::iter::repeat(prev).take(3 + code.extra as usize));
                }
                17 => out.extend(std::iter::repeat(0).take(3 + code.extra as usize)),
                18 => out.extend(std::iter::repeat(0).take(11 + code.extra as usize)),
                len => out.push(len),
            }
        }
        out
    }

    #[test]
    fn test_equal_frequencies() {
        let lengths = compute_code_lengths(&[1, 1, 1, 1], 15);
        assert_eq!(lengths, vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_skewed_frequencies() {
        let lengths = compute_code_lengths(&[100, 1, 1, 1], 15);
        assert_eq!(lengths[0], 1);
        assert!(lengths[1..].iter().all(|&l| l >= 2));
        assert!(kraft_is_complete(&lengths));
    }

    #[test]
    fn test_single_symbol_gets_one_bit() {
        let mut freqs = [0u32; 30];
        freqs[7] = 42;
        let lengths = compute_code_lengths(&freqs, 15);
        assert_eq!(lengths[7], 1);
        assert_eq!(lengths[0], 1); // phantom partner
        assert_eq!(lengths.iter().filter(|&&l| l > 0).count(), 2);

        let mut freqs = [0u32; 30];
        freqs[0] = 3;
        let lengths = compute_code_lengths(&freqs, 15);
        assert_eq!((lengths[0], lengths[1]), (1, 1));
    }

    #[test]
    fn test_all_zero_frequencies() {
        let lengths = compute_code_lengths(&[0u32; 30], 15);
        assert_eq!(&lengths[..2], &[1, 1]);
        assert!(lengths[2..].iter().all(|&l| l == 0));
    }

    #[test]
    fn test_length_limit_applied() {
        // Fibonacci weights produce a maximally deep tree
        let mut freqs = vec![0u32; 30];
        let (mut a, mut b) = (1u32, 1u32);
        for f in freqs.iter_mut().take(25) {
            *f = a;
            let next = a + b;
            a = b;
            b = next;
        }
        let unlimited = compute_code_lengths(&freqs, 15);
        assert!(*unlimited.iter().max().unwrap() > 7);

        let limited = compute_code_lengths(&freqs, 7);
        assert!(*limited.iter().max().unwrap() <= 7);
        assert!(kraft_is_complete(&limited));
        assert_eq!(limited.iter().filter(|&&l| l > 0).count(), 25);
    }

    #[test]
    fn test_package_merge_is_optimal_for_small_case() {
        // Weights 1,1,2,4 unlimited: lengths 3,3,2,1 (cost 1*3+1*3+2*2+4*1 = 14).
        // Limited to 2 bits every symbol must use exactly 2 bits.
        let leaves = vec![(1u64, 0usize), (1, 1), (2, 2), (4, 3)];
        assert_eq!(package_merge(&leaves, 2), vec![2, 2, 2, 2]);
        assert_eq!(package_merge(&leaves, 3), vec![3, 3, 2, 1]);
    }

    #[test]
    fn test_huffman_depths_two_queue() {
        let leaves = vec![(1u64, 0usize), (1, 1), (2, 2), (4, 3)];
        assert_eq!(huffman_depths(&leaves), vec![3, 3, 2, 1]);
    }

    #[test]
    fn test_rle_encode_zeros() {
        let encoded = rle_encode_lengths(&[0u8; 20]);
        assert_eq!(encoded, vec![RleCode { symbol: 18, extra: 9 }]);
    }

    #[test]
    fn test_rle_encode_repeat() {
        let encoded = rle_encode_lengths(&[5u8; 10]);
        assert_eq!(
            encoded,
            vec![
                RleCode { symbol: 5, extra: 0 },
                RleCode { symbol: 16, extra: 3 },
                RleCode { symbol: 5, extra: 0 },
                RleCode { symbol: 5, extra: 0 },
                RleCode { symbol: 5, extra: 0 },
            ]
        );
        assert_eq!(expand_rle(&encoded), vec![5u8; 10]);
    }

    #[test]
    fn test_rle_round_trip_mixed() {
        let mut lengths = vec![8u8; 144];
        lengths.extend([9u8; 112]);
        lengths.extend([0u8; 150]);
        lengths.extend([7, 7, 0, 0, 3, 4, 4, 4, 4, 0, 0, 0, 0, 0]);
        let encoded = rle_encode_lengths(&lengths);
        assert_eq!(expand_rle(&encoded), lengths);
    }

    #[test]
    fn test_build_tree_set() {
        let stream: SymbolStream = b"abracadabra"
            .iter()
            .map(|&b| Symbol::Literal(b))
            .chain([Symbol::Match { length: 4, distance: 7 }])
            .collect();
        let freq = BlockFrequencies::from_stream(&stream).unwrap();
        let trees = HuffmanTreeBuilder::default().build(&freq);

        assert_eq!(trees.literal.len(), 259); // up to length code 258
        assert_eq!(trees.distance.len(), 6); // distance 7 -> code 5
        for table in [&trees.literal, &trees.distance, &trees.bit_length] {
            assert!(table.is_prefix_free());
            assert!(table.is_complete());
        }
        assert!(trees.bit_length.lengths().iter().all(|&l| l <= 7));
        assert!((4..=19).contains(&trees.num_bit_length_codes));

        let combined: Vec<u8> =
            trees.literal.lengths().iter().chain(trees.distance.lengths()).copied().collect();
        assert_eq!(expand_rle(&trees.rle), combined);
    }

    #[test]
    fn test_build_random_tables_stay_complete() {
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        for max_code_length in [9u8, 15] {
            let builder = HuffmanTreeBuilder::new(max_code_length, MAX_BIT_LENGTH_CODE_LENGTH);
            for _ in 0..12 {
                // Counts spread over 2^0..2^11 with a quarter of symbols unused,
                // deep enough to need length limiting at 9 bits
                let mut freq = BlockFrequencies::new();
                for sym in 0..LITERAL_ALPHABET_SIZE {
                    let r = next();
                    if r % 4 != 0 {
                        for _ in 0..1u32 << ((r >> 8) % 12) {
                            freq.literal.increment(sym);
                        }
                    }
                }
                for sym in 0..DISTANCE_ALPHABET_SIZE {
                    let r = next();
                    if r % 4 != 0 {
                        for _ in 0..1u32 << ((r >> 8) % 12) {
                            freq.distance.increment(sym);
                        }
                    }
                }

                let trees = builder.build(&freq);
                for table in [&trees.literal, &trees.distance, &trees.bit_length] {
                    assert!(table.is_prefix_free() && table.is_complete());
                }
                assert!(trees.literal.lengths().iter().all(|&l| l <= max_code_length));
                assert!(trees.distance.lengths().iter().all(|&l| l <= max_code_length));
                assert!(trees
                    .bit_length
                    .lengths()
                    .iter()
                    .all(|&l| l <= MAX_BIT_LENGTH_CODE_LENGTH));
                for sym in 0..LITERAL_ALPHABET_SIZE {
                    let coded = sym < trees.literal.len() && trees.literal.length(sym) > 0;
                    assert_eq!(freq.literal.get(sym) > 0, coded, "symbol {}", sym);
                }

                let combined: Vec<u8> = trees
                    .literal
                    .lengths()
                    .iter()
                    .chain(trees.distance.lengths())
                    .copied()
                    .collect();
                assert_eq!(expand_rle(&trees.rle), combined);
            }
        }
    }

    #[test]
    fn test_build_empty_block_trees() {
        let trees = HuffmanTreeBuilder::default().build(&BlockFrequencies::new());
        assert_eq!(trees.literal.len(), 257);
        assert_eq!(trees.literal.length(END_OF_BLOCK), 1);
        assert_eq!(trees.literal.length(0), 1);
        assert_eq!(trees.distance.len(), 2);
        assert!(trees.literal.is_complete());
        assert!(trees.distance.is_complete());
    }
}
