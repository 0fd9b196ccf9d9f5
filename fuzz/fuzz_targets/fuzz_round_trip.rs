#![no_main]

use flate2::read::ZlibDecoder;
use lanezip::{compress_with, EncoderConfig};
use libfuzzer_sys::fuzz_target;
use std::io::Read;

fuzz_target!(|data: &[u8]| {
    // First two bytes pick the block geometry so short inputs still span
    // several lanes and rounds
    if data.len() < 2 {
        return;
    }
    let (params, payload) = data.split_at(2);
    let config = EncoderConfig {
        block_size: params[0] as usize % 64 + 1,
        lane_count: params[1] as usize % 8 + 1,
        num_threads: 2,
        ..Default::default()
    };

    let compressed = compress_with(payload, &config).expect("encoding is total");

    let mut decoded = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut decoded)
        .expect("output must be a valid zlib stream");
    assert_eq!(decoded, payload);
});
