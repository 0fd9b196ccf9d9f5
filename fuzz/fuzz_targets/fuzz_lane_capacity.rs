#![no_main]

use lanezip::{encode_lane, verify, Block, ContainerAssembler, EncoderConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary capacities must only ever switch lanes to stored blocks
    if data.is_empty() {
        return;
    }
    let (capacity, payload) = data.split_at(1);
    let config = EncoderConfig {
        lane_capacity: Some(capacity[0] as usize * 4),
        ..Default::default()
    };

    let mut assembler = ContainerAssembler::new(Vec::new());
    for (i, chunk) in payload.chunks(97).enumerate() {
        let lane = encode_lane(&Block::new(i as u64, i % 8, chunk.to_vec()), &config)
            .expect("encoding is total");
        assembler.append(&lane.block, lane.checksum, lane.len).expect("in-memory write");
    }
    let (compressed, _) = assembler.finish().expect("in-memory write");

    verify(&compressed, payload).expect("lanes must reassemble to the input");
});
