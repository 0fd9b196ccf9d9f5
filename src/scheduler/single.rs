use std::io::{BufReader, BufWriter, Read, Write};

use tracing::debug;

use super::lane::LaneEncoder;
use super::splitter::BlockSplitter;
use crate::error::Result;
use crate::zlib::ContainerAssembler;
use crate::{EncodeStats, Encoder, EncoderConfig};

/// Runs every lane on the calling thread, in index order
pub struct SingleThreadedEncoder {
    config: EncoderConfig,
}

impl SingleThreadedEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }
}

impl Encoder for SingleThreadedEncoder {
    fn encode<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<EncodeStats> {
        self.config.validate()?;

        let reader = BufReader::with_capacity(self.config.buffer_size, input);
        let writer = BufWriter::with_capacity(self.config.buffer_size, output);

        let mut splitter = BlockSplitter::new(reader, self.config.block_size);
        let mut lanes = LaneEncoder::new(&self.config);
        let mut assembler = ContainerAssembler::new(writer);
        let mut stats = EncodeStats::default();

        loop {
            let round = splitter.next_round(self.config.lane_count)?;
            if round.is_empty() {
                break;
            }
            for block in &round {
                let lane = lanes.encode(block)?;
                assembler.append(&lane.block, lane.checksum, lane.len)?;
                stats.record_kind(lane.block.kind());
            }
            stats.rounds += 1;
            debug!(round = stats.rounds, blocks = round.len(), "round assembled");
        }

        debug!(blocks = splitter.blocks_read(), bytes = splitter.bytes_read(), "input exhausted");
        stats.input_bytes = assembler.input_bytes();
        stats.blocks_written = assembler.blocks();
        stats.checksum = assembler.checksum();
        let (_writer, output_bytes) = assembler.finish()?;
        stats.output_bytes = output_bytes;

        Ok(stats)
    }
}
