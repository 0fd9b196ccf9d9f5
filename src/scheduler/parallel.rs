//! Lane scheduler running each round of blocks on a worker pool.
//!
//! Architecture:
//! - Main thread: read a round of blocks, send one job per lane
//! - Worker pool: LZ77 -> tree build -> encode for each job
//! - Main thread: wait for every lane of the round (barrier), then append the
//!   results to the container in block index order

use std::io::{BufReader, BufWriter, Read, Write};
use std::panic::{self, AssertUnwindSafe};

use crossbeam::channel::{bounded, Receiver, Sender};
use tracing::debug;

use super::lane::{EncodedLane, LaneEncoder};
use super::single::SingleThreadedEncoder;
use super::splitter::BlockSplitter;
use crate::deflate::Block;
use crate::error::{Error, Result};
use crate::zlib::ContainerAssembler;
use crate::{EncodeStats, Encoder, EncoderConfig};

/// Parallel lane scheduler
pub struct BlockLaneScheduler {
    config: EncoderConfig,
}

impl BlockLaneScheduler {
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Worker count: requested (or detected) threads, never more than lanes
    fn effective_threads(&self) -> usize {
        let threads = match self.config.num_threads {
            0 => num_cpus::get(),
            n => n,
        };
        threads.clamp(1, self.config.lane_count.max(1))
    }
}

impl Encoder for BlockLaneScheduler {
    fn encode<R: Read, W: Write>(&mut self, input: R, output: W) -> Result<EncodeStats> {
        self.config.validate()?;

        let num_threads = self.effective_threads();

        // For single thread, delegate to single-threaded implementation
        if num_threads == 1 {
            let mut single = SingleThreadedEncoder::new(self.config.clone());
            return single.encode(input, output);
        }

        self.encode_parallel(input, output, num_threads)
    }
}

impl BlockLaneScheduler {
    fn encode_parallel<R: Read, W: Write>(
        &self,
        input: R,
        output: W,
        num_threads: usize,
    ) -> Result<EncodeStats> {
        // A whole round fits in either channel, so the main thread never
        // blocks on send while workers wait on a full result queue
        let channel_capacity = self.config.lane_count;

        let (job_tx, job_rx): (Sender<Block>, Receiver<Block>) = bounded(channel_capacity);
        let (result_tx, result_rx): (Sender<Result<EncodedLane>>, Receiver<Result<EncodedLane>>) =
            bounded(channel_capacity);

        let config = &self.config;

        let result = crossbeam::scope(|scope| {
            for _ in 0..num_threads {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();

                scope.spawn(move |_| {
                    worker_thread(config, job_rx, result_tx);
                });
            }

            // Drop our copies of the channels that workers use
            drop(job_rx);
            drop(result_tx);

            self.dispatch_rounds(input, output, job_tx, result_rx)
        });

        result.map_err(|_| Error::Internal("Thread panicked".to_string()))?
    }

    fn dispatch_rounds<R: Read, W: Write>(
        &self,
        input: R,
        output: W,
        job_tx: Sender<Block>,
        result_rx: Receiver<Result<EncodedLane>>,
    ) -> Result<EncodeStats> {
        let reader = BufReader::with_capacity(self.config.buffer_size, input);
        let writer = BufWriter::with_capacity(self.config.buffer_size, output);

        let mut splitter = BlockSplitter::new(reader, self.config.block_size);
        let mut assembler = ContainerAssembler::new(writer);
        let mut stats = EncodeStats::default();

        loop {
            let round = splitter.next_round(self.config.lane_count)?;
            if round.is_empty() {
                break;
            }
            let lanes = round.len();

            for block in round {
                job_tx
                    .send(block)
                    .map_err(|_| Error::Internal("Workers disconnected".to_string()))?;
            }

            // Barrier: collect every lane of the round before appending any
            let mut slots: Vec<Option<EncodedLane>> = (0..lanes).map(|_| None).collect();
            for _ in 0..lanes {
                let lane = result_rx
                    .recv()
                    .map_err(|_| Error::Internal("Result channel disconnected".to_string()))??;
                let slot = lane.lane;
                slots[slot] = Some(lane);
            }

            // Append in block index order, never completion order
            for slot in slots {
                let lane =
                    slot.ok_or_else(|| Error::Internal("Lane missing from round".to_string()))?;
                assembler.append(&lane.block, lane.checksum, lane.len)?;
                stats.record_kind(lane.block.kind());
            }

            stats.rounds += 1;
            debug!(round = stats.rounds, lanes, "round assembled");
        }

        // Signal workers we're done
        drop(job_tx);

        debug!(blocks = splitter.blocks_read(), bytes = splitter.bytes_read(), "input exhausted");
        stats.input_bytes = assembler.input_bytes();
        stats.blocks_written = assembler.blocks();
        stats.checksum = assembler.checksum();
        let (_writer, output_bytes) = assembler.finish()?;
        stats.output_bytes = output_bytes;

        Ok(stats)
    }
}

/// Worker thread function: runs whole lanes until the job channel closes
fn worker_thread(
    config: &EncoderConfig,
    job_rx: Receiver<Block>,
    result_tx: Sender<Result<EncodedLane>>,
) {
    let mut lanes = LaneEncoder::new(config);

    while let Ok(block) = job_rx.recv() {
        // A panicking lane must still answer, or the barrier would wait forever
        let result = panic::catch_unwind(AssertUnwindSafe(|| lanes.encode(&block)))
            .unwrap_or_else(|_| {
                Err(Error::Internal(format!("Lane for block {} panicked", block.index)))
            });

        if result_tx.send(result).is_err() {
            // Main thread has stopped, exit
            break;
        }
    }
}
