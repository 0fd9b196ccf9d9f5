use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use lanezip::{verify, BlockLaneScheduler, CompressionLevel, EncodeStats, Encoder, EncoderConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lanezip")]
#[command(about = "Compress data into a zlib stream, encoding blocks in parallel lanes")]
#[command(version)]
struct Args {
    /// Input file (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Output zlib file (use - for stdout)
    #[arg(short, long)]
    output: PathBuf,

    /// Number of threads (0 = auto, 1 = single-threaded)
    #[arg(short = 't', long, default_value = "0")]
    threads: usize,

    /// Blocks encoded per round
    #[arg(long, default_value = "8")]
    lanes: usize,

    /// Uncompressed block size in bytes
    #[arg(long, default_value = "1048576")]
    block_size: usize,

    /// Compression level (1-9)
    #[arg(
        short = 'l',
        long,
        default_value = "6",
        value_parser = clap::value_parser!(u8).range(1..=9)
    )]
    level: u8,

    /// Decode the output again and compare it with the input
    #[arg(long)]
    verify: bool,

    /// Show verbose statistics
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug with --verbose
fn init_tracing(verbose: bool) {
    let default = if verbose { "lanezip=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = EncoderConfig {
        block_size: args.block_size,
        lane_count: args.lanes,
        num_threads: args.threads,
        level: CompressionLevel::from_level(args.level),
        ..Default::default()
    };
    config.validate()?;

    let mut input = open_input(&args.input)?;
    let mut output = open_output(&args.output)?;
    let mut encoder = BlockLaneScheduler::new(config);

    let start = Instant::now();

    let stats = if args.verify {
        // Verification needs both sides in memory
        let mut original = Vec::new();
        input.read_to_end(&mut original)?;
        let mut compressed = Vec::new();
        let stats = encoder.encode(original.as_slice(), &mut compressed)?;
        verify(&compressed, &original)?;
        output.write_all(&compressed)?;
        stats
    } else {
        encoder.encode(&mut input, &mut output)?
    };
    output.flush()?;

    let elapsed = start.elapsed();

    if args.verbose {
        print_stats(&stats, elapsed.as_secs_f64());
        if args.verify {
            eprintln!("  Verified:         yes");
        }
    }

    Ok(())
}

fn open_input(path: &Path) -> io::Result<Box<dyn Read>> {
    if path.to_str() == Some("-") {
        Ok(Box::new(io::stdin().lock()))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

fn open_output(path: &Path) -> io::Result<Box<dyn Write>> {
    if path.to_str() == Some("-") {
        Ok(Box::new(io::stdout().lock()))
    } else {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }
}

fn print_stats(stats: &EncodeStats, seconds: f64) {
    let ratio = if stats.input_bytes > 0 {
        stats.output_bytes as f64 / stats.input_bytes as f64 * 100.0
    } else {
        0.0
    };

    eprintln!("Encoding complete:");
    eprintln!("  Input bytes:      {}", stats.input_bytes);
    eprintln!("  Output bytes:     {} ({:.1}%)", stats.output_bytes, ratio);
    eprintln!(
        "  Blocks:           {} in {} rounds ({} dynamic, {} fixed, {} stored)",
        stats.blocks_written,
        stats.rounds,
        stats.dynamic_blocks,
        stats.fixed_blocks,
        stats.stored_blocks
    );
    eprintln!("  Adler-32:         {:08x}", stats.checksum);
    eprintln!("  Time:             {:.2}s", seconds);
    eprintln!("  Throughput:       {:.1} MB/s", stats.input_bytes as f64 / seconds / 1_000_000.0);
}
