//! X16R Prover CLI
//!
//! # Commands
//!
//! - `mine` - Search a nonce range for solutions
//! - `order` - Show the stage order of a header
//! - `hash` - Hash a single header
//! - `benchmark` - Measure hash rate at every batch width

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use x16r::algorithm::{
    DigestSuite, HeaderTemplate, OrderString, Target, derive_order, hash_with_order,
};
use x16r::work::parse_bits;
use x16r::{MinerConfig, Work, WorkContext, detect_batch_width, miner::Miner};

const DEFAULT_HEADER: [u8; 80] = [0u8; 80];

#[derive(Parser)]
#[command(name = "x16r")]
#[command(author = "Cyberia")]
#[command(version = "0.1.0")]
#[command(about = "Multi-threaded X16R-style proof-of-work miner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Custom config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Args)]
struct WorkArgs {
    /// Work file (JSON with header and optional target)
    #[arg(long, conflicts_with = "header")]
    work: Option<PathBuf>,

    /// Header template as 160 hex characters
    #[arg(long)]
    header: Option<String>,

    /// Target as 64 hex characters, most significant byte first
    #[arg(long)]
    target: Option<String>,

    /// Target as compact difficulty bits (e.g. 1d00ffff)
    #[arg(long)]
    bits: Option<String>,

    /// Target as a number of leading zero bits
    #[arg(short, long)]
    difficulty: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a nonce range for solutions
    Mine {
        #[command(flatten)]
        work: WorkArgs,

        /// Number of threads to use (default: number of CPU cores)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Lanes per batch: 1, 2, 4, 8 or 16 (default: detected)
        #[arg(short, long)]
        lanes: Option<usize>,

        /// First nonce
        #[arg(long)]
        start: Option<u32>,

        /// Last nonce (inclusive)
        #[arg(long)]
        end: Option<u32>,

        /// Keep going after the first solution
        #[arg(long)]
        all: bool,
    },

    /// Show the stage order of a header
    Order {
        /// Header template as 160 hex characters (default: all zeros)
        #[arg(long)]
        header: Option<String>,
    },

    /// Hash a single header
    Hash {
        /// Header template as 160 hex characters (default: all zeros)
        #[arg(long)]
        header: Option<String>,

        /// Nonce to write into the header
        #[arg(long)]
        nonce: Option<u32>,

        /// Override the derived stage order (16 hex symbols)
        #[arg(long)]
        order: Option<String>,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of nonces per batch width
        #[arg(short, long, default_value = "20000")]
        count: u32,

        /// Number of threads to use (default: number of CPU cores)
        #[arg(short, long)]
        threads: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Mine {
            work,
            threads,
            lanes,
            start,
            end,
            all,
        } => cmd_mine(cli.config.as_deref(), &work, threads, lanes, start, end, all),
        Commands::Order { header } => cmd_order(header.as_deref()),
        Commands::Hash {
            header,
            nonce,
            order,
        } => cmd_hash(header.as_deref(), nonce, order.as_deref()),
        Commands::Benchmark { count, threads } => {
            cmd_benchmark(cli.config.as_deref(), count, threads)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::{fmt, prelude::*};

    let filter = if verbose {
        EnvFilter::new("x16r=debug,x16r_core=debug,info")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("x16r=info,x16r_core=info,warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

fn parse_header(hex_header: Option<&str>) -> anyhow::Result<HeaderTemplate> {
    match hex_header {
        Some(text) => Ok(HeaderTemplate::from_bytes(&hex::decode(text.trim())?)?),
        None => Ok(HeaderTemplate::new(DEFAULT_HEADER)),
    }
}

fn load_work(args: &WorkArgs) -> anyhow::Result<Work> {
    let mut work = match (&args.work, &args.header) {
        (Some(path), _) => Work::load(path)?,
        (None, Some(header)) => {
            let header = parse_header(Some(header.as_str()))?;
            Work::new(header, Target::from_compact(header.bits())?)
        }
        (None, None) => anyhow::bail!("Either --work or --header is required"),
    };

    if let Some(target) = &args.target {
        work.target = Target::from_hex(target)?;
    } else if let Some(bits) = &args.bits {
        work.target = Target::from_compact(parse_bits(bits)?)?;
    } else if let Some(zeros) = args.difficulty {
        work.target = Target::from_leading_zeros(zeros);
    }
    Ok(work)
}

#[allow(clippy::too_many_arguments)]
fn cmd_mine(
    config_path: Option<&Path>,
    args: &WorkArgs,
    threads: Option<usize>,
    lanes: Option<usize>,
    start: Option<u32>,
    end: Option<u32>,
    all: bool,
) -> anyhow::Result<()> {
    let mut config = MinerConfig::load_or_default(config_path)?;
    if threads.is_some() {
        config.threads = threads;
    }
    if lanes.is_some() {
        config.lanes = lanes;
    }
    if let Some(start) = start {
        config.nonce_start = start;
    }
    if let Some(end) = end {
        config.nonce_end = end;
    }
    if all {
        config.stop_on_first = false;
    }
    config.validate()?;

    let work = load_work(args)?;
    let order = derive_order(&work.header);
    let miner = Miner::new(Arc::new(DigestSuite), &config)?;

    println!("\n=== X16R Miner ===");
    println!("Order:   {}", order);
    println!("Target:  {}", work.target);
    println!("Nonces:  {}..={}", config.nonce_start, config.nonce_end);
    println!("Threads: {}", miner.threads());
    println!("Lanes:   {}", miner.lanes());
    println!("==================\n");

    let context = WorkContext::new(work, config.stop_on_first);
    let report = miner.mine(&context, config.nonce_start..=config.nonce_end)?;

    if report.solutions.is_empty() {
        println!("\nNo solution in range.");
    }
    for solution in &report.solutions {
        let valid = context.verify(&DigestSuite, solution)?;
        println!("\nFound valid proof!");
        println!("  Nonce:  {}", solution.nonce);
        println!("  Lane:   {}", solution.lane);
        println!("  Hash:   {}", hex::encode(solution.digest));
        println!("  Verify: {}", if valid { "ok" } else { "MISMATCH" });
    }
    println!(
        "\nHashes: {} ({:.0} H/s) in {:.2}s",
        report.attempted,
        report.hashrate(),
        report.elapsed.as_secs_f64()
    );

    Ok(())
}

fn cmd_order(hex_header: Option<&str>) -> anyhow::Result<()> {
    let header = parse_header(hex_header)?;
    let order = derive_order(&header);

    println!("{}", order);
    for (stage, algorithm) in order.iter().enumerate() {
        println!("  {:2}: {} {}", stage, algorithm.symbol(), algorithm);
    }

    Ok(())
}

fn cmd_hash(
    hex_header: Option<&str>,
    nonce: Option<u32>,
    order: Option<&str>,
) -> anyhow::Result<()> {
    let mut header = parse_header(hex_header)?;
    if let Some(nonce) = nonce {
        header = header.with_nonce(nonce);
    }
    let order: OrderString = match order {
        Some(text) => text.parse()?,
        None => derive_order(&header),
    };

    let digest = hash_with_order(&DigestSuite, &order, &header)?;
    println!("Order: {}", order);
    println!("Nonce: {}", header.nonce());
    println!("Hash:  {}", hex::encode(digest));

    Ok(())
}

fn cmd_benchmark(
    config_path: Option<&Path>,
    count: u32,
    threads: Option<usize>,
) -> anyhow::Result<()> {
    let base = MinerConfig::load_or_default(config_path)?;
    let threads = threads.or(base.threads);
    let detected = detect_batch_width();
    let end = count.max(1) - 1;

    println!("Running benchmark with {} hashes per batch width...", count);
    println!("Detected batch width: {}", detected);

    let mut results = Vec::new();
    for lanes in x16r::algorithm::BATCH_WIDTHS {
        let config = MinerConfig {
            threads,
            lanes: Some(lanes),
            stop_on_first: false,
            ..base.clone()
        };
        let miner = Miner::new(Arc::new(DigestSuite), &config)?;
        let context = WorkContext::benchmark(Work::new(
            HeaderTemplate::new(DEFAULT_HEADER),
            Target::BENCHMARK,
        ));

        let start = Instant::now();
        let report = miner.mine(&context, 0..=end)?;
        let elapsed = start.elapsed();
        results.push((lanes, report.attempted, elapsed, report.hashrate()));
    }

    println!("\nResults:");
    for (lanes, hashes, elapsed, hashrate) in results {
        let marker = if lanes == detected { " (detected)" } else { "" };
        println!(
            "  {:2} lanes: {} hashes in {:.2}s, {:.0} H/s{}",
            lanes,
            hashes,
            elapsed.as_secs_f64(),
            hashrate,
            marker
        );
    }

    println!("\nAlgorithm parameters:");
    println!("  Stages: {}", x16r::algorithm::CHAIN_LENGTH);
    println!("  Header: {} bytes", x16r::algorithm::HEADER_SIZE);
    println!("  Benchmark target: {}", Target::BENCHMARK);

    Ok(())
}
