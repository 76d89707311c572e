//! Run a random sparse-dense product and report timings
//!
//! Usage:
//!     cargo run --release --features cli --bin spmm-run -- \
//!         --rows 20000 --cols 20000 --out-cols 64 --threads 8

use clap::Parser;
use math_audio_spmm::parallel::is_parallel_available;
use math_audio_spmm::testdata::{random_csr, random_dense};
use math_audio_spmm::{DenseLayout, SparseDenseMultiplier, SpmmConfig};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "spmm-run",
    about = "Multiply a random CSR matrix with a random dense matrix"
)]
struct Args {
    /// Number of rows of the sparse matrix
    #[arg(long, default_value_t = 4096)]
    rows: usize,

    /// Number of columns of the sparse matrix (rows of the dense matrix)
    #[arg(long, default_value_t = 4096)]
    cols: usize,

    /// Number of columns of the dense matrix
    #[arg(long, default_value_t = 32)]
    out_cols: usize,

    /// Fraction of stored entries in the sparse matrix
    #[arg(long, default_value_t = 0.001)]
    density: f64,

    /// Number of worker threads (overrides the config file)
    #[arg(long)]
    threads: Option<usize>,

    /// Store dense operands column-major
    #[arg(long)]
    col_major: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of timed repetitions
    #[arg(long, default_value_t = 5)]
    repeat: usize,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            println!("Loading configuration from: {}", path.display());
            SpmmConfig::from_file(path)?
        }
        None => SpmmConfig::default(),
    }
    .with_env_overrides()?;
    if let Some(threads) = args.threads {
        config.thread_count = threads;
    }
    if args.col_major {
        config.layout = DenseLayout::ColMajor;
    }
    if config.thread_count > 1 && !is_parallel_available() {
        log::warn!("built without rayon: row blocks run on the calling thread");
    }

    println!(
        "A: {}x{} (density {:.2e}), B: {}x{}, {:?}, {} thread(s)",
        args.rows,
        args.cols,
        args.density,
        args.cols,
        args.out_cols,
        config.layout,
        config.thread_count
    );

    let a = random_csr(args.rows, args.cols, args.density, args.seed)?;
    let b = random_dense(args.cols * args.out_cols, args.seed.wrapping_add(1));
    println!("nnz(A) = {} (fill {:.2e})", a.nnz(), a.sparsity());

    let reference = {
        let sequential = SparseDenseMultiplier::new(SpmmConfig {
            thread_count: 1,
            layout: config.layout,
        })?;
        let mut c = vec![0.0; args.rows * args.out_cols];
        let start = Instant::now();
        sequential.multiply_into(&a, &b, args.out_cols, &mut c)?;
        println!("1 thread: {:.3} ms", start.elapsed().as_secs_f64() * 1e3);
        c
    };

    let multiplier = SparseDenseMultiplier::new(config)?;
    let mut c = vec![0.0; args.rows * args.out_cols];
    let mut best = f64::INFINITY;
    for _ in 0..args.repeat.max(1) {
        let start = Instant::now();
        multiplier.multiply_into(&a, &b, args.out_cols, &mut c)?;
        best = best.min(start.elapsed().as_secs_f64());
    }

    let flops = 2.0 * a.nnz() as f64 * args.out_cols as f64;
    println!(
        "{} thread(s): best {:.3} ms, {:.2} GFLOP/s",
        multiplier.thread_count(),
        best * 1e3,
        flops / best / 1e9
    );

    if c != reference {
        anyhow::bail!("parallel result differs from the single-thread result");
    }
    println!("Result identical to single-thread run");

    Ok(())
}
