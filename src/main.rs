//! `rowpar` - time sequential against row-partitioned parallel matrix multiplication.

use clap::Parser;
use log::debug;
use rowpar::bench::{self, BenchmarkConfig};
use rowpar::{default_workers, ParallelConfig, PARALLEL_THRESHOLD};

#[derive(Parser, Debug)]
#[command(
    name = "rowpar",
    version = env!("CARGO_PKG_VERSION"),
    about = "Compare sequential and row-partitioned parallel matrix multiplication."
)]
struct Cli {
    /// Rows of A (and columns of B)
    #[arg(long, default_value_t = 200)]
    rows: usize,

    /// Columns of A (and rows of B)
    #[arg(long, default_value_t = 200)]
    cols: usize,

    /// Timed repetitions per multiplier, averaged
    #[arg(long = "eval-runs", default_value_t = 1)]
    eval_runs: usize,

    /// Worker threads for the parallel multiplier [default: available cores]
    #[arg(short = 'w', long)]
    workers: Option<usize>,

    /// Outputs with fewer cells than this run sequentially
    #[arg(long, default_value_t = PARALLEL_THRESHOLD)]
    threshold: usize,

    /// Seed for the random operands
    #[arg(long)]
    seed: Option<u64>,

    // verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn benchmark_config(&self) -> BenchmarkConfig {
        BenchmarkConfig {
            rows: self.rows,
            cols: self.cols,
            eval_runs: self.eval_runs,
            parallel: ParallelConfig {
                workers: self.workers.unwrap_or_else(default_workers),
                threshold: self.threshold,
            },
            seed: self.seed,
        }
    }
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // RUST_LOG, when set, still wins over the flag.
    let _ = env_logger::Builder::new()
        .filter_module("rowpar", level)
        .parse_default_env()
        .try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    debug!("{cli:?}");

    let report = bench::run(&cli.benchmark_config())?;
    println!("{report}");

    Ok(())
}
