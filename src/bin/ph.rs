use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use phtable::prelude::*;

/// Concurrent bucketed hash table benchmark: every worker inserts its slice
/// of the key set, then looks up all of it.
#[derive(Parser, Debug)]
#[command(name = "ph", version, about)]
struct Args {
    /// Number of worker threads. Must evenly divide the key count.
    #[arg(value_name = "NTHREAD")]
    nthread: usize,

    /// Number of buckets in the table
    #[arg(long, default_value_t = DEFAULT_BUCKETS)]
    buckets: usize,

    /// Number of keys to insert and look up
    #[arg(long, default_value_t = DEFAULT_KEYS)]
    keys: usize,

    /// Seed of the key generator
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// Hold the bucket lock for the whole insert, so no insert is lost
    #[arg(long)]
    locked: bool,

    /// Park workers on a condvar between phases instead of spinning.
    /// Changes the timing characteristics of the run.
    #[arg(long)]
    blocking_barrier: bool,

    /// Print every bucket's chain after the run
    #[arg(long)]
    dump: bool,
}

impl Args {
    fn config(&self) -> BenchConfig {
        let insert_mode = if self.locked {
            InsertMode::Locked
        } else {
            InsertMode::Racy
        };
        let barrier = if self.blocking_barrier {
            BarrierKind::Blocking
        } else {
            BarrierKind::Spin
        };

        BenchConfig::default()
            .with_threads(self.nthread)
            .with_buckets(self.buckets)
            .with_keys(self.keys)
            .with_seed(self.seed)
            .with_insert_mode(insert_mode)
            .with_barrier(barrier)
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let bench = Benchmark::new(args.config()).context("invalid benchmark configuration")?;
    let report = bench.run().context("benchmark run failed")?;

    print!("{}", report);
    if args.dump {
        print!("{}", bench.table());
    }

    Ok(())
}
