/// Spawns, times and joins the workers of a run.
pub mod driver;
/// Per worker and whole run timings.
pub mod report;
/// Insert-then-lookup worker task.
pub mod worker;

pub use driver::Benchmark;
pub use report::{BenchReport, WorkerReport};

use crate::errors::{BenchError, BenchResult};
use crate::keys::DEFAULT_SEED;
use crate::sync::barrier::BarrierKind;
use crate::table::chained::{InsertMode, DEFAULT_BUCKETS};

/// Key count used when none is given.
pub const DEFAULT_KEYS: usize = 100_000;

///
/// Parameters of one benchmark run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchConfig {
    pub nthread: usize,
    pub nbucket: usize,
    pub nkeys: usize,
    pub seed: u64,
    pub insert_mode: InsertMode,
    pub barrier: BarrierKind,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            nthread: 1,
            nbucket: DEFAULT_BUCKETS,
            nkeys: DEFAULT_KEYS,
            seed: DEFAULT_SEED,
            insert_mode: InsertMode::default(),
            barrier: BarrierKind::default(),
        }
    }
}

impl BenchConfig {
    pub fn with_threads(mut self, nthread: usize) -> Self {
        self.nthread = nthread;
        self
    }

    pub fn with_buckets(mut self, nbucket: usize) -> Self {
        self.nbucket = nbucket;
        self
    }

    pub fn with_keys(mut self, nkeys: usize) -> Self {
        self.nkeys = nkeys;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_insert_mode(mut self, insert_mode: InsertMode) -> Self {
        self.insert_mode = insert_mode;
        self
    }

    pub fn with_barrier(mut self, barrier: BarrierKind) -> Self {
        self.barrier = barrier;
        self
    }

    ///
    /// Reject configurations that can't run: no workers, no buckets, or a key
    /// count the workers can't split evenly.
    pub fn validate(&self) -> BenchResult<()> {
        if self.nthread == 0 {
            return Err(BenchError::NoWorkers);
        }
        if self.nbucket == 0 {
            return Err(BenchError::NoBuckets);
        }
        if self.nkeys % self.nthread != 0 {
            return Err(BenchError::UnevenSplit {
                keys: self.nkeys,
                nthread: self.nthread,
            });
        }
        Ok(())
    }
}
