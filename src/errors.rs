use std::result;
use thiserror::Error;

#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum BenchError {
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("bucket count must be at least 1")]
    NoBuckets,
    #[error("{nthread} workers can't split {keys} keys evenly")]
    UnevenSplit { keys: usize, nthread: usize },
    #[error("can't spawn worker {ordinal}: {reason}")]
    Spawn { ordinal: usize, reason: String },
    #[error("barrier poisoned by a failed worker")]
    BarrierPoisoned,
    #[error("workers {workers:?} panicked")]
    WorkerPanicked { workers: Vec<usize> },
}

pub type BenchResult<T> = result::Result<T, BenchError>;
