//! Bucketed concurrent hash table and the two phase throughput benchmark built on it.
//!
//! Workers insert an even slice of a seeded key set each, meet at a barrier,
//! then every worker looks up the whole key set and counts what it can't find.

/// Insert-then-lookup benchmark: configuration, workers, driver and reports
pub mod bench;
/// Error types of the benchmark
pub mod errors;
/// Seeded key set shared by all workers
pub mod keys;
/// Synchronization primitives used between benchmark phases
pub mod sync;
/// Bucketed hash table implementation
pub mod table;

pub use bench::{BenchConfig, BenchReport, Benchmark, WorkerReport};

///
/// Prelude of the benchmark and the table
pub mod prelude {
    pub use crate::bench::*;
    pub use crate::errors::*;
    pub use crate::keys::*;
    pub use crate::sync::prelude::*;
    pub use crate::table::prelude::*;
}
