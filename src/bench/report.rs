use std::fmt;
use std::time::{Duration, Instant};

///
/// Outcome of one worker.
#[derive(Clone, Debug)]
pub struct WorkerReport {
    pub ordinal: usize,
    /// Time spent inserting this worker's slice.
    pub put_time: Duration,
    /// Time spent looking up the whole key set.
    pub lookup_time: Duration,
    /// Keys of the whole set that lookups didn't find.
    pub missing: usize,
    /// Taken right before arriving at the barrier.
    pub arrived_at: Instant,
    /// Taken right after the barrier released this worker.
    pub lookup_started: Instant,
}

impl fmt::Display for WorkerReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: put time = {:.6}",
            self.ordinal,
            self.put_time.as_secs_f64()
        )?;
        writeln!(
            f,
            "{}: lookup time = {:.6}",
            self.ordinal,
            self.lookup_time.as_secs_f64()
        )?;
        writeln!(f, "{}: {} keys missing", self.ordinal, self.missing)
    }
}

///
/// Outcome of a whole run, workers in ordinal order.
#[derive(Clone, Debug)]
pub struct BenchReport {
    pub workers: Vec<WorkerReport>,
    /// Wall clock from spawning the first worker to joining the last one.
    pub completion_time: Duration,
}

impl BenchReport {
    pub fn total_missing(&self) -> usize {
        self.workers.iter().map(|w| w.missing).sum()
    }

    pub fn max_missing(&self) -> usize {
        self.workers.iter().map(|w| w.missing).max().unwrap_or(0)
    }

    ///
    /// Whether every lookup phase started after the last barrier arrival.
    pub fn barrier_held(&self) -> bool {
        let last_arrival = self.workers.iter().map(|w| w.arrived_at).max();
        let first_lookup = self.workers.iter().map(|w| w.lookup_started).min();
        match (last_arrival, first_lookup) {
            (Some(a), Some(l)) => a <= l,
            _ => true,
        }
    }
}

impl fmt::Display for BenchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for w in self.workers.iter() {
            write!(f, "{}", w)?;
        }
        writeln!(
            f,
            "completion time = {:.6}",
            self.completion_time.as_secs_f64()
        )
    }
}
