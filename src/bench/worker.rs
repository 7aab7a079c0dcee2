use super::report::WorkerReport;
use crate::errors::BenchResult;
use crate::keys::KeySet;
use crate::sync::ifaces::BarrierIface;
use crate::table::chained::{ChainedTable, InsertMode};

use log::debug;
use std::time::Instant;

///
/// One benchmark worker: inserts its slice of the key set, waits for every
/// other worker at the barrier, then looks up the whole key set.
pub struct Worker<'a> {
    pub ordinal: usize,
    pub nthread: usize,
    pub table: &'a ChainedTable,
    pub keys: &'a KeySet,
    pub barrier: &'a dyn BarrierIface,
    pub insert_mode: InsertMode,
}

/// Poisons the barrier if dropped before the worker arrived at it.
struct ArrivalGuard<'a> {
    barrier: &'a dyn BarrierIface,
    armed: bool,
}

impl<'a> ArrivalGuard<'a> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl<'a> Drop for ArrivalGuard<'a> {
    fn drop(&mut self) {
        if self.armed {
            self.barrier.poison();
        }
    }
}

impl<'a> Worker<'a> {
    pub fn run(self) -> BenchResult<WorkerReport> {
        let n = self.ordinal;
        let slice = self.keys.slice_for(n, self.nthread);
        debug!("worker {}: inserting {} keys", n, slice.len());

        let arrival = ArrivalGuard {
            barrier: self.barrier,
            armed: true,
        };

        let t0 = Instant::now();
        for key in slice.iter() {
            self.table.insert(self.insert_mode, *key, n);
        }
        let put_time = t0.elapsed();

        let arrived_at = Instant::now();
        arrival.disarm();
        self.barrier.arrive_and_wait()?;

        let lookup_started = Instant::now();
        let missing = self
            .keys
            .iter()
            .filter(|key| self.table.get(**key).is_none())
            .count();
        let lookup_time = lookup_started.elapsed();
        debug!("worker {}: lookups done, {} keys missing", n, missing);

        Ok(WorkerReport {
            ordinal: n,
            put_time,
            lookup_time,
            missing,
            arrived_at,
            lookup_started,
        })
    }
}

#[cfg(test)]
mod worker_tests {
    use super::*;
    use crate::errors::BenchError;
    use crate::sync::barrier::{BarrierKind, SpinBarrier};
    use crossbeam_utils::thread;

    #[test]
    fn single_worker_finds_everything() {
        let table = ChainedTable::with_buckets(5);
        let keys = KeySet::generate(2_000, 0);
        let barrier = SpinBarrier::new(1);

        let report = Worker {
            ordinal: 0,
            nthread: 1,
            table: &table,
            keys: &keys,
            barrier: &barrier,
            insert_mode: InsertMode::Racy,
        }
        .run()
        .unwrap();

        assert_eq!(report.ordinal, 0);
        assert_eq!(report.missing, 0);
        assert!(report.arrived_at <= report.lookup_started);
        assert_eq!(table.allocated(), 2_000);
        assert!(keys.iter().all(|k| table.get(*k).map(|e| e.value()) == Some(0)));
    }

    #[test]
    fn unfinished_peer_reports_misses() {
        // Worker 1 of 2 runs alone, so only its half of the keys is in the table.
        let table = ChainedTable::with_buckets(3);
        let keys = KeySet::generate(1_000, 9);
        let barrier = SpinBarrier::new(1);

        let report = Worker {
            ordinal: 1,
            nthread: 2,
            table: &table,
            keys: &keys,
            barrier: &barrier,
            insert_mode: InsertMode::Locked,
        }
        .run()
        .unwrap();

        let expected = keys[..500]
            .iter()
            .filter(|k| !keys[500..].contains(*k))
            .count();
        assert_eq!(report.missing, expected);
        assert!(table.bucket_keys(0).iter().all(|k| k % 3 == 0));
    }

    fn peer_unwinding_before_arrival_fails(kind: BarrierKind) {
        let table = ChainedTable::with_buckets(5);
        let keys = KeySet::generate(1_000, 0);
        let barrier = kind.build(2);
        let barrier = &*barrier;

        let outcome = thread::scope(|s| {
            let survivor = s
                .builder()
                .name("t_0".into())
                .spawn(|_| {
                    Worker {
                        ordinal: 0,
                        nthread: 2,
                        table: &table,
                        keys: &keys,
                        barrier,
                        insert_mode: InsertMode::Racy,
                    }
                    .run()
                })
                .unwrap();

            // Worker 1 dies mid insert phase: its guard drops while still armed.
            s.builder()
                .name("t_1".into())
                .spawn(|_| {
                    let _arrival = ArrivalGuard {
                        barrier,
                        armed: true,
                    };
                })
                .unwrap()
                .join()
                .unwrap();

            survivor.join().unwrap()
        })
        .unwrap();

        assert!(matches!(outcome, Err(BenchError::BarrierPoisoned)));
        assert_eq!(barrier.arrived(), 1);
    }

    #[test]
    fn spin_peer_unwinding_poisons_barrier() {
        peer_unwinding_before_arrival_fails(BarrierKind::Spin);
    }

    #[test]
    fn blocking_peer_unwinding_poisons_barrier() {
        peer_unwinding_before_arrival_fails(BarrierKind::Blocking);
    }

    #[test]
    fn disarmed_guard_leaves_barrier_alone() {
        let barrier = SpinBarrier::new(1);
        ArrivalGuard {
            barrier: &barrier,
            armed: true,
        }
        .disarm();

        assert_eq!(barrier.arrive_and_wait(), Ok(()));
    }
}
