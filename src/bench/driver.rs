use super::report::{BenchReport, WorkerReport};
use super::worker::Worker;
use super::BenchConfig;
use crate::errors::{BenchError, BenchResult};
use crate::keys::KeySet;
use crate::table::chained::ChainedTable;

use crossbeam_utils::thread;
use log::{info, warn};
use std::thread::Result as JoinResult;
use std::time::Instant;

///
/// Fold joined worker outcomes into their reports, in ordinal order.
///
/// A spawn failure wins over everything else, then panics (naming every
/// panicked ordinal), then the first error a worker returned. Peers of a
/// panicked worker typically return [BenchError::BarrierPoisoned], which the
/// panic report supersedes.
fn collect_outcomes(
    outcomes: Vec<JoinResult<BenchResult<WorkerReport>>>,
    spawn_failure: Option<BenchError>,
) -> BenchResult<Vec<WorkerReport>> {
    if let Some(e) = spawn_failure {
        return Err(e);
    }

    let mut workers: Vec<WorkerReport> = Vec::with_capacity(outcomes.len());
    let mut panicked = Vec::new();
    let mut failure = None;
    for (n, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(Ok(report)) => workers.push(report),
            Ok(Err(e)) => {
                failure.get_or_insert(e);
            }
            Err(_) => panicked.push(n),
        }
    }

    if !panicked.is_empty() {
        return Err(BenchError::WorkerPanicked { workers: panicked });
    }
    match failure {
        Some(e) => Err(e),
        None => Ok(workers),
    }
}

///
/// A validated benchmark: the table and key set a run works on.
///
/// Keys are generated once on construction. The table is filled by [Benchmark::run]
/// and stays around for inspection afterwards.
pub struct Benchmark {
    config: BenchConfig,
    table: ChainedTable,
    keys: KeySet,
}

impl Benchmark {
    ///
    /// Validate `config`, then build the table and generate the key set.
    /// Nothing is allocated for an invalid configuration.
    pub fn new(config: BenchConfig) -> BenchResult<Self> {
        config.validate()?;

        let table = ChainedTable::with_buckets(config.nbucket);
        let keys = KeySet::generate(config.nkeys, config.seed);

        Ok(Self {
            config,
            table,
            keys,
        })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn table(&self) -> &ChainedTable {
        &self.table
    }

    pub fn keys(&self) -> &KeySet {
        &self.keys
    }

    ///
    /// Spawn one worker per ordinal, join all of them and report.
    ///
    /// A panicking worker fails the whole run with [BenchError::WorkerPanicked].
    /// Meant to be called once per benchmark; a second run inserts every key again.
    pub fn run(&self) -> BenchResult<BenchReport> {
        let nthread = self.config.nthread;
        info!(
            "running {} workers over {} keys (seed {}) in {} buckets ({:?} inserts, {:?} barrier)",
            nthread,
            self.config.nkeys,
            self.keys.seed(),
            self.config.nbucket,
            self.config.insert_mode,
            self.config.barrier
        );

        let barrier = self.config.barrier.build(nthread);
        let barrier = &*barrier;

        let t0 = Instant::now();
        let (outcomes, spawn_failure) = thread::scope(|s| {
            let mut handles = Vec::with_capacity(nthread);
            let mut spawn_failure = None;
            for n in 0..nthread {
                let worker = Worker {
                    ordinal: n,
                    nthread,
                    table: &self.table,
                    keys: &self.keys,
                    barrier,
                    insert_mode: self.config.insert_mode,
                };

                let spawned = s
                    .builder()
                    .name(format!("ph_worker_{}", n))
                    .spawn(move |_| worker.run());
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        // Workers already spawned would spin forever otherwise.
                        barrier.poison();
                        spawn_failure = Some(BenchError::Spawn {
                            ordinal: n,
                            reason: e.to_string(),
                        });
                        break;
                    }
                }
            }

            let outcomes = handles
                .into_iter()
                .map(|h| h.join())
                .collect::<Vec<_>>();
            (outcomes, spawn_failure)
        })
        .map_err(|_| BenchError::WorkerPanicked {
            workers: Vec::new(),
        })?;
        let completion_time = t0.elapsed();

        let workers = collect_outcomes(outcomes, spawn_failure)?;

        let report = BenchReport {
            workers,
            completion_time,
        };
        if report.total_missing() > 0 {
            warn!(
                "lookups missed keys ({} worst case per worker), inserts were lost to racing puts",
                report.max_missing()
            );
        }

        Ok(report)
    }
}

#[cfg(test)]
mod driver_tests {
    use super::*;
    use crate::sync::barrier::BarrierKind;
    use crate::table::chained::InsertMode;
    use std::time::Duration;

    fn report(ordinal: usize) -> WorkerReport {
        let now = Instant::now();
        WorkerReport {
            ordinal,
            put_time: Duration::from_millis(1),
            lookup_time: Duration::from_millis(1),
            missing: 0,
            arrived_at: now,
            lookup_started: now,
        }
    }

    fn panicked() -> JoinResult<BenchResult<WorkerReport>> {
        Err(Box::new("worker 1 blew up"))
    }

    #[test]
    fn panicked_worker_named_in_error() {
        let outcomes = vec![
            Ok(Ok(report(0))),
            panicked(),
            Ok(Err(BenchError::BarrierPoisoned)),
        ];

        assert_eq!(
            collect_outcomes(outcomes, None).err(),
            Some(BenchError::WorkerPanicked { workers: vec![1] })
        );
    }

    #[test]
    fn every_panicked_worker_named() {
        let outcomes = vec![panicked(), Ok(Ok(report(1))), panicked(), panicked()];

        assert_eq!(
            collect_outcomes(outcomes, None).err(),
            Some(BenchError::WorkerPanicked {
                workers: vec![0, 2, 3]
            })
        );
    }

    #[test]
    fn spawn_failure_reported_first() {
        let spawn = BenchError::Spawn {
            ordinal: 2,
            reason: "out of threads".into(),
        };
        let outcomes = vec![Ok(Err(BenchError::BarrierPoisoned)), panicked()];

        assert_eq!(
            collect_outcomes(outcomes, Some(spawn.clone())).err(),
            Some(spawn)
        );
    }

    #[test]
    fn worker_error_without_panic_passes_through() {
        let outcomes = vec![Ok(Ok(report(0))), Ok(Err(BenchError::BarrierPoisoned))];

        assert_eq!(
            collect_outcomes(outcomes, None).err(),
            Some(BenchError::BarrierPoisoned)
        );
    }

    #[test]
    fn clean_outcomes_keep_ordinal_order() {
        let outcomes = vec![Ok(Ok(report(0))), Ok(Ok(report(1)))];
        let workers = collect_outcomes(outcomes, None).unwrap();

        let ordinals: Vec<usize> = workers.iter().map(|w| w.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1]);
    }

    #[test]
    fn invalid_config_builds_nothing() {
        let config = BenchConfig::default().with_threads(7);
        assert!(matches!(
            Benchmark::new(config),
            Err(BenchError::UnevenSplit { nthread: 7, .. })
        ));
    }

    #[test]
    fn one_worker_run() {
        let bench = Benchmark::new(BenchConfig::default().with_keys(5_000)).unwrap();
        let report = bench.run().unwrap();

        assert_eq!(report.workers.len(), 1);
        assert_eq!(report.total_missing(), 0);
        assert!(bench.table().is_sorted());
        assert_eq!(bench.table().len(), 5_000);
        assert!(report.completion_time >= report.workers[0].put_time);
    }

    #[test]
    fn locked_blocking_run() {
        let config = BenchConfig::default()
            .with_threads(4)
            .with_keys(8_000)
            .with_buckets(3)
            .with_insert_mode(InsertMode::Locked)
            .with_barrier(BarrierKind::Blocking);
        let bench = Benchmark::new(config).unwrap();
        let report = bench.run().unwrap();

        let ordinals: Vec<usize> = report.workers.iter().map(|w| w.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3]);
        assert_eq!(report.total_missing(), 0);
        assert!(report.barrier_held());
        assert_eq!(bench.table().len(), 8_000);
    }
}
