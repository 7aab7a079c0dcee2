use super::ifaces::BarrierIface;
use crate::errors::{BenchError, BenchResult};

use crossbeam_utils::CachePadded;
use parking_lot::{Condvar, Mutex};

use std::fmt;
use std::hint::spin_loop;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

///
/// Which barrier separates the insert and lookup phases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarrierKind {
    /// Busy polls a shared counter. Burns CPU while waiting.
    Spin,
    /// Parks waiters on a condition variable. Changes the timing profile of
    /// the run, waiters are woken by the scheduler instead of spinning.
    Blocking,
}

impl Default for BarrierKind {
    fn default() -> Self {
        BarrierKind::Spin
    }
}

impl BarrierKind {
    pub fn build(self, parties: usize) -> Box<dyn BarrierIface> {
        match self {
            BarrierKind::Spin => Box::new(SpinBarrier::new(parties)),
            BarrierKind::Blocking => Box::new(BlockingBarrier::new(parties)),
        }
    }
}

///
/// Counter barrier: every party increments `done` once, then spins until it
/// reads `parties`. Never reset, one use per run.
pub struct SpinBarrier {
    parties: usize,
    done: CachePadded<AtomicUsize>,
    poisoned: AtomicBool,
}

impl SpinBarrier {
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            done: CachePadded::new(AtomicUsize::new(0)),
            poisoned: AtomicBool::new(false),
        }
    }
}

impl BarrierIface for SpinBarrier {
    #[inline]
    fn arrive_and_wait(&self) -> BenchResult<()> {
        let arrived = self.done.fetch_add(1, Ordering::AcqRel) + 1;
        log::trace!("spin barrier arrival {}/{}", arrived, self.parties);

        while self.done.load(Ordering::Acquire) < self.parties {
            if self.poisoned.load(Ordering::Acquire) {
                return Err(BenchError::BarrierPoisoned);
            }
            spin_loop();
        }
        Ok(())
    }

    fn poison(&self) {
        self.poisoned.store(true, Ordering::Release);
    }

    #[inline]
    fn parties(&self) -> usize {
        self.parties
    }

    #[inline]
    fn arrived(&self) -> usize {
        self.done.load(Ordering::Acquire)
    }
}

impl fmt::Debug for SpinBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpinBarrier")
            .field("parties", &self.parties)
            .field("done", &self.arrived())
            .finish()
    }
}

#[derive(Default)]
struct BlockingState {
    arrived: usize,
    poisoned: bool,
}

///
/// Mutex and condvar barrier with the same single use semantics as [SpinBarrier].
pub struct BlockingBarrier {
    parties: usize,
    state: Mutex<BlockingState>,
    cvar: Condvar,
}

impl BlockingBarrier {
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            state: Mutex::new(BlockingState::default()),
            cvar: Condvar::new(),
        }
    }
}

impl BarrierIface for BlockingBarrier {
    fn arrive_and_wait(&self) -> BenchResult<()> {
        let mut state = self.state.lock();
        state.arrived += 1;
        log::trace!("blocking barrier arrival {}/{}", state.arrived, self.parties);

        if state.arrived >= self.parties {
            self.cvar.notify_all();
            return Ok(());
        }

        while state.arrived < self.parties && !state.poisoned {
            self.cvar.wait(&mut state);
        }

        if state.arrived >= self.parties {
            Ok(())
        } else {
            Err(BenchError::BarrierPoisoned)
        }
    }

    fn poison(&self) {
        self.state.lock().poisoned = true;
        self.cvar.notify_all();
    }

    #[inline]
    fn parties(&self) -> usize {
        self.parties
    }

    fn arrived(&self) -> usize {
        self.state.lock().arrived
    }
}

impl fmt::Debug for BlockingBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingBarrier")
            .field("parties", &self.parties)
            .field("arrived", &self.arrived())
            .finish()
    }
}
