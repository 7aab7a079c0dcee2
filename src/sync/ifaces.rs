use crate::errors::BenchResult;

///
/// Single use rendezvous point for a fixed number of parties.
pub trait BarrierIface: Send + Sync {
    /// Register arrival and wait until every party has arrived.
    /// Fails if the barrier was poisoned before it released.
    fn arrive_and_wait(&self) -> BenchResult<()>;

    /// Release waiting parties with an error. Used when a party can't arrive.
    fn poison(&self);

    fn parties(&self) -> usize;

    fn arrived(&self) -> usize;
}
