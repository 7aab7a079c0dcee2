/// Ifaces for the phase barriers
pub mod ifaces;

/// Spin and blocking phase barriers
pub mod barrier;

///
/// Prelude for the synchronization primitives
pub mod prelude {
    pub use super::barrier::*;
    pub use super::ifaces::*;
}
