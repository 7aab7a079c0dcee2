/// Bucketed hash table of sorted chains with per-bucket locks and lock free lookups.
pub mod chained;

pub use chained::{Key, Value};

/// Prelude for the bucketed table
pub mod prelude {
    pub use super::chained::*;
}
