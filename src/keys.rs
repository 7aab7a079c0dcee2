use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Deref;

use crate::table::Key;

/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 0;

/// Largest key generated, the range of a classic 31-bit `random()`.
pub const MAX_KEY: Key = i32::MAX as Key;

///
/// Immutable, seeded sequence of benchmark keys.
///
/// Generated once before any worker starts and only ever read afterwards,
/// so workers share it by reference without synchronization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeySet {
    seed: u64,
    keys: Box<[Key]>,
}

impl KeySet {
    ///
    /// Generate `count` keys from `seed`. The same seed always yields the
    /// same sequence.
    pub fn generate(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let keys = (0..count)
            .map(|_| rng.gen_range(0..=MAX_KEY))
            .collect::<Vec<Key>>()
            .into_boxed_slice();

        Self { seed, keys }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    ///
    /// Contiguous slice owned by worker `n` out of `nthread`.
    /// Caller must have checked that `nthread` divides the key count.
    pub fn slice_for(&self, n: usize, nthread: usize) -> &[Key] {
        let count = self.keys.len() / nthread;
        let start = n * count;
        &self.keys[start..start + count]
    }
}

impl Deref for KeySet {
    type Target = [Key];

    fn deref(&self) -> &[Key] {
        &self.keys
    }
}
