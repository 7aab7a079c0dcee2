use crossbeam_epoch::{self as epoch, Atomic, Guard, Owned, Shared};
use itertools::Itertools;
use parking_lot::Mutex;

use std::fmt;
use std::sync::atomic::Ordering;

/// Key type stored in the table.
pub type Key = u32;
/// Value type stored in the table. The benchmark stores the inserting worker's ordinal.
pub type Value = usize;

/// Bucket count used when none is given.
pub const DEFAULT_BUCKETS: usize = 5;

///
/// How [ChainedTable] publishes new entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertMode {
    /// Walk the chain without the bucket lock, lock only around the pointer write.
    /// Two puts racing on the same link can lose one of the entries.
    Racy,
    /// Hold the bucket lock for the walk and the pointer write. No insert is lost.
    Locked,
}

impl Default for InsertMode {
    fn default() -> Self {
        InsertMode::Racy
    }
}

///
/// Chain link of a bucket. Fully built before it is published and never
/// mutated afterwards except for its `next` link.
pub struct Entry {
    key: Key,
    value: Value,
    next: Atomic<Entry>,
}

impl Entry {
    #[inline]
    pub fn key(&self) -> Key {
        self.key
    }

    #[inline]
    pub fn value(&self) -> Value {
        self.value
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("value", &self.value)
            .finish()
    }
}

struct Bucket {
    head: Atomic<Entry>,
    // Every entry ever allocated for this bucket. Holding it is what
    // serializes publishes into this bucket.
    arena: Mutex<Vec<Atomic<Entry>>>,
}

impl Default for Bucket {
    fn default() -> Self {
        Bucket {
            head: Atomic::null(),
            arena: Mutex::new(Vec::new()),
        }
    }
}

///
/// Fixed size hash table of sorted, singly linked chains with one lock per bucket.
///
/// Lookups never take a lock. There is no removal and no resizing; entries
/// live until the table is dropped.
pub struct ChainedTable {
    buckets: Box<[Bucket]>,
}

impl ChainedTable {
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }

    ///
    /// Panics if `nbucket` is zero.
    pub fn with_buckets(nbucket: usize) -> Self {
        assert!(nbucket > 0, "table needs at least one bucket");
        Self {
            buckets: (0..nbucket).map(|_| Bucket::default()).collect(),
        }
    }

    #[inline]
    pub fn nbucket(&self) -> usize {
        self.buckets.len()
    }

    ///
    /// Bucket a key routes to, `key mod nbucket`.
    #[inline]
    pub fn bucket_of(&self, key: Key) -> usize {
        key as usize % self.buckets.len()
    }

    #[inline]
    fn guard() -> &'static Guard {
        // SAFETY: entries are only freed in `Drop`, which has exclusive access
        // to the table, so no pointer loaded through `&self` can dangle.
        unsafe { epoch::unprotected() }
    }

    ///
    /// Find the link a new `key` goes into: the first link whose target has a
    /// key strictly greater than `key`, or the tail link. Returns the link and
    /// its current target.
    #[inline]
    fn seek<'g>(
        bucket: &'g Bucket,
        key: Key,
        guard: &'g Guard,
    ) -> (&'g Atomic<Entry>, Shared<'g, Entry>) {
        let mut link = &bucket.head;
        let mut curr = link.load(Ordering::Acquire, guard);
        // SAFETY: see `guard`.
        while let Some(entry) = unsafe { curr.as_ref() } {
            if entry.key > key {
                break;
            }
            link = &entry.next;
            curr = link.load(Ordering::Acquire, guard);
        }
        (link, curr)
    }

    #[inline]
    fn publish<'g>(
        arena: &mut Vec<Atomic<Entry>>,
        link: &Atomic<Entry>,
        entry: Owned<Entry>,
        guard: &'g Guard,
    ) {
        let entry = entry.into_shared(guard);
        link.store(entry, Ordering::Release);
        arena.push(Atomic::from(entry));
    }

    ///
    /// Insert `key` keeping the chain sorted. The insertion point is found
    /// without the bucket lock; only the final pointer write is locked. A
    /// concurrent put that links into the same spot can be silently lost.
    pub fn put(&self, key: Key, value: Value) {
        let bucket = &self.buckets[self.bucket_of(key)];
        let guard = Self::guard();

        let (link, succ) = Self::seek(bucket, key, guard);
        let entry = Owned::new(Entry {
            key,
            value,
            next: Atomic::from(succ),
        });

        let mut arena = bucket.arena.lock();
        Self::publish(&mut arena, link, entry, guard);
    }

    ///
    /// Insert `key` keeping the chain sorted, holding the bucket lock for the
    /// whole walk. Never loses an insert.
    pub fn put_locked(&self, key: Key, value: Value) {
        let bucket = &self.buckets[self.bucket_of(key)];
        let guard = Self::guard();

        let mut arena = bucket.arena.lock();
        let (link, succ) = Self::seek(bucket, key, guard);
        let entry = Owned::new(Entry {
            key,
            value,
            next: Atomic::from(succ),
        });
        Self::publish(&mut arena, link, entry, guard);
    }

    #[inline]
    pub fn insert(&self, mode: InsertMode, key: Key, value: Value) {
        match mode {
            InsertMode::Racy => self.put(key, value),
            InsertMode::Locked => self.put_locked(key, value),
        }
    }

    ///
    /// First entry with `key` in its bucket's chain. Lock free; an entry being
    /// linked concurrently may or may not be seen.
    pub fn get(&self, key: Key) -> Option<&Entry> {
        self.chain(self.bucket_of(key)).find(|e| e.key == key)
    }

    #[inline]
    pub fn contains_key(&self, key: Key) -> bool {
        self.get(key).is_some()
    }

    fn chain(&self, bucket: usize) -> Chain<'_> {
        Chain {
            curr: self.buckets[bucket]
                .head
                .load(Ordering::Acquire, Self::guard()),
        }
    }

    ///
    /// Keys reachable from bucket `bucket`, in chain order.
    pub fn bucket_keys(&self, bucket: usize) -> Vec<Key> {
        self.chain(bucket).map(Entry::key).collect()
    }

    pub fn chain_len(&self, bucket: usize) -> usize {
        self.chain(bucket).count()
    }

    ///
    /// Number of reachable entries. Entries lost to racing puts are not counted.
    pub fn len(&self) -> usize {
        (0..self.nbucket()).map(|b| self.chain_len(b)).sum()
    }

    pub fn is_empty(&self) -> bool {
        (0..self.nbucket()).all(|b| self.chain(b).next().is_none())
    }

    ///
    /// Number of entries allocated, reachable or not.
    pub fn allocated(&self) -> usize {
        self.buckets.iter().map(|b| b.arena.lock().len()).sum()
    }

    ///
    /// Whether every chain is in non-decreasing key order.
    pub fn is_sorted(&self) -> bool {
        (0..self.nbucket()).all(|b| {
            self.chain(b)
                .tuple_windows()
                .all(|(a, z): (&Entry, &Entry)| a.key <= z.key)
        })
    }
}

impl Default for ChainedTable {
    fn default() -> Self {
        Self::new()
    }
}

struct Chain<'t> {
    curr: Shared<'t, Entry>,
}

impl<'t> Iterator for Chain<'t> {
    type Item = &'t Entry;

    fn next(&mut self) -> Option<&'t Entry> {
        // SAFETY: see `ChainedTable::guard`.
        let entry = unsafe { self.curr.as_ref() }?;
        self.curr = entry.next.load(Ordering::Acquire, ChainedTable::guard());
        Some(entry)
    }
}

impl Drop for ChainedTable {
    fn drop(&mut self) {
        for bucket in self.buckets.iter_mut() {
            for entry in bucket.arena.get_mut().drain(..) {
                // SAFETY: each arena slot owns a distinct allocation and nothing
                // else can reach the table anymore.
                drop(unsafe { entry.into_owned() });
            }
        }
    }
}

impl fmt::Display for ChainedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in 0..self.nbucket() {
            write!(f, "{}: ", b)?;
            for entry in self.chain(b) {
                write!(f, "{} ", entry.key)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ChainedTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainedTable")
            .field("nbucket", &self.nbucket())
            .field("len", &self.len())
            .finish()
    }
}
