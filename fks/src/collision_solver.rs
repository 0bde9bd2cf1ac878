use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, trace, warn};

use crate::conf::DuplicatePolicy;
use crate::error::BuildError;
use crate::stats::BuildStatsCollector;
use crate::table::Row;
use crate::universal::{SlotFunction, UniversalFamily};

/// Finds, for buckets of more than one key, second-level functions that place the keys without collisions.
///
/// Holds the state shared by all buckets of a single construction.
pub(crate) struct CollisionSolver<'f, F, R> {
    family: &'f F,
    rng: R,
    max_attempts: u32,
    duplicates: DuplicatePolicy,
    /// Occupancy of the slots, reused by successive attempts.
    occupied: Vec<bool>,
    /// Slots assigned to the keys of the bucket by the current attempt.
    key_slots: Vec<usize>,
}

/// Returns whether `bucket` contains structurally equal keys.
fn contains_duplicates<K: Ord>(bucket: &[K]) -> bool {
    let mut seen = BTreeSet::new();
    !bucket.iter().all(|k| seen.insert(k))
}

impl<'f, F, R: Rng> CollisionSolver<'f, F, R> {
    pub fn new(family: &'f F, rng: R, max_attempts: u32, duplicates: DuplicatePolicy) -> Self {
        Self { family, rng, max_attempts, duplicates, occupied: Vec::new(), key_slots: Vec::new() }
    }

    /// Tries to place all keys of `bucket` by `h`.
    /// On success, the slots of the keys are in `self.key_slots`.
    /// Returns `false` on the first collision.
    fn try_place<K, H: SlotFunction<K>>(&mut self, bucket: &[K], h: &H) -> bool {
        self.occupied.clear();
        self.occupied.resize(h.range(), false);
        self.key_slots.clear();
        for key in bucket {
            let slot = h.slot(key);
            if self.occupied[slot] { return false; }
            self.occupied[slot] = true;
            self.key_slots.push(slot);
        }
        true
    }

    /// Builds a row for the `bucket` (of at least two keys) of the given `index`.
    ///
    /// Draws functions with range equal to the squared size of the bucket until one of them places the keys
    /// in distinct slots. If a collision is observed in a bucket with duplicates, the bucket is either
    /// packed by the current function or rejected, according to the duplicate policy.
    pub fn solve<K, BS>(&mut self, index: usize, bucket: Vec<K>, stats: &mut BS) -> Result<Row<K, F::Function>, BuildError>
        where K: Ord, F: UniversalFamily<K>, BS: BuildStatsCollector
    {
        let size = bucket.len();
        debug_assert!(size > 1);
        let range = size.checked_mul(size).ok_or(BuildError::BucketTooLarge { bucket: index, bucket_size: size })?;
        let mut has_duplicates = None;
        for attempt in 1..=self.max_attempts {
            let h = self.family.draw(range, &mut self.rng);
            stats.draw(index, size);
            if self.try_place(&bucket, &h) {
                debug!(bucket = index, size, attempts = attempt, "bucket resolved");
                let mut slots: Vec<Option<K>> = (0..range).map(|_| None).collect();
                for (key, slot) in bucket.into_iter().zip(self.key_slots.iter()) {
                    slots[*slot] = Some(key);
                }
                return Ok(Row::resolved(slots.into_boxed_slice(), h));
            }
            if *has_duplicates.get_or_insert_with(|| contains_duplicates(&bucket)) {
                return match self.duplicates {
                    DuplicatePolicy::Reject => Err(BuildError::DuplicateKeys { bucket: index }),
                    DuplicatePolicy::Pack => Ok(Self::pack(index, bucket, h, stats))
                };
            }
            trace!(bucket = index, size, attempt, "collision, drawing another function");
        }
        Err(BuildError::InternalHashingFailure { bucket: index, bucket_size: size, attempts: self.max_attempts })
    }

    /// Builds a row of `bucket.len()²` slots for a bucket with duplicates.
    ///
    /// The first occurrences of the distinct keys, ordered by their slots under `h` (ties in input order),
    /// occupy the beginning of the row and the repeated occurrences follow them in input order.
    fn pack<K, BS>(index: usize, bucket: Vec<K>, h: F::Function, stats: &mut BS) -> Row<K, F::Function>
        where K: Ord, F: UniversalFamily<K>, BS: BuildStatsCollector
    {
        let size = bucket.len();
        let first_occurrence: Vec<bool> = {
            let mut seen = BTreeSet::new();
            bucket.iter().map(|k| seen.insert(k)).collect()
        };
        let mut distinct = Vec::with_capacity(size);
        let mut copies = Vec::new();
        for (key, first) in bucket.into_iter().zip(first_occurrence) {
            if first { distinct.push(key) } else { copies.push(key) }
        }
        distinct.sort_by_key(|k| h.slot(k));
        warn!(bucket = index, size, distinct = distinct.len(), "bucket contains duplicate keys, packing it");
        stats.packed(index, size, distinct.len());
        let mut slots: Vec<Option<K>> = distinct.into_iter().chain(copies).map(Some).collect();
        slots.resize_with(size * size, || None);
        Row::packed(slots.into_boxed_slice(), h)
    }
}
