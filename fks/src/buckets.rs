use rand::Rng;

use crate::universal::{SlotFunction, UniversalFamily};

/// Result of the first level of construction: keys partitioned by the primary function.
pub(crate) struct Buckets<K, H> {
    /// The first-level function, with range equal to the number of keys.
    pub primary: H,
    /// `buckets[i]` holds, in input order, the keys mapped to `i` by `primary`.
    pub buckets: Vec<Vec<K>>,
}

impl<K, H: SlotFunction<K>> Buckets<K, H> {
    /// Partitions non-empty `keys` into `keys.len()` buckets using a single function drawn from `family`.
    ///
    /// There are no retries at this level; the uneven sizes of the buckets are handled by the second level.
    pub fn split<F, R>(keys: Vec<K>, family: &F, rng: &mut R) -> Self
        where F: UniversalFamily<K, Function = H>, R: Rng
    {
        let n = keys.len();
        debug_assert!(n > 0);
        let primary = family.draw(n, rng);
        let mut buckets: Vec<Vec<K>> = (0..n).map(|_| Vec::new()).collect();
        for key in keys {
            buckets[primary.slot(&key)].push(key);
        }
        Self { primary, buckets }
    }
}
