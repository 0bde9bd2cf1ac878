use std::fmt::{self, Display, Formatter};

use dyn_size_of::GetSize;
use tracing::debug;

use crate::buckets::Buckets;
use crate::collision_solver::CollisionSolver;
use crate::conf::BuildConf;
use crate::error::{BuildError, NotFound};
use crate::key::HashWords;
use crate::stats::{AccessStatsCollector, BuildStatsCollector};
use crate::universal::{PolynomialFunction, SlotFunction, UniversalFamily};

/// Position of a key in a [`PerfectHashTable`]: the index of the row and the index of the slot in this row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    pub row: usize,
    pub slot: usize,
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][{}]", self.row, self.slot)
    }
}

/// Second level of a [`PerfectHashTable`]: the slots of a non-empty first-level bucket.
///
/// A bucket of a single key gives a row of one slot without a hash function.
/// A bucket of `n > 1` keys gives a row of `n²` slots and the function that placed the keys in them.
#[derive(Clone, Debug)]
pub struct Row<K, H> {
    slots: Box<[Option<K>]>,
    hash_function: Option<H>,
    packed: bool,
}

impl<K, H> Row<K, H> {
    pub(crate) fn singleton(key: K) -> Self {
        Self { slots: Box::new([Some(key)]), hash_function: None, packed: false }
    }

    pub(crate) fn resolved(slots: Box<[Option<K>]>, hash_function: H) -> Self {
        Self { slots, hash_function: Some(hash_function), packed: false }
    }

    pub(crate) fn packed(slots: Box<[Option<K>]>, hash_function: H) -> Self {
        Self { slots, hash_function: Some(hash_function), packed: true }
    }

    /// Returns the slots of the row.
    #[inline] pub fn slots(&self) -> &[Option<K>] { &self.slots }

    /// Returns the number of slots.
    #[inline] pub fn len(&self) -> usize { self.slots.len() }

    /// Returns the function that placed the keys in the slots, or [`None`] for a row of a single key.
    #[inline] pub fn hash_function(&self) -> Option<&H> { self.hash_function.as_ref() }

    /// Returns whether the row was built for a bucket with duplicate keys.
    ///
    /// Keys of such rows are not necessarily placed in the slots given by the hash function.
    #[inline] pub fn is_packed(&self) -> bool { self.packed }

    /// Returns the number of occupied slots.
    pub fn number_of_hashed_keys(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns the slot of `key` and reports the number of comparisons to `access_stats`.
    fn find_stats<A: AccessStatsCollector>(&self, key: &K, access_stats: &mut A) -> Option<usize>
        where K: PartialEq, H: SlotFunction<K>
    {
        let Some(h) = &self.hash_function else {
            return if self.slots[0].as_ref() == Some(key) {
                access_stats.found(1);
                Some(0)
            } else {
                access_stats.not_found(1);
                None
            };
        };
        let slot = h.slot(key);
        if self.slots[slot].as_ref() == Some(key) {
            access_stats.found(1);
            return Some(slot);
        }
        if self.packed {
            // duplicates are placed regardless of h, so only a scan finds them
            if let Some(slot) = self.slots.iter().position(|s| s.as_ref() == Some(key)) {
                access_stats.found(2 + slot);
                return Some(slot);
            }
            access_stats.not_found(1 + self.slots.len());
            return None;
        }
        access_stats.not_found(1);
        None
    }
}

impl<K: GetSize, H: GetSize> GetSize for Row<K, H> {
    fn size_bytes_dyn(&self) -> usize {
        let option_overhead = std::mem::size_of::<Option<K>>() - std::mem::size_of::<K>();
        self.slots.iter().map(|s| match s {
            Some(k) => k.size_bytes() + option_overhead,
            None => std::mem::size_of::<Option<K>>()
        }).sum::<usize>() + self.hash_function.as_ref().map_or(0, GetSize::size_bytes_dyn)
    }
    const USES_DYN_MEM: bool = true;
}

impl<K: Display, H: Display> Display for Row<K, H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(h) = &self.hash_function {
            writeln!(f, " - hash function: {}", h)?;
        }
        writeln!(f, " - memory to save : {} cells", self.slots.len())?;
        write!(f, " - where saved data:")?;
        for (i, key) in self.slots.iter().enumerate() {
            if let Some(key) = key {
                write!(f, "\n    _{}_ = {}", i, key)?;
            }
        }
        Ok(())
    }
}

/// Static two-level (FKS) perfect hash table.
///
/// The primary function maps each key to one of `n` rows, where `n` is the number of keys given during construction.
/// Each row places its keys in distinct slots with its own function, drawn from a universal family
/// with range equal to the squared number of the keys of the row.
/// The expected total number of slots is below `2n`.
///
/// The table cannot be modified after construction and can be queried concurrently.
///
/// See: M. L. Fredman, J. Komlós, E. Szemerédi, *Storing a Sparse Table with O(1) Worst Case Access Time*,
/// Journal of the ACM, 1984, <https://doi.org/10.1145/828.1884>
#[derive(Clone, Debug)]
pub struct PerfectHashTable<K, H = PolynomialFunction> {
    rows: Box<[Option<Row<K, H>>]>,
    primary: H,
    len: usize,
}

impl<K: Ord, H> PerfectHashTable<K, H> {
    /// Builds [`PerfectHashTable`] for given `keys`, using the build configuration `conf` and reporting statistics with `stats`.
    pub fn with_conf_stats<F, BS>(keys: Vec<K>, conf: BuildConf<F>, stats: &mut BS) -> Result<Self, BuildError>
        where F: UniversalFamily<K, Function = H>, H: SlotFunction<K>, BS: BuildStatsCollector
    {
        if keys.is_empty() { return Err(BuildError::EmptyInput); }
        let len = keys.len();
        let mut rng = conf.rng();
        let Buckets { primary, buckets } = Buckets::split(keys, &conf.family, &mut rng);
        let mut solver = CollisionSolver::new(&conf.family, rng, conf.max_attempts, conf.duplicates);
        let mut rows = Vec::with_capacity(buckets.len());
        let mut slots = 0;
        for (index, mut bucket) in buckets.into_iter().enumerate() {
            stats.bucket(index, bucket.len());
            let row = match bucket.len() {
                0 => None,
                1 => bucket.pop().map(Row::singleton),
                _ => Some(solver.solve(index, bucket, stats)?)
            };
            slots += row.as_ref().map_or(0, Row::len);
            rows.push(row);
        }
        debug!(keys = len, rows = rows.len(), slots, "perfect hash table built");
        stats.end(rows.len(), slots);
        Ok(Self { rows: rows.into_boxed_slice(), primary, len })
    }

    /// Builds [`PerfectHashTable`] for given `keys`, using the build configuration `conf`.
    #[inline] pub fn with_conf<F>(keys: Vec<K>, conf: BuildConf<F>) -> Result<Self, BuildError>
        where F: UniversalFamily<K, Function = H>, H: SlotFunction<K>
    {
        Self::with_conf_stats(keys, conf, &mut ())
    }
}

impl<K: Ord + HashWords> PerfectHashTable<K> {
    /// Builds [`PerfectHashTable`] for given `keys`, reporting statistics with `stats`.
    pub fn with_stats<BS: BuildStatsCollector>(keys: Vec<K>, stats: &mut BS) -> Result<Self, BuildError> {
        Self::with_conf_stats(keys, BuildConf::default(), stats)
    }

    /// Builds [`PerfectHashTable`] for given `keys`.
    ///
    /// Fails with [`BuildError::EmptyInput`] if `keys` is empty.
    /// Duplicate keys are accepted (see [`DuplicatePolicy::Pack`](crate::DuplicatePolicy::Pack)).
    pub fn new(keys: Vec<K>) -> Result<Self, BuildError> {
        Self::with_conf_stats(keys, BuildConf::default(), &mut ())
    }
}

impl<K: PartialEq, H: SlotFunction<K>> PerfectHashTable<K, H> {
    /// Returns the address of `key` and reports the number of comparisons to `access_stats`.
    ///
    /// Fails with [`NotFound`] if `key` was not in the collection given during construction.
    pub fn find_stats<A: AccessStatsCollector>(&self, key: &K, access_stats: &mut A) -> Result<Address, NotFound> {
        let row_index = self.primary.slot(key);
        let Some(row) = &self.rows[row_index] else {
            access_stats.not_found(0);
            return Err(NotFound);
        };
        row.find_stats(key, access_stats)
            .map(|slot| Address { row: row_index, slot })
            .ok_or(NotFound)
    }

    /// Returns the address of `key`.
    ///
    /// Fails with [`NotFound`] if `key` was not in the collection given during construction.
    /// It takes constant time, except for rows of buckets with duplicates
    /// (see [`Row::is_packed`]), which are scanned if the key is not at the slot given by their function.
    #[inline] pub fn find(&self, key: &K) -> Result<Address, NotFound> {
        self.find_stats(key, &mut ())
    }

    /// Returns whether `key` was in the collection given during construction.
    #[inline] pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_ok()
    }
}

impl<K, H> PerfectHashTable<K, H> {
    /// Returns the number of keys (including repeated occurrences) given during construction.
    #[inline] pub fn len(&self) -> usize { self.len }

    /// Returns the number of rows, which equals to [`len`](PerfectHashTable::len).
    #[inline] pub fn rows_len(&self) -> usize { self.rows.len() }

    /// Returns the row with given `index`, or [`None`] if the row is empty.
    #[inline] pub fn row(&self, index: usize) -> Option<&Row<K, H>> {
        self.rows.get(index)?.as_ref()
    }

    /// Returns an iterator over all rows, with [`None`] for empty rows.
    pub fn rows(&self) -> impl Iterator<Item = Option<&Row<K, H>>> {
        self.rows.iter().map(Option::as_ref)
    }

    /// Returns the first-level function.
    #[inline] pub fn primary(&self) -> &H { &self.primary }

    /// Returns the total number of slots in all rows.
    pub fn slots_len(&self) -> usize {
        self.rows().flatten().map(Row::len).sum()
    }

    /// Returns the key stored at given `address`, if any.
    pub fn get(&self, address: Address) -> Option<&K> {
        self.row(address.row)?.slots.get(address.slot)?.as_ref()
    }
}

impl<K: GetSize, H: GetSize> GetSize for PerfectHashTable<K, H> {
    fn size_bytes_dyn(&self) -> usize {
        self.rows.iter().map(|r| match r {
            Some(row) => row.size_bytes(),
            None => std::mem::size_of::<Option<Row<K, H>>>()
        }).sum::<usize>() + self.primary.size_bytes_dyn()
    }
    const USES_DYN_MEM: bool = true;
}

impl<K: Display, H: Display> Display for PerfectHashTable<K, H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "*** Look up table for {} rows ***", self.rows.len())?;
        for (i, row) in self.rows().enumerate() {
            write!(f, "ROW #{}", i)?;
            match row {
                None => write!(f, " - [empty]")?,
                Some(row) if row.hash_function.is_none() => {
                    if let Some(key) = &row.slots[0] { write!(f, " - {}", key)?; }
                }
                Some(row) => write!(f, "\n{}", row)?
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::conf::DuplicatePolicy;
    use crate::key::{Complex, Vector};
    use crate::stats::BuildStats;
    use crate::universal::{Seeded, SeededFunction, SlotRange};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    /// Checks that each key of the distinct `keys` is placed by the function of `row` in its own slot.
    pub fn check_row<K: Ord + std::fmt::Debug, H: SlotFunction<K>>(row: &Row<K, H>, keys: &[K]) {
        let h = row.hash_function().expect("resolved row has a function");
        assert_eq!(h.range(), row.len());
        let mut seen = BTreeSet::new();
        for k in keys {
            let slot = h.slot(k);
            assert!(seen.insert(slot), "two keys of the row are mapped to slot {}", slot);
            assert_eq!(row.slots()[slot].as_ref(), Some(k));
        }
        assert_eq!(row.number_of_hashed_keys(), keys.len());
    }

    /// Checks completeness, uniqueness of addresses and sizes of the rows of the table built for distinct `keys`.
    pub fn test_table<K: Ord + Clone + std::fmt::Debug, H: SlotFunction<K>>(table: &PerfectHashTable<K, H>, keys: &[K]) {
        assert_eq!(table.len(), keys.len());
        assert_eq!(table.rows_len(), keys.len());
        let mut seen = BTreeSet::new();
        for k in keys {
            let address = table.find(k).unwrap_or_else(|_| panic!("key {:?} is in the input, but it is not found", k));
            assert!(seen.insert(address), "table assigns {} to {:?} and some other key included in the input", address, k);
            assert_eq!(table.get(address), Some(k));
            assert_eq!(table.find(k), Ok(address));
        }
        let mut stored = 0;
        for row in table.rows().flatten() {
            let n = row.number_of_hashed_keys();
            stored += n;
            if n > 1 { assert_eq!(row.len(), n * n); } else { assert_eq!(row.len(), 1); }
        }
        assert_eq!(stored, keys.len());
    }

    #[test]
    fn test_single_key() {
        let key = Vector::from(Complex::from_ints(1, 0));
        let table = PerfectHashTable::new(vec![key.clone()]).unwrap();
        assert_eq!(table.rows_len(), 1);
        let row = table.row(0).unwrap();
        assert_eq!(row.len(), 1);
        assert!(row.hash_function().is_none());
        assert_eq!(table.find(&key), Ok(Address { row: 0, slot: 0 }));
        assert_eq!(table.find(&Vector::from(Complex::from_ints(2, 0))), Err(NotFound));
        assert_eq!(table.find(&key).unwrap().to_string(), "[0][0]");
    }

    #[test]
    fn test_empty() {
        assert_eq!(PerfectHashTable::<u32>::new(Vec::new()).unwrap_err(), BuildError::EmptyInput);
    }

    #[test]
    fn test_small() {
        for keys in [vec![1u64, 2, 5], (0..200).collect(), (0..1000).map(|i| i * 1_000_003).collect()] {
            let table = PerfectHashTable::with_conf(keys.clone(), BuildConf::seeded(42)).unwrap();
            test_table(&table, &keys);
        }
    }

    #[test]
    fn test_vectors() {
        let keys: Vec<Vector> = (0..300).map(|i|
            Vector::new([Complex::from_ints(i % 17, i / 17), Complex::from_ints(-i, 3)])
        ).collect();
        let table = PerfectHashTable::with_conf(keys.clone(), BuildConf::seeded(7)).unwrap();
        test_table(&table, &keys);
        let absent = Vector::new([Complex::from_ints(0, 0), Complex::from_ints(1, 3)]);
        assert_eq!(table.find(&absent), Err(NotFound));
    }

    #[test]
    fn test_nested_keys() {
        let keys = vec![vec![vec![1u64], vec![2]], vec![vec![1, 2]], vec![vec![], vec![1, 2]], vec![vec![1, 2], vec![]]];
        let table = PerfectHashTable::with_conf(keys.clone(), BuildConf::seeded(1)).unwrap();
        test_table(&table, &keys);
        assert_eq!(table.primary().range(), keys.len());

        let c = |re, im| Complex::from_ints(re, im);
        let keys = vec![
            vec![Vector::new([c(1, 0)]), Vector::new([c(2, 0)])],
            vec![Vector::new([c(1, 0), c(2, 0)])],
            vec![Vector::new([c(1, 0), c(2, 0)]), Vector::new([c(3, 0)])],
            vec![Vector::new([c(1, 0)]), Vector::new([c(2, 0), c(3, 0)])],
        ];
        let table = PerfectHashTable::with_conf(keys.clone(), BuildConf::seeded(2)).unwrap();
        test_table(&table, &keys);
    }

    #[test]
    fn test_reproducible() {
        let keys: Vec<u32> = (0..100).map(|i| i * 31).collect();
        let t1 = PerfectHashTable::with_conf(keys.clone(), BuildConf::seeded(3)).unwrap();
        let t2 = PerfectHashTable::with_conf(keys.clone(), BuildConf::seeded(3)).unwrap();
        for k in &keys { assert_eq!(t1.find(k), t2.find(k)); }
        assert_eq!(t1.primary(), t2.primary());
    }

    #[test]
    fn test_seeded_family() {
        let keys: Vec<String> = (0..500).map(|i| format!("key{}", i)).collect();
        let table: PerfectHashTable<String, SeededFunction> =
            PerfectHashTable::with_conf(keys.clone(), BuildConf::family_seeded(Seeded::default(), 11)).unwrap();
        test_table(&table, &keys);
        assert!(!table.contains(&"key500".to_owned()));
    }

    #[test]
    fn test_duplicates_packed() {
        let keys = vec![7u32, 3, 7, 9, 7, 3];
        let mut stats = BuildStats::default();
        let table = PerfectHashTable::with_stats(keys.clone(), &mut stats).unwrap();
        assert_eq!(table.len(), 6);
        assert!(stats.packed >= 1);
        for k in &keys {
            let address = table.find(k).unwrap();
            assert_eq!(table.get(address), Some(k));
        }
        assert_eq!(table.find(&8), Err(NotFound));
        let packed_keys: usize = table.rows().flatten().filter(|r| r.is_packed()).map(Row::number_of_hashed_keys).sum();
        assert!(packed_keys >= 2);
    }

    #[test]
    fn test_duplicates_only() {
        let keys = vec![5u64; 4];
        let table = PerfectHashTable::new(keys).unwrap();
        let address = table.find(&5).unwrap();
        let row = table.row(address.row).unwrap();
        assert!(row.is_packed());
        assert_eq!(row.len(), 16);
        assert_eq!(row.number_of_hashed_keys(), 4);
        assert_eq!(table.get(address), Some(&5));
    }

    #[test]
    fn test_duplicates_rejected() {
        let err = PerfectHashTable::with_conf(vec![1u32, 2, 1], BuildConf::reject_duplicates()).unwrap_err();
        assert!(matches!(err, BuildError::DuplicateKeys { .. }));
    }

    #[test]
    fn test_scan_only_in_packed_rows() {
        let keys: Vec<u32> = (0..64).collect();
        let table = PerfectHashTable::with_conf(keys.clone(), BuildConf::seeded(9)).unwrap();
        let mut probes = 0u64;
        for k in 64..1064u32 { assert!(table.find_stats(&k, &mut probes).is_err()); }
        assert!(probes <= 1000, "{} probes for 1000 absent keys", probes);
        probes = 0;
        for k in &keys { table.find_stats(k, &mut probes).unwrap(); }
        assert_eq!(probes, keys.len() as u64);
    }

    #[test]
    fn test_display() {
        let table = PerfectHashTable::with_conf(vec![Vector::from(Complex::from_ints(1, 0))], BuildConf::seeded(1)).unwrap();
        assert_eq!(table.to_string(), "*** Look up table for 1 rows ***\nROW #0 - [(1+0i)]\n");

        let keys: Vec<u32> = (0..20).collect();
        let table = PerfectHashTable::with_conf(keys, BuildConf::seeded(2)).unwrap();
        let dump = table.to_string();
        assert_eq!(dump.lines().filter(|l| l.starts_with("ROW #")).count(), 20);
        for (i, row) in table.rows().enumerate() {
            match row {
                None => assert!(dump.contains(&format!("ROW #{} - [empty]", i))),
                Some(r) if r.len() > 1 => assert!(dump.contains(&format!(" - memory to save : {} cells", r.len()))),
                Some(_) => {}
            }
        }
    }

    #[test]
    fn test_size() {
        let keys: Vec<u64> = (0..100).collect();
        let table = PerfectHashTable::with_conf(keys, BuildConf::seeded(4)).unwrap();
        assert!(table.size_bytes() >= table.slots_len() * std::mem::size_of::<Option<u64>>());
    }

    fn check_absent<K: Ord, H: SlotFunction<K>>(table: &PerfectHashTable<K, H>, keys: &BTreeSet<K>, foreign: &[K]) {
        for k in foreign {
            if !keys.contains(k) { assert_eq!(table.find(k), Err(NotFound)); }
        }
    }

    proptest! {
        #[test]
        fn prop_distinct_keys(keys in prop::collection::btree_set(any::<i64>(), 1..300),
                              foreign in prop::collection::vec(any::<i64>(), 0..50),
                              seed in any::<u64>()) {
            let v: Vec<i64> = keys.iter().copied().collect();
            let table = PerfectHashTable::with_conf(v.clone(), BuildConf::seeded(seed)).unwrap();
            test_table(&table, &v);
            check_absent(&table, &keys, &foreign);
            prop_assert!(table.rows().flatten().all(|r| !r.is_packed()));
        }

        #[test]
        fn prop_duplicates(keys in prop::collection::vec(0u8..16, 1..100), seed in any::<u64>()) {
            let mut conf = BuildConf::seeded(seed);
            conf.duplicates = DuplicatePolicy::Pack;
            let table = PerfectHashTable::with_conf(keys.clone(), conf).unwrap();
            prop_assert_eq!(table.len(), keys.len());
            let stored: usize = table.rows().flatten().map(Row::number_of_hashed_keys).sum();
            prop_assert_eq!(stored, keys.len());
            for k in &keys {
                let address = table.find(k).unwrap();
                prop_assert_eq!(table.get(address), Some(k));
            }
            for k in 16u8..32 { prop_assert_eq!(table.find(&k), Err(NotFound)); }
        }
    }
}
