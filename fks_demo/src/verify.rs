use std::collections::BTreeMap;
use std::fmt::{Debug, Display};

use fks::{Address, PerfectHashTable, SlotFunction};
use thiserror::Error;

/// Violation of the properties of a [`PerfectHashTable`] found by [`verify`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("key {key} is in the input, but it is not found")]
    Missing { key: String },
    #[error("key {key} is found at {address}, but the key stored there is different")]
    WrongAddress { key: String, address: Address },
    #[error("keys {first} and {second} are both found at {address}")]
    SharedAddress { first: String, second: String, address: Address },
    #[error("row {row} stores {keys} keys in {slots} slots")]
    WrongRowSize { row: usize, keys: usize, slots: usize },
    #[error("the table stores {stored} keys, but it was built for {expected}")]
    WrongKeyCount { stored: usize, expected: usize },
    #[error("key {key} is not in the input, but it is found at {address}")]
    Foreign { key: String, address: Address },
}

/// Summary of a successful verification.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VerifyStats {
    /// Number of distinct keys checked.
    pub distinct: usize,
    /// Average number of key comparisons per successful lookup.
    pub avg_probes: f64,
    /// Number of foreign keys checked.
    pub foreign: usize,
}

/// Checks that `table` built for `keys` finds each of them at a distinct address that stores an equal key,
/// that each row has one slot per single key or the squared number of its keys,
/// and that none of the `foreign` keys is found.
pub fn verify<K, H>(table: &PerfectHashTable<K, H>, keys: &[K], foreign: &[K]) -> Result<VerifyStats, VerifyError>
    where K: PartialEq + Display, H: SlotFunction<K>
{
    let mut probes = 0u64;
    let mut addresses: BTreeMap<Address, &K> = BTreeMap::new();
    for key in keys {
        let address = table.find_stats(key, &mut probes).map_err(|_| VerifyError::Missing { key: key.to_string() })?;
        if table.get(address) != Some(key) {
            return Err(VerifyError::WrongAddress { key: key.to_string(), address });
        }
        let first = *addresses.entry(address).or_insert(key);
        if first != key {
            return Err(VerifyError::SharedAddress { first: first.to_string(), second: key.to_string(), address });
        }
    }
    let mut stored = 0;
    for (row_index, row) in table.rows().enumerate() {
        let Some(row) = row else { continue };
        let n = row.number_of_hashed_keys();
        stored += n;
        let expected = if row.hash_function().is_some() { n * n } else { 1 };
        if row.len() != expected || n == 0 {
            return Err(VerifyError::WrongRowSize { row: row_index, keys: n, slots: row.len() });
        }
    }
    if stored != keys.len() || table.len() != keys.len() {
        return Err(VerifyError::WrongKeyCount { stored, expected: keys.len() });
    }
    for key in foreign {
        if let Ok(address) = table.find(key) {
            return Err(VerifyError::Foreign { key: key.to_string(), address });
        }
    }
    let distinct = addresses.len();
    Ok(VerifyStats {
        distinct,
        avg_probes: if keys.is_empty() { 0.0 } else { probes as f64 / keys.len() as f64 },
        foreign: foreign.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use fks::{BuildConf, Complex, Vector};

    fn v(re: i32, im: i32) -> Vector { Vector::from(Complex::from_ints(re, im)) }

    #[test]
    fn test_valid() {
        let keys: Vec<Vector> = (0..200).map(|i| v(i, -i)).collect();
        let table = PerfectHashTable::with_conf(keys.clone(), BuildConf::seeded(5)).unwrap();
        let stats = verify(&table, &keys, &[v(1000, 0), v(0, 1000)]).unwrap();
        assert_eq!(stats.distinct, 200);
        assert_eq!(stats.foreign, 2);
        assert!(stats.avg_probes >= 1.0);
    }

    #[test]
    fn test_duplicates() {
        let keys = vec![v(1, 1), v(2, 2), v(1, 1), v(3, 3), v(1, 1)];
        let table = PerfectHashTable::with_conf(keys.clone(), BuildConf::seeded(9)).unwrap();
        assert_eq!(verify(&table, &keys, &[]).unwrap().distinct, 3);
    }

    #[test]
    fn test_missing() {
        let keys = vec![v(1, 0), v(2, 0), v(3, 0)];
        let table = PerfectHashTable::with_conf(keys.clone(), BuildConf::seeded(1)).unwrap();
        let mut other = keys.clone();
        other[1] = v(7, 7);
        assert!(matches!(verify(&table, &other, &[]), Err(VerifyError::Missing { .. })));
        assert!(matches!(verify(&table, &keys, &keys[..1]), Err(VerifyError::Foreign { .. })));
        assert!(matches!(verify(&table, &keys[..2], &[]), Err(VerifyError::WrongKeyCount { stored: 3, expected: 2 })));
    }
}
