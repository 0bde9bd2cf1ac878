#![doc = include_str!("../README.md")]

pub mod key;
pub use key::{Complex, Vector, HashWords, ParseKeyError};

pub mod universal;
pub use universal::{SlotRange, SlotFunction, UniversalFamily, Polynomial, PolynomialFunction, Seeded, SeededFunction};

pub mod stats;

mod conf;
pub use conf::{BuildConf, DuplicatePolicy};

mod error;
pub use error::{BuildError, NotFound};

mod buckets;
mod collision_solver;

mod table;
pub use table::{Address, PerfectHashTable, Row};

pub use dyn_size_of::GetSize;
pub use seedable_hash::{BuildSeededHasher, BuildDefaultSeededHasher};

/// Builds [`PerfectHashTable`] for given `keys` with the default configuration.
///
/// Fails with [`BuildError::EmptyInput`] if `keys` is empty.
#[inline] pub fn build_for<K: Ord + HashWords>(keys: Vec<K>) -> Result<PerfectHashTable<K>, BuildError> {
    PerfectHashTable::new(keys)
}
