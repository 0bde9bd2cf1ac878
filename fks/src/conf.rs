use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

use crate::universal::Polynomial;

/// What to do with a bucket that contains structurally equal keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep all occurrences. The distinct keys of the bucket are packed at the beginning of its row
    /// and the repeated occurrences right after them. Lookups in such a row fall back to a linear scan.
    #[default]
    Pack,
    /// Fail the construction with [`BuildError::DuplicateKeys`](crate::BuildError::DuplicateKeys).
    Reject,
}

/// Build configuration that is accepted by [`PerfectHashTable`](crate::PerfectHashTable) constructors.
///
/// See field descriptions for details.
#[derive(Clone, Debug)]
pub struct BuildConf<F = Polynomial> {
    /// The universal family from which all hash functions of the table are drawn. (default: [`Polynomial`])
    pub family: F,

    /// Seed of the pseudo-random generator that draws the hash functions. (default: [`None`])
    ///
    /// [`None`] seeds the generator from the operating system entropy.
    /// Fixing the seed makes the construction reproducible.
    pub seed: Option<u64>,

    /// The maximum number of second-level functions drawn for a single bucket
    /// before the construction fails with [`BuildError::InternalHashingFailure`](crate::BuildError::InternalHashingFailure).
    /// (default: [`BuildConf::DEFAULT_MAX_ATTEMPTS`])
    ///
    /// A random function separates the keys of a bucket with probability greater than 1/2,
    /// so the limit is reached only if the family is broken or the keys are indistinguishable by it.
    pub max_attempts: u32,

    /// Handling of structurally equal keys. (default: [`DuplicatePolicy::Pack`])
    pub duplicates: DuplicatePolicy,
}

impl Default for BuildConf {
    fn default() -> Self {
        Self::family(Polynomial)
    }
}

impl BuildConf {
    /// Returns configuration that draws hash functions with the generator seeded by `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed), ..Default::default() }
    }

    /// Returns configuration that rejects key collections with duplicates.
    pub fn reject_duplicates() -> Self {
        Self { duplicates: DuplicatePolicy::Reject, ..Default::default() }
    }
}

impl<F> BuildConf<F> {
    /// The default value for [`max_attempts`](BuildConf::max_attempts).
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 1000;

    /// Returns configuration that uses custom [`family`](BuildConf::family).
    pub fn family(family: F) -> Self {
        Self { family, seed: None, max_attempts: Self::DEFAULT_MAX_ATTEMPTS, duplicates: DuplicatePolicy::Pack }
    }

    /// Returns configuration that uses custom [`family`](BuildConf::family) and [`seed`](BuildConf::seed).
    pub fn family_seeded(family: F, seed: u64) -> Self {
        Self { seed: Some(seed), ..Self::family(family) }
    }

    /// Returns the generator that draws hash functions during a single construction.
    pub(crate) fn rng(&self) -> Pcg64Mcg {
        match self.seed {
            Some(seed) => Pcg64Mcg::seed_from_u64(seed),
            None => Pcg64Mcg::from_entropy()
        }
    }
}
