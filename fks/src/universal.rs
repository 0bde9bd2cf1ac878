//! Universal families of hash functions that map keys to slot indices.
//!
//! A family ([`UniversalFamily`]) draws independent random functions ([`SlotFunction`]) for a given range ([`SlotRange`]).
//! Functions are immutable values, so a rejected function is simply dropped and a fresh one drawn.

use std::fmt::{self, Debug, Display, Formatter};
use std::hash::Hash;

use dyn_size_of::GetSize;
use rand::Rng;
use seedable_hash::{map64_to_64, BuildDefaultSeededHasher, BuildSeededHasher};

use crate::key::HashWords;

/// Exclusive upper bound of the values returned by a [`SlotFunction`], independent of the key type.
pub trait SlotRange {
    /// Returns the (exclusive) upper bound of the values returned by [`slot`](SlotFunction::slot).
    fn range(&self) -> usize;
}

/// Hash function that maps keys to slot indices in the range `[0, range())`.
pub trait SlotFunction<K: ?Sized>: SlotRange {
    /// Returns the slot of `key`, a value in the range `[0, range())`.
    fn slot(&self, key: &K) -> usize;
}

/// Family of hash functions from which independent random functions can be drawn.
pub trait UniversalFamily<K: ?Sized> {
    type Function: SlotFunction<K>;

    /// Draws a random function with the given `range` (which must be positive), using `rng` as the source of randomness.
    fn draw<R: Rng>(&self, range: usize, rng: &mut R) -> Self::Function;
}

/// The Mersenne prime 2⁶¹-1.
pub const MERSENNE_61: u64 = (1 << 61) - 1;

/// Returns `x mod 2⁶¹-1` for `x < 2⁶²+2⁶¹`.
#[inline(always)]
fn reduce61(x: u64) -> u64 {
    let r = (x & MERSENNE_61) + (x >> 61);
    if r >= MERSENNE_61 { r - MERSENNE_61 } else { r }
}

/// Returns `a·b mod 2⁶¹-1` for `a, b < 2⁶¹-1`.
#[inline(always)]
fn mul61(a: u64, b: u64) -> u64 {
    let r = (a as u128) * (b as u128);
    reduce61((r as u64 & MERSENNE_61) + (r >> 61) as u64)
}

/// Returns `a+b mod 2⁶¹-1` for `a, b < 2⁶¹`.
#[inline(always)]
fn add61(a: u64, b: u64) -> u64 { reduce61(a + b) }

/// Carter-Wegman family over the field of integers modulo 2⁶¹-1.
///
/// Each 64-bit word given by [`HashWords`] is split into two 32-bit limbs and the number of limbs is appended.
/// The limbs are the coefficients of a polynomial evaluated at a random point `a`,
/// and the result `y` is mapped by `((c·y + b) mod p) mod m`, with random `c ≠ 0` and `b`.
/// Two distinct keys of `L` limbs collide with probability at most `1/m + (L+1)/p`.
#[derive(Default, Clone, Copy, Debug)]
pub struct Polynomial;

/// Function drawn from the [`Polynomial`] family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PolynomialFunction {
    a: u64,
    b: u64,
    c: u64,
    range: usize,
}

impl PolynomialFunction {
    /// Returns a function with given parameters, or [`None`] if they are out of their domains:
    /// `a` and `c` must be in `[1, 2⁶¹-1)`, `b` in `[0, 2⁶¹-1)` and `range` positive.
    pub fn with_params(a: u64, b: u64, c: u64, range: usize) -> Option<Self> {
        (a != 0 && c != 0 && a < MERSENNE_61 && b < MERSENNE_61 && c < MERSENNE_61 && range != 0)
            .then_some(Self { a, b, c, range })
    }

    /// Returns the value of the key polynomial at `a`, modulo 2⁶¹-1.
    #[inline]
    fn fingerprint<K: HashWords + ?Sized>(&self, key: &K) -> u64 {
        let mut acc = 0u64;
        let mut limbs = 0u64;
        key.hash_words(&mut |word: u64| {
            acc = add61(mul61(acc, self.a), word & 0xFFFF_FFFF);
            acc = add61(mul61(acc, self.a), word >> 32);
            limbs += 2;
        });
        add61(mul61(acc, self.a), limbs & MERSENNE_61)
    }
}

impl SlotRange for PolynomialFunction {
    #[inline] fn range(&self) -> usize { self.range }
}

impl<K: HashWords + ?Sized> SlotFunction<K> for PolynomialFunction {
    #[inline] fn slot(&self, key: &K) -> usize {
        let y = add61(mul61(self.c, self.fingerprint(key)), self.b);
        (y % self.range as u64) as usize
    }
}

impl GetSize for PolynomialFunction {}

impl Display for PolynomialFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "((c·P_a(x) + b) mod 2^61-1) mod {}, a={:#x}, b={:#x}, c={:#x}", self.range, self.a, self.b, self.c)
    }
}

impl<K: HashWords + ?Sized> UniversalFamily<K> for Polynomial {
    type Function = PolynomialFunction;

    fn draw<R: Rng>(&self, range: usize, rng: &mut R) -> Self::Function {
        debug_assert!(range > 0);
        PolynomialFunction {
            a: rng.gen_range(1..MERSENNE_61),
            b: rng.gen_range(0..MERSENNE_61),
            c: rng.gen_range(1..MERSENNE_61),
            range
        }
    }
}

/// Family of functions that hash keys with a [`BuildSeededHasher`] (by default [`BuildDefaultSeededHasher`])
/// initialized with a random 64-bit seed, and map the hashes to the range with [`map64_to_64`].
///
/// Works for any key type that implements [`Hash`], but gives no provable collision bound.
#[derive(Default, Clone, Copy)]
pub struct Seeded<S = BuildDefaultSeededHasher>(pub S);

/// Function drawn from the [`Seeded`] family.
#[derive(Clone, Copy)]
pub struct SeededFunction<S = BuildDefaultSeededHasher> {
    hasher: S,
    seed: u64,
    range: usize,
}

impl<S> SlotRange for SeededFunction<S> {
    #[inline] fn range(&self) -> usize { self.range }
}

impl<S: BuildSeededHasher, K: Hash + ?Sized> SlotFunction<K> for SeededFunction<S> {
    #[inline] fn slot(&self, key: &K) -> usize {
        map64_to_64(self.hasher.hash_one(key, self.seed), self.range as u64) as usize
    }
}

impl<S> GetSize for SeededFunction<S> {}

impl<S> Debug for SeededFunction<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeededFunction").field("seed", &self.seed).field("range", &self.range).finish()
    }
}

impl<S> Display for SeededFunction<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "seeded hash mod {}, seed={:#x}", self.range, self.seed)
    }
}

impl<S: BuildSeededHasher + Clone, K: Hash + ?Sized> UniversalFamily<K> for Seeded<S> {
    type Function = SeededFunction<S>;

    fn draw<R: Rng>(&self, range: usize, rng: &mut R) -> Self::Function {
        debug_assert!(range > 0);
        SeededFunction { hasher: self.0.clone(), seed: rng.gen(), range }
    }
}
