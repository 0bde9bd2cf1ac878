//! Keys: complex numbers, vectors of them, and the [`HashWords`] capability used by universal hashing.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use dyn_size_of::GetSize;
use thiserror::Error;

/// Types that can be fed to a [`Polynomial`](crate::Polynomial) hash function as a sequence of 64-bit words.
///
/// Structurally equal values must emit identical word sequences
/// and distinct values must emit distinct word sequences.
/// Variable-length values (like slices and strings) therefore emit their lengths before their content.
pub trait HashWords {
    /// Calls `sink` with each successive word of `self`.
    fn hash_words<W: FnMut(u64)>(&self, sink: &mut W);
}

macro_rules! impl_hash_words_for_int {
    ($($t:ty),+) => {$(
        impl HashWords for $t {
            #[inline(always)] fn hash_words<W: FnMut(u64)>(&self, sink: &mut W) { sink(*self as u64) }
        }
    )+}
}

impl_hash_words_for_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, char, bool);

impl HashWords for u128 {
    #[inline] fn hash_words<W: FnMut(u64)>(&self, sink: &mut W) {
        sink(*self as u64);
        sink((*self >> 64) as u64);
    }
}

impl HashWords for i128 {
    #[inline] fn hash_words<W: FnMut(u64)>(&self, sink: &mut W) { (*self as u128).hash_words(sink) }
}

impl<T: HashWords> HashWords for [T] {
    /// Emits the length and then the words of each element.
    fn hash_words<W: FnMut(u64)>(&self, sink: &mut W) {
        sink(self.len() as u64);
        for v in self { v.hash_words(sink) }
    }
}

impl<T: HashWords, const N: usize> HashWords for [T; N] {
    #[inline] fn hash_words<W: FnMut(u64)>(&self, sink: &mut W) { self.as_slice().hash_words(sink) }
}

impl<T: HashWords> HashWords for Vec<T> {
    #[inline] fn hash_words<W: FnMut(u64)>(&self, sink: &mut W) { self.as_slice().hash_words(sink) }
}

impl<T: HashWords> HashWords for Box<[T]> {
    #[inline] fn hash_words<W: FnMut(u64)>(&self, sink: &mut W) { (**self).hash_words(sink) }
}

impl HashWords for str {
    /// Emits the length and then the bytes packed little-endian into words.
    fn hash_words<W: FnMut(u64)>(&self, sink: &mut W) {
        sink(self.len() as u64);
        for chunk in self.as_bytes().chunks(8) {
            let mut word = [0u8; 8];
            word[..chunk.len()].copy_from_slice(chunk);
            sink(u64::from_le_bytes(word));
        }
    }
}

impl HashWords for String {
    #[inline] fn hash_words<W: FnMut(u64)>(&self, sink: &mut W) { self.as_str().hash_words(sink) }
}

impl<T: HashWords + ?Sized> HashWords for &T {
    #[inline(always)] fn hash_words<W: FnMut(u64)>(&self, sink: &mut W) { (**self).hash_words(sink) }
}

/// Error returned when parsing a [`Complex`] or a [`Vector`] fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseKeyError {
    #[error("invalid complex number: {0:?}")]
    InvalidComplex(String),
    #[error("complex number components must not be NaN")]
    NaN,
    #[error("vector must have at least one component")]
    EmptyVector,
}

/// Complex number with `f64` components, compared and hashed structurally.
///
/// `-0.0` is stored as `0.0` and NaN components are never stored,
/// so equality, ordering and hashing all agree.
#[derive(Clone, Copy, Debug, Default)]
pub struct Complex {
    re: f64,
    im: f64,
}

#[inline(always)] fn normalize(v: f64) -> f64 { if v == 0.0 { 0.0 } else { v } }

impl Complex {
    /// Returns complex number `re + im·i`, or [`None`] if any component is NaN.
    pub fn new(re: f64, im: f64) -> Option<Self> {
        (!re.is_nan() && !im.is_nan()).then(|| Self { re: normalize(re), im: normalize(im) })
    }

    /// Returns complex number with integral components `re + im·i`.
    #[inline] pub fn from_ints(re: i32, im: i32) -> Self {
        Self { re: normalize(re as f64), im: normalize(im as f64) }
    }

    /// Returns the real part.
    #[inline] pub fn re(&self) -> f64 { self.re }

    /// Returns the imaginary part.
    #[inline] pub fn im(&self) -> f64 { self.im }
}

impl PartialEq for Complex {
    #[inline] fn eq(&self, other: &Self) -> bool {
        self.re.to_bits() == other.re.to_bits() && self.im.to_bits() == other.im.to_bits()
    }
}

impl Eq for Complex {}

impl PartialOrd for Complex {
    #[inline] fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Ord for Complex {
    fn cmp(&self, other: &Self) -> Ordering {
        self.re.total_cmp(&other.re).then_with(|| self.im.total_cmp(&other.im))
    }
}

impl Hash for Complex {
    #[inline] fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.re.to_bits());
        state.write_u64(self.im.to_bits());
    }
}

impl HashWords for Complex {
    #[inline] fn hash_words<W: FnMut(u64)>(&self, sink: &mut W) {
        sink(self.re.to_bits());
        sink(self.im.to_bits());
    }
}

impl GetSize for Complex {}

impl From<i32> for Complex {
    #[inline] fn from(re: i32) -> Self { Self::from_ints(re, 0) }
}

impl Display for Complex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.im.is_sign_negative() {
            write!(f, "({}-{}i)", self.re, -self.im)
        } else {
            write!(f, "({}+{}i)", self.re, self.im)
        }
    }
}

/// Returns the position of the sign that separates the real and imaginary parts of `s`, if any.
fn split_sign(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    (1..bytes.len()).rev().find(|&i|
        (bytes[i] == b'+' || bytes[i] == b'-') && !matches!(bytes[i-1], b'e' | b'E')
    )
}

fn parse_part(s: &str, whole: &str) -> Result<f64, ParseKeyError> {
    let v: f64 = s.parse().map_err(|_| ParseKeyError::InvalidComplex(whole.to_owned()))?;
    if v.is_nan() { Err(ParseKeyError::NaN) } else { Ok(v) }
}

fn parse_imaginary(s: &str, whole: &str) -> Result<f64, ParseKeyError> {
    match s {
        "" | "+" => Ok(1.0),
        "-" => Ok(-1.0),
        _ => parse_part(s, whole)
    }
}

impl FromStr for Complex {
    type Err = ParseKeyError;

    /// Parses `23-8i`, `(23-8i)`, `-4i`, `7`, `i`, `-i`; spaces are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let body = compact.strip_prefix('(').and_then(|b| b.strip_suffix(')')).unwrap_or(&compact);
        if body.is_empty() { return Err(ParseKeyError::InvalidComplex(s.to_owned())); }
        let (re, im) = match body.strip_suffix('i') {
            Some(without_i) => match split_sign(without_i) {
                Some(pos) => (parse_part(&without_i[..pos], s)?, parse_imaginary(&without_i[pos..], s)?),
                None => (0.0, parse_imaginary(without_i, s)?)
            },
            None => (parse_part(body, s)?, 0.0)
        };
        Self::new(re, im).ok_or(ParseKeyError::NaN)
    }
}

/// Immutable, fixed-length vector of [`Complex`] numbers.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Vector(Box<[Complex]>);

impl Vector {
    /// Returns vector with given `components`.
    pub fn new(components: impl Into<Box<[Complex]>>) -> Self {
        Self(components.into())
    }

    /// Returns the number of components.
    #[inline] pub fn dimension(&self) -> usize { self.0.len() }

    /// Returns the components.
    #[inline] pub fn components(&self) -> &[Complex] { &self.0 }
}

impl From<Complex> for Vector {
    #[inline] fn from(c: Complex) -> Self { Self(Box::new([c])) }
}

impl FromIterator<Complex> for Vector {
    fn from_iter<I: IntoIterator<Item = Complex>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl HashWords for Vector {
    #[inline] fn hash_words<W: FnMut(u64)>(&self, sink: &mut W) { self.0.hash_words(sink) }
}

impl GetSize for Vector {
    fn size_bytes_dyn(&self) -> usize { self.0.size_bytes_dyn() }
    fn size_bytes_content_dyn(&self) -> usize { self.0.size_bytes_content_dyn() }
    const USES_DYN_MEM: bool = true;
}

impl Display for Vector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, c) in self.0.iter().enumerate() {
            if i != 0 { f.write_str(", ")?; }
            write!(f, "{}", c)?;
        }
        f.write_str("]")
    }
}

impl FromStr for Vector {
    type Err = ParseKeyError;

    /// Parses components separated by commas (or, if there are no commas, by whitespace),
    /// optionally surrounded by square brackets.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('[').and_then(|b| b.strip_suffix(']')).unwrap_or(trimmed);
        let components = if body.contains(',') {
            body.split(',').map(str::parse).collect::<Result<Box<[Complex]>, _>>()?
        } else {
            body.split_whitespace().map(str::parse).collect::<Result<Box<[Complex]>, _>>()?
        };
        if components.is_empty() { return Err(ParseKeyError::EmptyVector); }
        Ok(Self(components))
    }
}
