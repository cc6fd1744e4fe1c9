//! String similarity functions and similarity constraints.
//!
//! A [`SimilarityFunction`] scores a pair of values in \([0, 1]\) (1 = identical).
//! A [`SimilarityConstraint`] pairs a score with a [`Threshold`] and is what the
//! kNN clusterer consumes through the [`SimilarityPredicate`] trait.
//!
//! Edit distances are normalized as `1 - d / max(len_a, len_b)` with lengths
//! counted in `char`s; two empty strings are identical.
//!
//! Similarity must be symmetric (`sim(a, b) == sim(b, a)`). The kNN clusterer
//! evaluates each unordered pair once and records the result for both values.

use crate::error::{Error, Result};

/// Similarity score between two values, in \([0, 1]\).
pub trait SimilarityFunction<V> {
    /// Score the pair `(a, b)`.
    fn sim(&self, a: &V, b: &V) -> Result<f64>;
}

/// Symmetric yes/no decision on whether two values are similar.
pub trait SimilarityPredicate<V> {
    /// True if `a` and `b` are similar.
    fn is_satisfied(&self, a: &V, b: &V) -> Result<bool>;
}

impl<V, F> SimilarityPredicate<V> for F
where
    F: Fn(&V, &V) -> bool,
{
    fn is_satisfied(&self, a: &V, b: &V) -> Result<bool> {
        Ok(self(a, b))
    }
}

#[inline]
fn normalized_distance(distance: usize, a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - distance as f64 / longest as f64
}

/// Normalized Levenshtein similarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Levenshtein;

impl<V: AsRef<str>> SimilarityFunction<V> for Levenshtein {
    fn sim(&self, a: &V, b: &V) -> Result<f64> {
        let (a, b) = (a.as_ref(), b.as_ref());
        Ok(normalized_distance(strsim::levenshtein(a, b), a, b))
    }
}

/// Normalized Damerau-Levenshtein similarity (adjacent transpositions cost 1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DamerauLevenshtein;

impl<V: AsRef<str>> SimilarityFunction<V> for DamerauLevenshtein {
    fn sim(&self, a: &V, b: &V) -> Result<f64> {
        let (a, b) = (a.as_ref(), b.as_ref());
        Ok(normalized_distance(strsim::damerau_levenshtein(a, b), a, b))
    }
}

/// Normalized Hamming similarity.
///
/// Only defined for strings of equal length; other pairs fail with
/// [`Error::Function`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hamming;

impl<V: AsRef<str>> SimilarityFunction<V> for Hamming {
    fn sim(&self, a: &V, b: &V) -> Result<f64> {
        let (a, b) = (a.as_ref(), b.as_ref());
        let distance = strsim::hamming(a, b).map_err(Error::function)?;
        Ok(normalized_distance(distance, a, b))
    }
}

/// Jaro similarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Jaro;

impl<V: AsRef<str>> SimilarityFunction<V> for Jaro {
    fn sim(&self, a: &V, b: &V) -> Result<f64> {
        Ok(strsim::jaro(a.as_ref(), b.as_ref()))
    }
}

/// Jaro-Winkler similarity (Jaro with a bonus for a common prefix).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JaroWinkler;

impl<V: AsRef<str>> SimilarityFunction<V> for JaroWinkler {
    fn sim(&self, a: &V, b: &V) -> Result<f64> {
        Ok(strsim::jaro_winkler(a.as_ref(), b.as_ref()))
    }
}

/// Comparison of a similarity score against a fixed bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// `score > bound`
    Gt(f64),
    /// `score >= bound`
    Ge(f64),
    /// `score < bound`
    Lt(f64),
    /// `score <= bound`
    Le(f64),
}

impl Threshold {
    /// The bound the score is compared against.
    pub fn bound(&self) -> f64 {
        match *self {
            Threshold::Gt(t) | Threshold::Ge(t) | Threshold::Lt(t) | Threshold::Le(t) => t,
        }
    }

    /// Evaluate the comparison for `score`.
    pub fn is_satisfied(&self, score: f64) -> bool {
        match *self {
            Threshold::Gt(t) => score > t,
            Threshold::Ge(t) => score >= t,
            Threshold::Lt(t) => score < t,
            Threshold::Le(t) => score <= t,
        }
    }
}

/// A similarity function together with a threshold on its score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityConstraint<S> {
    func: S,
    threshold: Threshold,
}

impl<S> SimilarityConstraint<S> {
    /// Create a constraint. The threshold bound must lie in \([0, 1]\).
    pub fn new(func: S, threshold: Threshold) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold.bound()) {
            return Err(Error::InvalidParameter {
                name: "threshold",
                message: "must be in [0, 1]",
            });
        }
        Ok(Self { func, threshold })
    }

    /// The threshold.
    pub fn threshold(&self) -> Threshold {
        self.threshold
    }
}

impl<V, S> SimilarityPredicate<V> for SimilarityConstraint<S>
where
    S: SimilarityFunction<V>,
{
    fn is_satisfied(&self, a: &V, b: &V) -> Result<bool> {
        let score = self.func.sim(a, b)?;
        Ok(self.threshold.is_satisfied(score))
    }
}
