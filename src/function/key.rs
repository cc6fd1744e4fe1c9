//! Key functions for key collision clustering.
//!
//! A key function maps every value to a string; values whose keys collide end
//! up in the same cluster. The built-in [`Fingerprint`] and
//! [`NGramFingerprint`] follow the OpenRefine fingerprint keyers
//! (`https://openrefine.org/docs/technical-reference/clustering-in-depth`).

use unicode_normalization::UnicodeNormalization;

use super::token::NGrams;
use crate::error::Result;

/// Derives a collision key from a value.
///
/// Keys are computed for every distinct value of a clustering run, possibly
/// from several worker threads at once, hence the `Sync` bound.
pub trait KeyFunction<V>: Sync {
    /// Compute the key for `value`.
    fn key(&self, value: &V) -> Result<String>;

    /// Whether the function can be evaluated without first seeing the input.
    ///
    /// Functions returning `false` get exactly one [`prepare`](Self::prepare)
    /// call per clustering run, on a private copy, before any key is computed.
    fn is_prepared(&self) -> bool {
        true
    }

    /// One-shot preparation over all distinct `(value, count)` pairs.
    fn prepare(&mut self, _values: &[(V, usize)]) -> Result<()> {
        Ok(())
    }
}

impl<V, F> KeyFunction<V> for F
where
    F: Fn(&V) -> String + Sync,
{
    fn key(&self, value: &V) -> Result<String> {
        Ok(self(value))
    }
}

/// Characters without a canonical decomposition, and their ASCII stand-ins.
const NON_DIACRITICS: &[(char, &str)] = &[
    ('\u{00DF}', "ss"), // sharp s
    ('\u{00E6}', "ae"),
    ('\u{00F8}', "oe"),
    ('\u{00A9}', "c"), // copyright sign
    ('\u{00F0}', "d"), // eth
    ('\u{0111}', "d"), // d with stroke
    ('\u{0256}', "d"), // african d
    ('\u{00FE}', "th"), // thorn
    ('\u{01BF}', "w"), // wynn
    ('\u{0127}', "h"), // h with stroke
    ('\u{0131}', "i"), // dotless i
    ('\u{0138}', "k"), // kra
    ('\u{0142}', "l"),
    ('\u{014B}', "n"), // eng
    ('\u{017F}', "s"), // long s
    ('\u{0167}', "t"), // t with stroke
    ('\u{0153}', "oe"),
];

/// Lowercase, fold to ASCII, drop control characters.
///
/// Whitespace (including tabs and newlines) and punctuation are turned into
/// plain spaces, so `"AMY/S"` and `"AMY'S"` both split into `amy` and `s`.
/// Leading and trailing spaces are removed.
pub fn normalize(text: &str) -> String {
    let lowered = text.trim().to_lowercase();

    let mut folded = String::with_capacity(lowered.len());
    for c in lowered.chars() {
        match NON_DIACRITICS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => folded.push_str(to),
            None => folded.push(c),
        }
    }

    let normalized: String = folded
        .nfkd()
        .filter(char::is_ascii)
        .filter_map(|c| {
            if c.is_ascii_whitespace() || c.is_ascii_punctuation() {
                Some(' ')
            } else if c.is_ascii_control() {
                None
            } else {
                Some(c)
            }
        })
        .collect();
    normalized.trim().to_string()
}

/// Whitespace-token fingerprint.
///
/// The key is the sorted set of whitespace-separated tokens of the
/// [normalized](normalize) value joined by single spaces, so
/// `"Tom Cruise"`, `"Cruise, Tom"` and `"tom  cruise."` share one key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fingerprint;

impl Fingerprint {
    /// Create the fingerprint key function.
    pub fn new() -> Self {
        Self
    }

    /// Fingerprint of a string.
    pub fn fingerprint(&self, text: &str) -> String {
        let normalized = normalize(text);
        let mut tokens: Vec<&str> = normalized.split_whitespace().collect();
        tokens.sort_unstable();
        tokens.dedup();
        tokens.join(" ")
    }
}

impl<V: AsRef<str>> KeyFunction<V> for Fingerprint {
    fn key(&self, value: &V) -> Result<String> {
        Ok(self.fingerprint(value.as_ref()))
    }
}

/// Character n-gram fingerprint.
///
/// Whitespace is removed from the [normalized](normalize) value, then the
/// sorted set of its character n-grams is concatenated. With small `n` this
/// catches transposed and doubled letters that the token fingerprint misses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NGramFingerprint {
    ngrams: NGrams,
}

impl NGramFingerprint {
    /// Create an n-gram fingerprint with n-grams of length `n`.
    pub fn new(n: usize) -> Result<Self> {
        Ok(Self {
            ngrams: NGrams::new(n)?,
        })
    }

    /// Fingerprint of a string.
    pub fn fingerprint(&self, text: &str) -> String {
        let compact: String = normalize(text).split_whitespace().collect();
        let mut grams = self.ngrams.ngrams(&compact);
        grams.sort_unstable();
        grams.dedup();
        grams.concat()
    }
}

impl<V: AsRef<str>> KeyFunction<V> for NGramFingerprint {
    fn key(&self, value: &V) -> Result<String> {
        Ok(self.fingerprint(value.as_ref()))
    }
}
