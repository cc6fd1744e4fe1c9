//! Tokenizers.
//!
//! Tokens are only used to block values before pairwise comparison, so a
//! tokenizer should be cheap and generous: two values that never share a token
//! are never compared.

use crate::error::{Error, Result};

/// Splits a value into string tokens.
pub trait Tokenizer<V> {
    /// Tokens for `value`. Duplicates are allowed.
    fn tokens(&self, value: &V) -> Result<Vec<String>>;
}

impl<V, F> Tokenizer<V> for F
where
    F: Fn(&V) -> Vec<String>,
{
    fn tokens(&self, value: &V) -> Result<Vec<String>> {
        Ok(self(value))
    }
}

/// Character n-grams.
///
/// Optional padding adds `n - 1` copies of a padding character to the left
/// and/or right of the value first. A value whose (padded) length is at most
/// `n` characters yields itself as the only token.
///
/// Shingles are computed on Unicode scalar values (`char`), not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NGrams {
    n: usize,
    pleft: Option<char>,
    pright: Option<char>,
}

impl Default for NGrams {
    /// Six-character n-grams without padding, the kNN blocking default.
    fn default() -> Self {
        Self {
            n: 6,
            pleft: None,
            pright: None,
        }
    }
}

impl NGrams {
    /// Create an n-gram tokenizer without padding.
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidParameter {
                name: "n",
                message: "must be at least 1",
            });
        }
        Ok(Self {
            n,
            pleft: None,
            pright: None,
        })
    }

    /// Pad values on the left with `n - 1` copies of `pad`.
    pub fn with_left_padding(mut self, pad: char) -> Self {
        self.pleft = Some(pad);
        self
    }

    /// Pad values on the right with `n - 1` copies of `pad`.
    pub fn with_right_padding(mut self, pad: char) -> Self {
        self.pright = Some(pad);
        self
    }

    /// Length of the generated n-grams.
    pub fn n(&self) -> usize {
        self.n
    }

    /// N-grams of a string.
    pub fn ngrams(&self, text: &str) -> Vec<String> {
        let pad = self.n - 1;
        let mut chars: Vec<char> = Vec::with_capacity(text.len() + 2 * pad);
        if let Some(c) = self.pleft {
            chars.extend(std::iter::repeat(c).take(pad));
        }
        chars.extend(text.chars());
        if let Some(c) = self.pright {
            chars.extend(std::iter::repeat(c).take(pad));
        }

        if chars.len() <= self.n {
            return vec![chars.into_iter().collect()];
        }
        chars
            .windows(self.n)
            .map(|w| w.iter().collect::<String>())
            .collect()
    }
}

impl<V: AsRef<str>> Tokenizer<V> for NGrams {
    fn tokens(&self, value: &V) -> Result<Vec<String>> {
        Ok(self.ngrams(value.as_ref()))
    }
}
