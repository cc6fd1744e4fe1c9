//! Value functions consumed by the clusterers.
//!
//! - [`key`]: key (fingerprint) functions for key collision clustering
//! - [`token`]: tokenizers used for kNN blocking
//! - [`similarity`]: string similarity scores and threshold constraints
//!
//! Every function is a trait so callers can plug in their own. Closures work
//! too: `Fn(&V) -> String` is a [`KeyFunction`], `Fn(&V) -> Vec<String>` is a
//! [`Tokenizer`], and `Fn(&V, &V) -> bool` is a [`SimilarityPredicate`].
//! Errors raised by caller-supplied functions should be wrapped with
//! [`Error::function`](crate::Error::function); they abort the clustering run.

pub mod key;
pub mod similarity;
pub mod token;

pub use key::{Fingerprint, KeyFunction, NGramFingerprint};
pub use similarity::{
    DamerauLevenshtein, Hamming, Jaro, JaroWinkler, Levenshtein, SimilarityConstraint,
    SimilarityFunction, SimilarityPredicate, Threshold,
};
pub use token::{NGrams, Tokenizer};
