use super::input::Values;
use crate::error::Result;

/// Common interface for value clusterers.
pub trait Clusterer<V> {
    /// The cluster type produced.
    type Output;

    /// Group `values` (a list or a frequency map) into clusters.
    ///
    /// Empty input yields an empty result, never an error.
    fn clusters<I>(&self, values: I) -> Result<Vec<Self::Output>>
    where
        I: Into<Values<V>>;

    /// Minimum number of distinct values a returned cluster must have.
    fn minsize(&self) -> usize;
}
