//! Clusterer input: a plain list of values or a frequency map.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::error::{Error, Result};

/// Values handed to a clusterer.
///
/// Both variants are resolved once, at the entry point of a clustering run,
/// into a list of distinct `(value, count)` pairs in first-occurrence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Values<V> {
    /// Raw values. Each occurrence counts once.
    List(Vec<V>),
    /// Distinct values with explicit frequencies.
    Counts(Vec<(V, usize)>),
}

impl<V: Clone + Eq + Hash> Values<V> {
    /// True if there are no values at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Values::List(values) => values.is_empty(),
            Values::Counts(counts) => counts.is_empty(),
        }
    }

    /// Resolve into distinct `(value, count)` pairs.
    ///
    /// Repeated values are merged (counts summed) at the position of their
    /// first occurrence. A zero count in a frequency map is rejected.
    pub fn resolve(self) -> Result<Vec<(V, usize)>> {
        let mut positions: HashMap<V, usize> = HashMap::new();
        let mut distinct: Vec<(V, usize)> = Vec::new();
        let mut merge = |value: V, count: usize| match positions.get(&value) {
            Some(&pos) => distinct[pos].1 += count,
            None => {
                positions.insert(value.clone(), distinct.len());
                distinct.push((value, count));
            }
        };

        match self {
            Values::List(values) => {
                for value in values {
                    merge(value, 1);
                }
            }
            Values::Counts(counts) => {
                for (value, count) in counts {
                    if count == 0 {
                        return Err(Error::InvalidCount { count });
                    }
                    merge(value, count);
                }
            }
        }
        Ok(distinct)
    }
}

impl<V> From<Vec<V>> for Values<V> {
    fn from(values: Vec<V>) -> Self {
        Values::List(values)
    }
}

impl<V: Clone> From<&[V]> for Values<V> {
    fn from(values: &[V]) -> Self {
        Values::List(values.to_vec())
    }
}

impl<V, const N: usize> From<[V; N]> for Values<V> {
    fn from(values: [V; N]) -> Self {
        Values::List(values.into())
    }
}

/// Iteration order of a `HashMap` is unspecified, so insertion-order
/// tie-breaks are not reproducible across runs for this conversion.
impl<V> From<HashMap<V, usize>> for Values<V> {
    fn from(counts: HashMap<V, usize>) -> Self {
        Values::Counts(counts.into_iter().collect())
    }
}

impl<V> From<BTreeMap<V, usize>> for Values<V> {
    fn from(counts: BTreeMap<V, usize>) -> Self {
        Values::Counts(counts.into_iter().collect())
    }
}
