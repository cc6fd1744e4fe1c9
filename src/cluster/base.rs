//! Frequency-weighted value clusters.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{Error, Result};

/// A group of distinct values believed to denote the same real-world entity.
///
/// Each member carries a positive frequency count. Members keep the order in
/// which they were first added; that order is the tie-breaker for
/// [`Cluster::suggestion`].
///
/// Equality is multiset equality: two clusters are equal when they hold the
/// same values with the same counts, regardless of insertion order.
#[derive(Debug, Clone)]
pub struct Cluster<V> {
    members: Vec<(V, usize)>,
    positions: HashMap<V, usize>,
}

impl<V> Default for Cluster<V> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
            positions: HashMap::new(),
        }
    }
}

impl<V: Clone + Eq + Hash> Cluster<V> {
    /// Create an empty cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a cluster from `(value, count)` pairs.
    ///
    /// Repeated values have their counts summed.
    pub fn from_counts<I>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (V, usize)>,
    {
        let mut cluster = Self::new();
        for (value, count) in counts {
            cluster.add(value, count)?;
        }
        Ok(cluster)
    }

    /// Increase the frequency of `value` by `count`.
    ///
    /// Returns `self` so calls can be chained with `?`. A zero count is
    /// rejected with [`Error::InvalidCount`] and leaves the cluster unchanged.
    pub fn add(&mut self, value: V, count: usize) -> Result<&mut Self> {
        if count == 0 {
            return Err(Error::InvalidCount { count });
        }
        self.add_unchecked(value, count);
        Ok(self)
    }

    /// Add a single occurrence of `value`.
    pub fn push(&mut self, value: V) -> &mut Self {
        self.add_unchecked(value, 1);
        self
    }

    pub(crate) fn add_unchecked(&mut self, value: V, count: usize) {
        debug_assert!(count > 0);
        match self.positions.get(&value) {
            Some(&pos) => self.members[pos].1 += count,
            None => {
                self.positions.insert(value.clone(), self.members.len());
                self.members.push((value, count));
            }
        }
    }

    /// The most frequent member.
    ///
    /// Ties go to the member that was added first.
    pub fn suggestion(&self) -> Result<&V> {
        let mut best: Option<&(V, usize)> = None;
        for member in &self.members {
            // Strictly greater keeps the earliest member on ties.
            if best.map_or(true, |b| member.1 > b.1) {
                best = Some(member);
            }
        }
        best.map(|(value, _)| value).ok_or(Error::EmptyCluster)
    }

    /// Map every member except `target` to `target`.
    ///
    /// When `target` is `None` the [`suggestion`](Self::suggestion) is used,
    /// which fails with [`Error::EmptyCluster`] on an empty cluster. The target
    /// itself is never a key of the returned mapping.
    pub fn to_mapping(&self, target: Option<&V>) -> Result<HashMap<V, V>> {
        let target = match target {
            Some(target) => target,
            None => self.suggestion()?,
        };
        Ok(self
            .members
            .iter()
            .filter(|(value, _)| value != target)
            .map(|(value, _)| (value.clone(), target.clone()))
            .collect())
    }

    /// Frequency of `value`, if it is a member.
    pub fn count<Q>(&self, value: &Q) -> Option<usize>
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.positions.get(value).map(|&pos| self.members[pos].1)
    }

    /// Whether `value` is a member.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.positions.contains_key(value)
    }
}

impl<V> Cluster<V> {
    /// Number of distinct members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The `index`-th distinct value that was added.
    pub fn get(&self, index: usize) -> Option<&V> {
        self.members.get(index).map(|(value, _)| value)
    }

    /// Sum of all member counts.
    pub fn total(&self) -> usize {
        self.members.iter().map(|(_, count)| count).sum()
    }

    /// Iterate over `(value, count)` in insertion order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            inner: self.members.iter(),
        }
    }

    /// Iterate over the distinct values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.members.iter().map(|(value, _)| value)
    }
}

impl<V: Eq + Hash> PartialEq for Cluster<V> {
    fn eq(&self, other: &Self) -> bool {
        self.members.len() == other.members.len()
            && self.members.iter().all(|(value, count)| {
                other
                    .positions
                    .get(value)
                    .is_some_and(|&pos| other.members[pos].1 == *count)
            })
    }
}

impl<V: Eq + Hash> Eq for Cluster<V> {}

impl<V: Clone + Eq + Hash> FromIterator<V> for Cluster<V> {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut cluster = Self::new();
        for value in iter {
            cluster.push(value);
        }
        cluster
    }
}

/// Iterator over the `(value, count)` members of a [`Cluster`].
#[derive(Debug, Clone)]
pub struct Iter<'a, V> {
    inner: std::slice::Iter<'a, (V, usize)>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a V, usize);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(value, count)| (value, *count))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<'a, V> IntoIterator for &'a Cluster<V> {
    type Item = (&'a V, usize);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
