//! Prefix tree over cluster membership, for detecting repeated clusters.
//!
//! A cluster is canonicalized by sorting its `(value, count)` members by value.
//! The sorted values spell a path from the root: one trie level per member.
//! The node at the end of the path is flagged as a recorded cluster.
//!
//! Branching is on the value only. The count of the first cluster that
//! created a node is kept as node metadata and does not take part in
//! identity, so two clusters with the same distinct values are duplicates of
//! each other even when their counts differ.
//!
//! Nodes are never removed; the index only grows.

use std::collections::BTreeMap;
use std::hash::Hash;

use super::base::Cluster;

#[derive(Debug, Clone)]
struct Node<V> {
    /// Count of the member that first created this node.
    count: usize,
    /// True if a recorded cluster ends at this node.
    is_cluster: bool,
    children: BTreeMap<V, Node<V>>,
}

impl<V> Node<V> {
    fn new(count: usize) -> Self {
        Self {
            count,
            is_cluster: false,
            children: BTreeMap::new(),
        }
    }
}

/// Set of previously seen clusters, keyed by their distinct values.
#[derive(Debug, Clone)]
pub struct ClusterIndex<V> {
    root: Node<V>,
    len: usize,
}

impl<V> Default for ClusterIndex<V> {
    fn default() -> Self {
        Self {
            root: Node::new(0),
            len: 0,
        }
    }
}

impl<V: Ord + Clone + Eq + Hash> ClusterIndex<V> {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `cluster`.
    ///
    /// Returns `true` if no cluster with the same distinct values was recorded
    /// before. The empty cluster is recorded at the root.
    pub fn add(&mut self, cluster: &Cluster<V>) -> bool {
        let mut members: Vec<(&V, usize)> = cluster.iter().collect();
        members.sort_by(|a, b| a.0.cmp(b.0));

        let mut node = &mut self.root;
        for (value, count) in members {
            node = node
                .children
                .entry(value.clone())
                .or_insert_with(|| Node::new(count));
        }

        let added = !node.is_cluster;
        node.is_cluster = true;
        if added {
            self.len += 1;
        }
        added
    }

    /// True if a cluster with the same distinct values was recorded.
    pub fn contains(&self, cluster: &Cluster<V>) -> bool {
        let mut members: Vec<&V> = cluster.values().collect();
        members.sort();

        let mut node = &self.root;
        for value in members {
            match node.children.get(value) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.is_cluster
    }

    /// Counts stored along the path of `cluster`, if the path exists.
    ///
    /// These are the counts of whichever cluster first created each node.
    pub fn recorded_counts(&self, cluster: &Cluster<V>) -> Option<Vec<(V, usize)>> {
        let mut members: Vec<&V> = cluster.values().collect();
        members.sort();

        let mut node = &self.root;
        let mut counts = Vec::with_capacity(members.len());
        for value in members {
            node = node.children.get(value)?;
            counts.push((value.clone(), node.count));
        }
        node.is_cluster.then_some(counts)
    }

    /// Number of distinct clusters recorded.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
