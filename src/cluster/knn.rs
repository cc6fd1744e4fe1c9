//! Nearest-neighbor (kNN) clustering with token blocking.
//!
//! # The Algorithm
//!
//! This follows the hybrid blocking approach used by OpenRefine's
//! nearest-neighbor clustering:
//!
//! 1. **Blocking**: every value is tokenized (character 6-grams by default) and
//!    appended to one bucket per distinct token. Buckets overlap; a value can
//!    sit in many of them.
//! 2. **Pairwise comparison**: inside every bucket with at least two values,
//!    each unordered pair is tested against the similarity predicate. A pair
//!    already recorded as neighbors (through another shared token) is skipped.
//!    Similar pairs are recorded as neighbors of each other.
//! 3. **Hubs**: every value with at least one neighbor becomes a candidate
//!    cluster made of its neighbors plus itself.
//! 4. Candidates below `minsize` are dropped and, optionally, repeated
//!    candidates are removed.
//!
//! ## Hub clusters, not connected components
//!
//! Clusters are stars centered on one value. If `a ~ b` and `b ~ c` but not
//! `a ~ c`, the result holds `{a, b}` (hub `a`), `{a, b, c}` (hub `b`) and
//! `{b, c}` (hub `c`), never a transitive merge. Clusters may overlap.
//!
//! ## Complexity
//!
//! - **Time**: `O(Σ bucket_size²)` similarity evaluations instead of `O(n²)`.
//! - **Recall**: values that share no token are never compared.
//!
//! Output order follows the first occurrence of each hub value in the input.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;

use tracing::{debug, trace};

use super::base::Cluster;
use super::index::ClusterIndex;
use super::input::Values;
use super::key::{KeyCollision, KeyCollisionCluster};
use super::traits::Clusterer;
use crate::error::{Error, Result};
use crate::function::key::Fingerprint;
use crate::function::similarity::SimilarityPredicate;
use crate::function::token::{NGrams, Tokenizer};

/// Nearest-neighbor clusterer.
#[derive(Debug, Clone)]
pub struct KnnClusterer<P, T = NGrams> {
    sim: P,
    tokenizer: T,
    minsize: usize,
    remove_duplicates: bool,
}

impl<P> KnnClusterer<P, NGrams> {
    /// Create a clusterer around a similarity predicate.
    ///
    /// Defaults: 6-gram blocking, `minsize = 2`, duplicates removed.
    pub fn new(sim: P) -> Self {
        Self {
            sim,
            tokenizer: NGrams::default(),
            minsize: 2,
            remove_duplicates: true,
        }
    }
}

impl<P, T> KnnClusterer<P, T> {
    /// Use a different tokenizer for blocking.
    pub fn with_tokenizer<U>(self, tokenizer: U) -> KnnClusterer<P, U> {
        KnnClusterer {
            sim: self.sim,
            tokenizer,
            minsize: self.minsize,
            remove_duplicates: self.remove_duplicates,
        }
    }

    /// Set the minimum number of distinct values per returned cluster.
    pub fn with_minsize(mut self, minsize: usize) -> Self {
        self.minsize = minsize;
        self
    }

    /// Keep or remove clusters with the same members.
    pub fn with_remove_duplicates(mut self, remove_duplicates: bool) -> Self {
        self.remove_duplicates = remove_duplicates;
        self
    }

    /// Whether repeated clusters are removed.
    pub fn remove_duplicates(&self) -> bool {
        self.remove_duplicates
    }
}

impl<V, P, T> Clusterer<V> for KnnClusterer<P, T>
where
    V: Clone + Ord + Hash,
    P: SimilarityPredicate<V>,
    T: Tokenizer<V>,
{
    type Output = Cluster<V>;

    fn clusters<I>(&self, values: I) -> Result<Vec<Cluster<V>>>
    where
        I: Into<Values<V>>,
    {
        let values = values.into();
        if values.is_empty() {
            return Ok(Vec::new());
        }
        check_minsize(self.minsize)?;
        let values = values.resolve()?;
        let n = values.len();

        let blocks = self.blocks(&values)?;

        let mut neighbors: Vec<Option<Cluster<V>>> = (0..n).map(|_| None).collect();
        let mut comparisons = 0usize;
        for (token, block) in &blocks {
            if block.len() < 2 {
                continue;
            }
            trace!(token = %token, size = block.len(), "comparing block");

            for (pos, &i) in block.iter().enumerate() {
                for &j in &block[pos + 1..] {
                    let (value_i, count_i) = &values[i];
                    let (value_j, count_j) = &values[j];
                    // Neighborhood is symmetric: checking one side is enough.
                    if neighbors[i].as_ref().is_some_and(|c| c.contains(value_j)) {
                        continue;
                    }
                    comparisons += 1;
                    if !self.sim.is_satisfied(value_i, value_j)? {
                        continue;
                    }
                    neighbors[i]
                        .get_or_insert_with(Cluster::new)
                        .add_unchecked(value_j.clone(), *count_j);
                    neighbors[j]
                        .get_or_insert_with(Cluster::new)
                        .add_unchecked(value_i.clone(), *count_i);
                }
            }
        }

        let mut index = ClusterIndex::new();
        let mut candidates = 0usize;
        let mut clusters = Vec::new();
        for (hub, cluster) in neighbors.into_iter().enumerate() {
            let Some(mut cluster) = cluster else {
                continue;
            };
            candidates += 1;
            let (value, count) = &values[hub];
            cluster.add_unchecked(value.clone(), *count);

            if cluster.len() < self.minsize {
                continue;
            }
            if self.remove_duplicates && !index.add(&cluster) {
                continue;
            }
            clusters.push(cluster);
        }

        debug!(
            values = n,
            blocks = blocks.len(),
            comparisons,
            candidates,
            clusters = clusters.len(),
            "knn clustering finished"
        );
        Ok(clusters)
    }

    fn minsize(&self) -> usize {
        self.minsize
    }
}

impl<P, T> KnnClusterer<P, T> {
    /// Token buckets of value indices, in token order.
    fn blocks<V>(&self, values: &[(V, usize)]) -> Result<BTreeMap<String, Vec<usize>>>
    where
        T: Tokenizer<V>,
    {
        let mut blocks: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, (value, _)) in values.iter().enumerate() {
            let mut tokens = self.tokenizer.tokens(value)?;
            tokens.sort_unstable();
            tokens.dedup();
            for token in tokens {
                blocks.entry(token).or_default().push(idx);
            }
        }
        Ok(blocks)
    }
}

fn check_minsize(minsize: usize) -> Result<()> {
    if minsize == 0 {
        return Err(Error::InvalidParameter {
            name: "minsize",
            message: "must be at least 1",
        });
    }
    Ok(())
}

/// Run kNN clustering over `values`.
pub fn knn_clusters<V, P, T, I>(
    values: I,
    sim: P,
    tokenizer: T,
    minsize: usize,
    remove_duplicates: bool,
) -> Result<Vec<Cluster<V>>>
where
    V: Clone + Ord + Hash,
    P: SimilarityPredicate<V>,
    T: Tokenizer<V>,
    I: Into<Values<V>>,
{
    KnnClusterer::new(sim)
        .with_tokenizer(tokenizer)
        .with_minsize(minsize)
        .with_remove_duplicates(remove_duplicates)
        .clusters(values)
}

/// kNN clustering over fingerprint keys.
///
/// Values are first grouped by [`Fingerprint`] key collision. kNN clustering
/// then runs over the distinct keys (weighted by the total count of their
/// group), and every key cluster is expanded back into the original values of
/// its groups. Key groups with at least `minsize` values that have no similar
/// neighbor are returned as clusters too. No two returned clusters hold the
/// same values.
///
/// `sim` and `tokenizer` see fingerprint keys, not the raw values.
pub fn knn_collision_clusters<V, P, T, I>(
    values: I,
    sim: P,
    tokenizer: T,
    minsize: usize,
) -> Result<Vec<Cluster<V>>>
where
    V: Clone + Ord + Hash + Send + Sync + AsRef<str>,
    P: SimilarityPredicate<String>,
    T: Tokenizer<String>,
    I: Into<Values<V>>,
{
    let values: Values<V> = values.into();
    if values.is_empty() {
        return Ok(Vec::new());
    }
    check_minsize(minsize)?;

    let groups: Vec<KeyCollisionCluster<V>> = KeyCollision::new(Fingerprint::new())
        .with_minsize(1)
        .clusters(values)?;
    if groups.is_empty() {
        return Ok(Vec::new());
    }

    let keys: Vec<(String, usize)> = groups
        .iter()
        .map(|g| (g.key().to_string(), g.cluster().total()))
        .collect();
    let key_clusters = KnnClusterer::new(sim)
        .with_tokenizer(tokenizer)
        .clusters(Values::Counts(keys))?;

    let position: HashMap<&str, usize> = groups
        .iter()
        .enumerate()
        .map(|(pos, g)| (g.key(), pos))
        .collect();

    let mut index = ClusterIndex::new();
    let mut covered: HashSet<String> = HashSet::new();
    let mut clusters = Vec::new();
    for key_cluster in &key_clusters {
        let mut cluster = Cluster::new();
        for key in key_cluster.values() {
            covered.insert(key.clone());
            let group = &groups[position[key.as_str()]];
            for (value, count) in group.cluster() {
                cluster.add_unchecked(value.clone(), count);
            }
        }
        if cluster.len() >= minsize && index.add(&cluster) {
            clusters.push(cluster);
        }
    }

    for group in groups {
        if covered.contains(group.key()) {
            continue;
        }
        let cluster: Cluster<V> = group.into();
        if cluster.len() >= minsize && index.add(&cluster) {
            clusters.push(cluster);
        }
    }

    debug!(
        key_clusters = key_clusters.len(),
        clusters = clusters.len(),
        "knn collision clustering finished"
    );
    Ok(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::similarity::{Levenshtein, SimilarityConstraint, Threshold};
    use std::cell::Cell;

    const BOROUGHS: [&str; 12] = [
        "BROOKLYN",
        "BRPPKLYN",
        "BROKLYN",
        "BROPKLYN",
        "QUEENS",
        "QUEEENS",
        "QUEENZ",
        "MANHATTAN",
        "MANNHATAN",
        "MANNHATTAN",
        "BRONX",
        "BRONZ",
    ];

    fn levenshtein_gt(bound: f64) -> SimilarityConstraint<Levenshtein> {
        SimilarityConstraint::new(Levenshtein, Threshold::Gt(bound)).unwrap()
    }

    fn four_grams() -> NGrams {
        NGrams::new(4).unwrap()
    }

    fn sorted(cluster: &Cluster<&'static str>) -> Vec<&'static str> {
        let mut values: Vec<&str> = cluster.values().copied().collect();
        values.sort_unstable();
        values
    }

    #[test]
    fn test_knn_empty() {
        let clusters = KnnClusterer::new(levenshtein_gt(0.0))
            .clusters(Vec::<&str>::new())
            .unwrap();
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_knn_boroughs() {
        let knn = |minsize, remove_duplicates, bound| {
            knn_clusters(
                BOROUGHS,
                levenshtein_gt(bound),
                four_grams(),
                minsize,
                remove_duplicates,
            )
            .unwrap()
        };

        assert_eq!(knn(2, true, 0.7).len(), 4);
        assert_eq!(knn(3, true, 0.7).len(), 3);
        assert_eq!(knn(2, false, 0.7).len(), 12);
        assert_eq!(knn(2, true, 0.97).len(), 0);
    }

    #[test]
    fn test_knn_brooklyn_misspellings() {
        let clusters = KnnClusterer::new(levenshtein_gt(0.7))
            .with_tokenizer(four_grams())
            .clusters(vec!["BROOKLYN", "BRPPKLYN", "BROKLYN", "QUEENS"])
            .unwrap();

        assert_eq!(clusters.len(), 1);
        assert_eq!(sorted(&clusters[0]), vec!["BROKLYN", "BROOKLYN", "BRPPKLYN"]);
        assert!(!clusters[0].contains("QUEENS"));
    }

    #[test]
    fn test_knn_hub_clusters_are_not_merged() {
        // a ~ b and b ~ c, but a and c are not similar.
        let chain = |a: &&str, b: &&str| {
            matches!(
                (*a, *b),
                ("aaaa", "aaab") | ("aaab", "aaaa") | ("aaab", "aabb") | ("aabb", "aaab")
            )
        };
        let first_char = |v: &&str| vec![v[..1].to_string()];

        let clusters = KnnClusterer::new(chain)
            .with_tokenizer(first_char)
            .clusters(vec!["aaaa", "aaab", "aabb"])
            .unwrap();

        let members: Vec<Vec<&str>> = clusters.iter().map(sorted).collect();
        assert_eq!(
            members,
            vec![
                vec!["aaaa", "aaab"],
                vec!["aaaa", "aaab", "aabb"],
                vec!["aaab", "aabb"],
            ]
        );
    }

    #[test]
    fn test_knn_counts_are_neighbor_weights() {
        let counts = BTreeMap::from([("BROOKLYN", 10usize), ("BROKLYN", 2), ("QUEENS", 5)]);
        let clusters = KnnClusterer::new(levenshtein_gt(0.7))
            .with_tokenizer(four_grams())
            .clusters(counts)
            .unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count("BROOKLYN"), Some(10));
        assert_eq!(clusters[0].count("BROKLYN"), Some(2));
        assert_eq!(*clusters[0].suggestion().unwrap(), "BROOKLYN");
    }

    #[test]
    fn test_knn_pairs_compared_once() {
        let calls = Cell::new(0usize);
        let always = |_: &&str, _: &&str| {
            calls.set(calls.get() + 1);
            true
        };
        // Both values share every 2-gram.
        let clusters = KnnClusterer::new(always)
            .with_tokenizer(NGrams::new(2).unwrap())
            .clusters(vec!["abcdef", "abcdeg"])
            .unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn test_knn_similarity_error_propagates() {
        use crate::function::similarity::Hamming;
        let sim = SimilarityConstraint::new(Hamming, Threshold::Ge(0.5)).unwrap();
        let result = KnnClusterer::new(sim)
            .with_tokenizer(four_grams())
            .clusters(vec!["BROOKLYN", "BROOKLY"]);
        assert!(matches!(result, Err(Error::Function(_))));
    }

    #[test]
    fn test_knn_tokenizer_error_propagates() {
        let reject_digits = |v: &&'static str| -> Result<Vec<String>> {
            if v.chars().any(|c| c.is_ascii_digit()) {
                return Err(Error::function(format!("cannot tokenize {v}")));
            }
            Ok(vec![v[..1].to_string()])
        };
        let result = KnnClusterer::new(levenshtein_gt(0.5))
            .with_tokenizer(FallibleTokens(reject_digits))
            .clusters(vec!["abc", "abd", "a1c"]);
        match result {
            Err(Error::Function(err)) => assert_eq!(err.to_string(), "cannot tokenize a1c"),
            other => panic!("expected tokenizer error, got {other:?}"),
        }
    }

    struct FallibleTokens<F>(F);

    impl<F> Tokenizer<&'static str> for FallibleTokens<F>
    where
        F: Fn(&&'static str) -> Result<Vec<String>>,
    {
        fn tokens(&self, value: &&'static str) -> Result<Vec<String>> {
            (self.0)(value)
        }
    }

    #[test]
    fn test_knn_invalid_minsize() {
        let result = KnnClusterer::new(levenshtein_gt(0.5))
            .with_minsize(0)
            .clusters(vec!["a", "b"]);
        assert!(matches!(
            result,
            Err(Error::InvalidParameter { name: "minsize", .. })
        ));

        let empty = KnnClusterer::new(levenshtein_gt(0.5))
            .with_minsize(0)
            .clusters(Vec::<&str>::new())
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_knn_collision_invalid_minsize() {
        let result = knn_collision_clusters(vec!["a"], levenshtein_gt(0.5), four_grams(), 0);
        assert!(matches!(
            result,
            Err(Error::InvalidParameter { name: "minsize", .. })
        ));
    }

    #[test]
    fn test_knn_collision_punctuation_variants() {
        let values = vec!["AMY/S PIZZA/S.", "AMY'S PIZZA", "AMMYS PIZZA"];
        let clusters =
            knn_collision_clusters(values, levenshtein_gt(0.9), four_grams(), 2).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(sorted(&clusters[0]), vec!["AMY'S PIZZA", "AMY/S PIZZA/S."]);
    }

    #[test]
    fn test_knn_collision_clusters() {
        let values = vec![
            "Tom Cruise",
            "Cruise, Tom",
            "tom cruise.",
            "Tom Cruse",
            "Brad Pitt",
            "Pitt, Brad",
            "Brad Pit",
            "New York",
            "york new",
            "Boston",
        ];
        let clusters =
            knn_collision_clusters(values.clone(), levenshtein_gt(0.8), four_grams(), 2).unwrap();

        let mut members: Vec<Vec<&str>> = clusters.iter().map(sorted).collect();
        members.sort();
        assert_eq!(
            members,
            vec![
                vec!["Brad Pit", "Brad Pitt", "Pitt, Brad"],
                vec!["Cruise, Tom", "Tom Cruise", "Tom Cruse", "tom cruise."],
                vec!["New York", "york new"],
            ]
        );

        // Plain kNN on the raw values only finds the single-edit pairs.
        let plain = knn_clusters(values, levenshtein_gt(0.8), four_grams(), 2, true).unwrap();
        assert_eq!(plain.len(), 2);
    }
}
