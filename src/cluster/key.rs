//! Key collision clustering.
//!
//! Every distinct value is mapped to a key by a [`KeyFunction`]; values whose
//! keys collide form one cluster.
//!
//! ## Algorithm
//!
//! 1. Return `[]` for empty input, before any parameter check. Otherwise
//!    resolve the input into distinct `(value, count)` pairs.
//! 2. Prepare the key function once, if it asks for it.
//! 3. Compute one key per distinct value. With `threads > 1` this runs on a
//!    dedicated worker pool; results come back in input order.
//! 4. Stable-sort `(key, value)` pairs by key.
//! 5. Sweep the sorted pairs, starting a new cluster whenever the key changes.
//! 6. Keep clusters with at least `minsize` distinct values.
//!
//! The sort in step 4 happens for every thread count, so the output is the
//! same for one thread or many: clusters in ascending key order, members in
//! input order.

use std::borrow::Cow;
use std::hash::Hash;

use rayon::prelude::*;
use tracing::debug;

use super::base::Cluster;
use super::input::Values;
use super::traits::Clusterer;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::function::key::{Fingerprint, KeyFunction};

/// A cluster whose members all share one collision key.
#[derive(Debug, Clone)]
pub struct KeyCollisionCluster<V> {
    key: String,
    cluster: Cluster<V>,
}

impl<V: Eq + Hash> PartialEq for KeyCollisionCluster<V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.cluster == other.cluster
    }
}

impl<V: Eq + Hash> Eq for KeyCollisionCluster<V> {}

impl<V: Clone + Eq + Hash> KeyCollisionCluster<V> {
    /// Create an empty cluster for `key`.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            cluster: Cluster::new(),
        }
    }

    /// Add `count` occurrences of `value`. See [`Cluster::add`].
    pub fn add(&mut self, value: V, count: usize) -> Result<&mut Self> {
        self.cluster.add(value, count)?;
        Ok(self)
    }

    /// The most frequent member. See [`Cluster::suggestion`].
    pub fn suggestion(&self) -> Result<&V> {
        self.cluster.suggestion()
    }
}

impl<V> KeyCollisionCluster<V> {
    /// The key shared by all members.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The member values and their counts.
    pub fn cluster(&self) -> &Cluster<V> {
        &self.cluster
    }

    /// Number of distinct members.
    pub fn len(&self) -> usize {
        self.cluster.len()
    }

    /// True if the cluster has no members.
    pub fn is_empty(&self) -> bool {
        self.cluster.is_empty()
    }

    /// Split into key and cluster.
    pub fn into_parts(self) -> (String, Cluster<V>) {
        (self.key, self.cluster)
    }
}

impl<V> From<KeyCollisionCluster<V>> for Cluster<V> {
    fn from(cluster: KeyCollisionCluster<V>) -> Self {
        cluster.cluster
    }
}

/// Key collision clusterer.
#[derive(Debug, Clone)]
pub struct KeyCollision<K> {
    func: K,
    minsize: usize,
    threads: usize,
}

impl Default for KeyCollision<Fingerprint> {
    /// Fingerprint keys, `minsize = 2`, thread count from the environment.
    fn default() -> Self {
        Self::new(Fingerprint::new())
    }
}

impl<K> KeyCollision<K> {
    /// Create a clusterer using `func` to compute keys.
    ///
    /// Defaults: `minsize = 2`; `threads` from [`Config::from_env`].
    pub fn new(func: K) -> Self {
        Self {
            func,
            minsize: 2,
            threads: Config::from_env().threads,
        }
    }

    /// Set the minimum number of distinct values per returned cluster.
    pub fn with_minsize(mut self, minsize: usize) -> Self {
        self.minsize = minsize;
        self
    }

    /// Set the number of worker threads used to compute keys.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Configured number of worker threads.
    pub fn threads(&self) -> usize {
        self.threads
    }

    fn validate(&self) -> Result<()> {
        if self.minsize == 0 {
            return Err(Error::InvalidParameter {
                name: "minsize",
                message: "must be at least 1",
            });
        }
        if self.threads == 0 {
            return Err(Error::InvalidParameter {
                name: "threads",
                message: "must be at least 1",
            });
        }
        Ok(())
    }
}

impl<V, K> Clusterer<V> for KeyCollision<K>
where
    V: Clone + Eq + Hash + Send + Sync,
    K: KeyFunction<V> + Clone,
{
    type Output = KeyCollisionCluster<V>;

    fn clusters<I>(&self, values: I) -> Result<Vec<KeyCollisionCluster<V>>>
    where
        I: Into<Values<V>>,
    {
        let values = values.into();
        if values.is_empty() {
            return Ok(Vec::new());
        }
        self.validate()?;
        let values = values.resolve()?;
        let n_values = values.len();

        let func: Cow<'_, K> = if self.func.is_prepared() {
            Cow::Borrowed(&self.func)
        } else {
            let mut func = self.func.clone();
            func.prepare(&values)?;
            Cow::Owned(func)
        };

        let keys = compute_keys(&*func, &values, self.threads)?;
        let mut keyed: Vec<(String, V, usize)> = keys
            .into_iter()
            .zip(values)
            .map(|(key, (value, count))| (key, value, count))
            .collect();
        // Stable: members with equal keys keep their input order.
        keyed.sort_by(|a, b| a.0.cmp(&b.0));

        let mut clusters = Vec::new();
        let mut current: Option<KeyCollisionCluster<V>> = None;
        for (key, value, count) in keyed {
            let same_key = current.as_ref().is_some_and(|c| c.key == key);
            if !same_key {
                if let Some(done) = current.take() {
                    if done.len() >= self.minsize {
                        clusters.push(done);
                    }
                }
                current = Some(KeyCollisionCluster::new(key));
            }
            if let Some(cluster) = current.as_mut() {
                cluster.cluster.add_unchecked(value, count);
            }
        }
        if let Some(done) = current {
            if done.len() >= self.minsize {
                clusters.push(done);
            }
        }

        debug!(
            values = n_values,
            threads = self.threads,
            minsize = self.minsize,
            clusters = clusters.len(),
            "key collision clustering finished"
        );
        Ok(clusters)
    }

    fn minsize(&self) -> usize {
        self.minsize
    }
}

/// One key per value, in input order.
///
/// Any key function error aborts the whole computation.
fn compute_keys<V, K>(func: &K, values: &[(V, usize)], threads: usize) -> Result<Vec<String>>
where
    V: Sync,
    K: KeyFunction<V> + ?Sized,
{
    if threads <= 1 {
        return values.iter().map(|(value, _)| func.key(value)).collect();
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| Error::ThreadPool(e.to_string()))?;
    pool.install(|| {
        values
            .par_iter()
            .map(|(value, _)| func.key(value))
            .collect()
    })
}

/// Run key collision clustering over `values`.
///
/// `threads = None` takes the thread count from the environment.
pub fn key_collision<V, K, I>(
    values: I,
    func: K,
    minsize: usize,
    threads: Option<usize>,
) -> Result<Vec<KeyCollisionCluster<V>>>
where
    V: Clone + Eq + Hash + Send + Sync,
    K: KeyFunction<V> + Clone,
    I: Into<Values<V>>,
{
    let mut clusterer = KeyCollision::new(func).with_minsize(minsize);
    if let Some(threads) = threads {
        clusterer = clusterer.with_threads(threads);
    }
    clusterer.clusters(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn lower(value: &&str) -> String {
        value.to_lowercase()
    }

    fn suggestions(clusters: &[KeyCollisionCluster<&'static str>]) -> HashSet<&'static str> {
        clusters.iter().map(|c| *c.suggestion().unwrap()).collect()
    }

    #[test]
    fn test_key_collision_lower_case() {
        let clusters = KeyCollision::new(lower)
            .with_threads(1)
            .clusters(vec!["a", "A", "b", "B", "C"])
            .unwrap();

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].key(), "a");
        assert_eq!(clusters[1].key(), "b");
        assert!(["a", "A"].contains(clusters[0].suggestion().unwrap()));
        assert!(["b", "B"].contains(clusters[1].suggestion().unwrap()));
        assert!(clusters.iter().all(|c| !c.cluster().contains("C")));
    }

    #[test]
    fn test_key_collision_empty() {
        let clusters = KeyCollision::new(lower)
            .clusters(Vec::<&str>::new())
            .unwrap();
        assert!(clusters.is_empty());
    }

    #[test]
    fn test_key_collision_minsize() {
        let values = vec!["a", "b", "c", "A"];
        for threads in [1, 2] {
            let clusters = key_collision(values.clone(), lower, 2, Some(threads)).unwrap();
            assert_eq!(suggestions(&clusters), HashSet::from(["a"]));

            let clusters = key_collision(values.clone(), lower, 1, Some(threads)).unwrap();
            assert_eq!(suggestions(&clusters), HashSet::from(["a", "b", "c"]));
        }
    }

    #[test]
    fn test_key_collision_parallel_matches_sequential() {
        let values: Vec<String> = (0..500)
            .map(|i| format!("{}-{}", i % 37, if i % 2 == 0 { "X" } else { "x" }))
            .collect();
        let key = |v: &String| v.to_lowercase();

        let sequential = KeyCollision::new(key)
            .with_threads(1)
            .clusters(values.clone())
            .unwrap();
        let parallel = KeyCollision::new(key)
            .with_threads(4)
            .clusters(values)
            .unwrap();
        assert!(!sequential.is_empty());
        assert_eq!(sequential, parallel);
        for (a, b) in sequential.iter().zip(&parallel) {
            let a: Vec<_> = a.cluster().iter().collect();
            let b: Vec<_> = b.cluster().iter().collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_key_collision_with_counts() {
        let counts: BTreeMap<&str, usize> = BTreeMap::from([("NYC", 10), ("nyc", 3), ("Boston", 4)]);
        let clusters = KeyCollision::new(lower)
            .with_threads(1)
            .clusters(counts)
            .unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].key(), "nyc");
        assert_eq!(*clusters[0].suggestion().unwrap(), "NYC");
        assert_eq!(clusters[0].cluster().count("nyc"), Some(3));
    }

    #[test]
    fn test_repeated_values_are_counted() {
        let clusters = KeyCollision::new(lower)
            .with_threads(1)
            .clusters(vec!["a", "A", "A", "A", "a"])
            .unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(*clusters[0].suggestion().unwrap(), "A");
        assert_eq!(clusters[0].cluster().total(), 5);
    }

    #[test]
    fn test_default_fingerprint_clusters() {
        let clusters = KeyCollision::default()
            .with_threads(1)
            .clusters(vec!["A B", "B C", "B   c", "C\tb"])
            .unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 3);
        assert_eq!(clusters[0].key(), "b c");
    }

    #[derive(Clone)]
    struct FrequencyBand {
        prepare_calls: Arc<AtomicUsize>,
        counts: Option<HashMap<&'static str, usize>>,
    }

    impl KeyFunction<&'static str> for FrequencyBand {
        fn key(&self, value: &&'static str) -> Result<String> {
            let counts = self.counts.as_ref().ok_or(Error::InvalidParameter {
                name: "counts",
                message: "not prepared",
            })?;
            let band = if counts[value] >= 3 { "common" } else { "rare" };
            Ok(band.to_string())
        }

        fn is_prepared(&self) -> bool {
            self.counts.is_some()
        }

        fn prepare(&mut self, values: &[(&'static str, usize)]) -> Result<()> {
            self.prepare_calls.fetch_add(1, Ordering::SeqCst);
            self.counts = Some(values.iter().copied().collect());
            Ok(())
        }
    }

    #[test]
    fn test_prepare_runs_once_per_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let func = FrequencyBand {
            prepare_calls: Arc::clone(&calls),
            counts: None,
        };
        let clusterer = KeyCollision::new(func).with_threads(3);
        let values = vec!["x", "x", "x", "y", "y", "y", "z", "w"];

        let clusters = clusterer.clusters(values.clone()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].key(), "common");
        assert_eq!(clusters[1].key(), "rare");

        clusterer.clusters(values).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[derive(Debug)]
    struct Unsupported(String);

    impl std::fmt::Display for Unsupported {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "unsupported value {}", self.0)
        }
    }

    impl std::error::Error for Unsupported {}

    #[derive(Clone)]
    struct RejectDigits;

    impl KeyFunction<&'static str> for RejectDigits {
        fn key(&self, value: &&'static str) -> Result<String> {
            if value.chars().any(|c| c.is_ascii_digit()) {
                return Err(Error::function(Unsupported(value.to_string())));
            }
            Ok(value.to_lowercase())
        }
    }

    #[test]
    fn test_key_function_error_propagates() {
        let values = vec!["a", "A", "b", "7", "B"];
        for threads in [1, 4] {
            let err = KeyCollision::new(RejectDigits)
                .with_threads(threads)
                .clusters(values.clone())
                .unwrap_err();
            assert!(matches!(err, Error::Function(_)));
            assert_eq!(err.to_string(), "unsupported value 7");
        }
    }

    #[test]
    fn test_invalid_parameters() {
        let zero_min = KeyCollision::new(lower).with_minsize(0);
        assert!(zero_min.clusters(vec!["a"]).is_err());

        let zero_threads = KeyCollision::new(lower).with_threads(0);
        assert!(zero_threads.clusters(vec!["a"]).is_err());
    }

    #[test]
    fn test_empty_input_skips_validation() {
        let clusters = KeyCollision::new(lower)
            .with_minsize(0)
            .with_threads(0)
            .clusters(Vec::<&str>::new())
            .unwrap();
        assert!(clusters.is_empty());
    }
}
