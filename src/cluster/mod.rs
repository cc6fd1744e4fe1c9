//! Clustering of near-duplicate data values.
//!
//! Values are strings in practice (city names, people, product labels) but the
//! clusterers are generic over any hashable value type, with text-specific key,
//! token and similarity functions living in [`crate::function`].
//!
//! Input is either a list of values, in which repeats are counted, or an
//! explicit frequency map (see [`Values`]).
//!
//! ## Algorithms
//!
//! ### Key collision
//!
//! Each distinct value is mapped to a key, and values with the same key are
//! grouped. Cheap (one key per value, optionally computed on a worker pool)
//! and exact: the clusters partition the values that share a key.
//!
//! The default key is the token [`Fingerprint`](crate::function::Fingerprint):
//! normalize, split on whitespace, sort, dedupe and join.
//!
//! ### Nearest neighbor (kNN)
//!
//! Values are blocked by shared tokens, compared pairwise inside each block
//! with a similarity predicate, and every value with neighbors yields a star
//! cluster of itself plus its neighbors. Clusters can overlap. Catches typos
//! that no key function would normalize away, at the cost of pairwise
//! comparisons.
//!
//! [`knn_collision_clusters`] chains the two: kNN runs over fingerprint keys
//! and the key groups are expanded back to the original values.
//!
//! ## Usage
//!
//! ```rust
//! use vcluster::cluster::{Clusterer, KeyCollision, KnnClusterer};
//! use vcluster::function::{Levenshtein, NGrams, SimilarityConstraint, Threshold};
//!
//! let values = vec!["Tom Cruise", "Cruise, Tom", "tom cruise", "Brad Pitt"];
//!
//! let clusters = KeyCollision::default().clusters(values).unwrap();
//! assert_eq!(clusters.len(), 1);
//! assert_eq!(clusters[0].key(), "cruise tom");
//!
//! let sim = SimilarityConstraint::new(Levenshtein, Threshold::Gt(0.7)).unwrap();
//! let clusters = KnnClusterer::new(sim)
//!     .with_tokenizer(NGrams::new(4).unwrap())
//!     .clusters(vec!["BROOKLYN", "BRPPKLYN", "BROKLYN", "QUEENS"])
//!     .unwrap();
//! assert_eq!(clusters.len(), 1);
//! assert_eq!(clusters[0].len(), 3);
//! ```

mod base;
mod index;
mod input;
mod key;
mod knn;
mod traits;

pub use base::{Cluster, Iter};
pub use index::ClusterIndex;
pub use input::Values;
pub use key::{key_collision, KeyCollision, KeyCollisionCluster};
pub use knn::{knn_clusters, knn_collision_clusters, KnnClusterer};
pub use traits::Clusterer;
