//! Near-duplicate value clustering.
//!
//! `vcluster` groups data values that probably denote the same real-world
//! entity ("New York", "new york", "NYC ") and suggests a canonical value per
//! group, for data cleaning and deduplication.
//!
//! The primary public API is under [`cluster`], which provides:
//! - key collision clustering (fingerprint keys, optional worker pool)
//! - nearest-neighbor clustering with n-gram blocking
//! - [`ClusterIndex`], a prefix tree for dropping repeated clusters
//!
//! Key, token and similarity functions live under [`function`].

#![forbid(unsafe_code)]

pub mod cluster;
pub mod config;
pub mod error;
pub mod function;

pub use cluster::{
    key_collision, knn_clusters, knn_collision_clusters, Cluster, ClusterIndex, Clusterer,
    KeyCollision, KeyCollisionCluster, KnnClusterer, Values,
};
pub use config::Config;
pub use error::{Error, Result};
