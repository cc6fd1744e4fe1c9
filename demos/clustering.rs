//! Key collision and kNN clustering of messy borough names.
//!
//! Run with `RUST_LOG=vcluster=debug` to see the clustering summaries.

use tracing_subscriber::EnvFilter;
use vcluster::cluster::{knn_collision_clusters, Clusterer, KeyCollision, KnnClusterer};
use vcluster::function::{Levenshtein, NGrams, SimilarityConstraint, Threshold};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let values = vec![
        "Brooklyn",
        "brooklyn",
        "BROOKLYN ",
        "Brooklin",
        "Brokklyn",
        "Queens",
        "queens.",
        "Queenz",
        "Manhattan",
        "manhattan",
        "Manhatan",
        "New York, NY",
        "NY New York",
        "Bronx",
    ];

    // --- Key collision (fingerprint) ---
    let clusters = KeyCollision::default()
        .clusters(values.clone())
        .expect("key collision");
    println!("=== Key collision (fingerprint) ===");
    for cluster in &clusters {
        let suggestion = cluster.suggestion().expect("non-empty cluster");
        let members: Vec<_> = cluster.cluster().iter().collect();
        println!("  {:12} => {:?}  {:?}", cluster.key(), suggestion, members);
    }

    // --- kNN (Levenshtein > 0.7, 4-gram blocking) ---
    let sim = SimilarityConstraint::new(Levenshtein, Threshold::Gt(0.7)).expect("threshold");
    let clusters = KnnClusterer::new(sim)
        .with_tokenizer(NGrams::new(4).expect("n-gram size"))
        .clusters(values.clone())
        .expect("knn");
    println!("\n=== kNN (Levenshtein > 0.7, 4-grams) ===");
    for cluster in &clusters {
        let mapping = cluster.to_mapping(None).expect("non-empty cluster");
        println!("  {:?}", mapping);
    }

    // --- kNN over fingerprint keys ---
    let clusters = knn_collision_clusters(
        values,
        sim,
        NGrams::new(4).expect("n-gram size"),
        2,
    )
    .expect("knn collision");
    println!("\n=== kNN over fingerprint keys ===");
    for cluster in &clusters {
        let suggestion = cluster.suggestion().expect("non-empty cluster");
        let members: Vec<_> = cluster.values().collect();
        println!("  {:?} <= {:?}", suggestion, members);
    }
}
