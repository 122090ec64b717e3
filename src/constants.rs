//! Cross-cutting, shared constants.
//!
//! Retrieval caps and algorithm defaults live here so the retriever, the three analyzers and
//! the gateway agree on them. Per-call overrides go through the config structs
//! ([`RetrievalConfig`](crate::retrieval::RetrievalConfig),
//! [`ClassifierConfig`](crate::analysis::ClassifierConfig), ...); these values are their defaults.

/// Max records returned when no search text is given.
pub const UNFILTERED_RECORD_CAP: usize = 1000;
/// Max records returned when a search text narrows the catalog.
pub const FILTERED_RECORD_CAP: usize = 500;
/// Candidate pool handed to the vector index for each similarity search.
pub const VECTOR_CANDIDATE_POOL: usize = 1000;
/// Hard deadline for the embedder round-trip.
pub const DEFAULT_EMBED_TIMEOUT_SECS: u64 = 10;

/// Sentinel developer name for missing, blank or non-string developers.
pub const UNKNOWN_DEVELOPER: &str = "Unknown";

/// Seed shared by every randomized step (splits, bootstraps, k-means restarts).
pub const DEFAULT_SEED: u64 = 42;
/// Fraction of rows held out for evaluation.
pub const DEFAULT_TEST_FRACTION: f64 = 0.3;

/// Minimum total reviews for a game to enter the scorer and the clusterer.
pub const MIN_REVIEWS_FOR_MODELING: f64 = 10.0;
/// Minimum kept rows for the scorer and the clusterer.
pub const MIN_MODELING_ROWS: usize = 50;
/// Minimum rows (overall and after developer filtering) for the classifier.
pub const MIN_CLASSIFIER_ROWS: usize = 10;
/// A developer needs at least this many games to become a class.
pub const MIN_GAMES_PER_DEVELOPER: usize = 3;
/// Max classes kept by the classifier.
pub const MAX_TOP_DEVELOPERS: usize = 10;

/// Fixed partition size of the clusterer.
pub const DEFAULT_CLUSTER_COUNT: usize = 5;
/// Upper bound (exclusive) of the elbow sweep.
pub const ELBOW_MAX_K: usize = 10;

/// Number of rows shown in sampled report tables.
pub const TOP_GAMES_SAMPLE: usize = 20;
/// Peers listed next to the reference game.
pub const CLUSTER_PEER_SAMPLE: usize = 20;

/// Max records scanned by the statistics endpoint.
pub const STATISTICS_RECORD_CAP: usize = 100_000;

/// `/games` page size when no `limit` is given.
pub const GAMES_DEFAULT_LIMIT: usize = 100;
/// Largest `/games` page.
pub const GAMES_MAX_LIMIT: usize = 1000;
/// Results of the `/search` name lookup.
pub const NAME_SEARCH_LIMIT: usize = 10;
/// Results of the `/vector-search` endpoint.
pub const VECTOR_SEARCH_LIMIT: usize = 10;
/// Candidate pool of the `/vector-search` endpoint.
pub const VECTOR_SEARCH_CANDIDATES: usize = 100;
