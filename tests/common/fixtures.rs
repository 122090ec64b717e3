//! Synthetic catalogs shared by the integration tests.

use serde_json::json;

use playlens::store::{GameRecord, MockRecordStore};
use playlens::{
    AnalysisSuite, ClassifierConfig, ClustererConfig, ScorerConfig, StubEmbedder,
};

/// `n` games spread over `studios` developers, all with 10+ reviews.
pub fn catalog(n: usize, studios: usize) -> Vec<GameRecord> {
    (0..n)
        .map(|i| {
            GameRecord::new(format!("g{}", i), format!("Game {}", i))
                .with_developer(format!("Studio {}", i % studios.max(1)))
                .with_reviews(json!(12 + i * 13), json!(2 + (i % 6) * 5))
                .with_playtime(json!(i * 4), json!(i * 2))
                .with_price(json!((i % 5) as f64 * 4.99))
        })
        .collect()
}

/// Twelve games: four by "A" (100/10 reviews), eight singleton developers.
pub fn twelve_game_scenario() -> Vec<GameRecord> {
    let mut games: Vec<GameRecord> = (0..4)
        .map(|i| {
            GameRecord::new(format!("a{}", i), format!("A Game {}", i))
                .with_developer("A")
                .with_reviews(json!(100), json!(10))
        })
        .collect();
    games.extend((0..8).map(|i| {
        GameRecord::new(format!("s{}", i), format!("Solo {}", i))
            .with_developer(format!("Solo Dev {}", i))
            .with_reviews(json!(20 + i), json!(5))
    }));
    games
}

/// Catalog lines in the ingestion format.
pub fn jsonl(records: &[GameRecord]) -> String {
    records
        .iter()
        .map(|r| {
            let mut value = serde_json::to_value(r).unwrap();
            if let Some(obj) = value.as_object_mut()
                && let Some(id) = obj.remove("id")
            {
                obj.insert("_id".to_string(), id);
            }
            value.to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Store whose records carry stub embeddings of `"<name> <developer>"`.
pub fn embedded_store(records: Vec<GameRecord>) -> MockRecordStore {
    let stub = StubEmbedder::default();
    MockRecordStore::with_embedded_records(
        records
            .into_iter()
            .map(|r| {
                let text = format!("{} {}", r.name, r.developer.as_str().unwrap_or_default());
                let vector = stub.embed_sync(&text);
                (r, Some(vector))
            })
            .collect(),
    )
}

/// Analyzer settings small enough for debug-build tests.
pub fn fast_suite() -> AnalysisSuite {
    AnalysisSuite::new(
        ClassifierConfig::default().with_estimators(10),
        ScorerConfig::default().with_estimators(20),
        ClustererConfig::default().with_n_init(2),
    )
}
