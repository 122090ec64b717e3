use std::sync::Arc;

use serde_json::json;

use super::report::round2;
use super::statistics::normal_cdf;
use super::*;
use crate::features::{DerivedFeatures, FeaturedGame, build};
use crate::store::GameRecord;

fn game(id: usize, developer: &str, positive: u64, negative: u64) -> GameRecord {
    GameRecord::new(format!("g{}", id), format!("Game {}", id))
        .with_developer(developer)
        .with_reviews(positive, negative)
}

/// `n` games with varied review volumes, all above the modeling threshold.
fn varied_games(n: usize) -> Vec<GameRecord> {
    (0..n)
        .map(|i| {
            let positive = 20 + (i as u64 * 37) % 500;
            let negative = 5 + (i as u64 * 13) % 80;
            game(i, &format!("Dev {}", i % 4), positive, negative)
        })
        .collect()
}

/// Developers with clearly separated review profiles.
fn developer_catalog(developers: &[(&str, usize, u64)]) -> Vec<GameRecord> {
    let mut records = Vec::new();
    let mut id = 0;
    for &(name, count, base) in developers {
        for j in 0..count as u64 {
            records.push(game(id, name, base + j, base / 10 + j % 3));
            id += 1;
        }
    }
    records
}

fn insufficient(result: Result<AnalysisReport, AnalysisError>) -> String {
    match result {
        Err(AnalysisError::InsufficientData { reason, .. }) => reason,
        other => panic!(
            "expected insufficient data, got {:?}",
            other.map(|r| r.model().to_string())
        ),
    }
}

// Classifier

#[test]
fn test_classifier_rejects_fewer_than_ten_games() {
    let classifier = DeveloperClassifier::default();

    for n in 0..10 {
        let games = build(developer_catalog(&[("A", n, 100)]));
        let reason = insufficient(classifier.analyze(&games));
        assert!(reason.contains("at least 10"), "{}", reason);
    }
}

#[test]
fn test_classifier_rejects_without_qualifying_developer() {
    let records: Vec<GameRecord> = (0..12)
        .map(|i| game(i, &format!("Solo {}", i), 100, 10))
        .collect();
    let result = DeveloperClassifier::default().analyze(&build(records));
    assert_eq!(result.as_ref().err().and_then(|e| e.developers_found()), Some(0));
    let reason = insufficient(result);
    assert!(reason.contains("no developer"), "{}", reason);
}

#[test]
fn test_twelve_game_scenario_selects_single_developer() {
    let mut records: Vec<GameRecord> = (0..4).map(|i| game(i, "A", 100, 10)).collect();
    records.extend((4..12).map(|i| game(i, &format!("Indie {}", i), 50 + i as u64, 3)));
    let games = build(records);

    let top = select_top_developers(&games, 3, 10);
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].developer, "A");
    assert_eq!(top[0].games, 4);

    // Four games remain after filtering, below the ten-game floor.
    let result = DeveloperClassifier::default().analyze(&games);
    assert_eq!(result.as_ref().err().and_then(|e| e.developers_found()), Some(1));
    let reason = insufficient(result);
    assert!(reason.contains("found 4 games across 1 developers"), "{}", reason);
}

#[test]
fn test_select_top_developers_ordering() {
    let mut records = developer_catalog(&[("B", 3, 10), ("A", 5, 10), ("C", 3, 10), ("D", 2, 10)]);
    records.push(game(99, "  ", 1, 1));
    let games = build(records);

    let top = select_top_developers(&games, 3, 10);
    let names: Vec<_> = top.iter().map(|d| d.developer.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C"]);

    let capped = select_top_developers(&games, 3, 2);
    assert_eq!(capped.len(), 2);
}

#[test]
fn test_classifier_report_on_separable_developers() {
    let records = developer_catalog(&[("Valve", 12, 5000), ("Indie", 10, 50), ("Mid", 8, 800)]);
    let games = build(records);
    let config = ClassifierConfig::default().with_estimators(30);

    let report = DeveloperClassifier::new(config).analyze(&games).unwrap();
    let AnalysisReport::Classifier(report) = report else {
        panic!("expected classifier report");
    };

    assert_eq!(report.developers_found, 3);
    assert_eq!(report.total_games, 30);
    assert_eq!(report.total_games_all, 30);
    assert!(report.stratified);
    assert!(report.accuracy > 0.9, "accuracy {}", report.accuracy);
    assert_eq!(report.predictions.len(), 30);

    let stats: Vec<_> = report
        .developer_stats
        .iter()
        .map(|d| (d.developer.as_str(), d.games))
        .collect();
    assert_eq!(stats, vec![("Valve", 12), ("Indie", 10), ("Mid", 8)]);

    assert_eq!(report.games_by_developer.len(), 9);
    // Highest total reviews first within each developer.
    assert_eq!(report.games_by_developer[0].id, "g11");

    let labels = serde_json::to_value(&report).unwrap();
    assert!(labels.get("visualization").is_some());
    assert_eq!(labels["model"], json!("Random Forest - Developer Classification"));
}

#[test]
fn test_classifier_falls_back_to_unstratified_split() {
    // Ten classes of three: the 9-row test side cannot hold one of each.
    let developers: Vec<(String, usize, u64)> = (0..10)
        .map(|i| (format!("Studio {}", i), 3, 100 * (i as u64 + 1)))
        .collect();
    let borrowed: Vec<(&str, usize, u64)> = developers
        .iter()
        .map(|(n, c, b)| (n.as_str(), *c, *b))
        .collect();
    let games = build(developer_catalog(&borrowed));

    let AnalysisReport::Classifier(report) = DeveloperClassifier::new(
        ClassifierConfig::default().with_estimators(10),
    )
    .analyze(&games)
    .unwrap() else {
        panic!("expected classifier report");
    };

    assert!(!report.stratified);
    assert_eq!(report.developers_found, 10);
    assert!((0.0..=1.0).contains(&report.accuracy));
}

#[test]
fn test_unknown_developer_is_a_class() {
    let mut records = developer_catalog(&[("Known", 6, 300)]);
    records.extend((0..6).map(|i| {
        GameRecord::new(format!("u{}", i), "Anon").with_reviews(20 + i, 2)
    }));
    let games = build(records);

    let top = select_top_developers(&games, 3, 10);
    assert!(top.iter().any(|d| d.developer == "Unknown" && d.games == 6));
}

// Scorer

#[test]
fn test_relevance_heuristic_bounds() {
    for record in varied_games(60) {
        let features = DerivedFeatures::derive(&record);
        assert!(features.total_reviews >= 10.0);
        let score = relevance_heuristic(&features);
        assert!((0.0..=100.0).contains(&score), "{}", score);
    }

    let none = DerivedFeatures::derive(&game(0, "A", 0, 0));
    assert_eq!(relevance_heuristic(&none), 0.0);

    let huge = DerivedFeatures::derive(&game(0, "A", u32::MAX as u64, 0));
    assert_eq!(relevance_heuristic(&huge), 100.0);
}

#[test]
fn test_scorer_rejects_fewer_than_fifty_reviewed_games() {
    let mut records = varied_games(49);
    records.extend((100..130).map(|i| game(i, "Quiet", 3, 2)));

    let reason = insufficient(RelevanceScorer::default().analyze(&build(records)));
    assert!(reason.contains("found 49"), "{}", reason);
}

#[test]
fn test_scorer_report() {
    let games = build(varied_games(80));
    let AnalysisReport::Scorer(report) = RelevanceScorer::default().analyze(&games).unwrap() else {
        panic!("expected scorer report");
    };

    assert_eq!(report.total_games_analyzed, 80);
    assert_eq!(report.top_games.len(), 20);
    assert!(report.r2_score.is_finite());
    assert!(report.mse >= 0.0 && report.mae >= 0.0);
    assert!(
        report
            .top_games
            .windows(2)
            .all(|w| w[0].predicted_score >= w[1].predicted_score)
    );
}

// Clusterer

#[test]
fn test_elbow_range() {
    assert_eq!(elbow_range(50, 10), 2..5);
    assert_eq!(elbow_range(500, 10), 2..10);
    assert!(elbow_range(15, 10).is_empty());
}

#[test]
fn test_clusterer_rejects_small_sets() {
    let reason = insufficient(ThematicClusterer::default().analyze(&build(varied_games(49))));
    assert!(reason.contains("found 49"), "{}", reason);
}

#[test]
fn test_clusterer_report_invariants() {
    let games = build(varied_games(120));
    let AnalysisReport::Clusterer(report) = ThematicClusterer::default().analyze(&games).unwrap()
    else {
        panic!("expected clusterer report");
    };

    assert_eq!(report.n_clusters, 5);
    assert_eq!(report.cluster_stats.len(), 5);
    assert_eq!(
        report.cluster_stats.iter().map(|s| s.games).sum::<usize>(),
        120
    );
    assert_eq!(report.reference_id, "g0");
    assert!(report.reference_in_analyzed_set);
    assert!(report.cluster_games.len() <= 20);
    assert_eq!(report.cluster_games[0].id, "g0");
    assert!(
        report
            .cluster_games
            .iter()
            .all(|p| p.cluster == report.reference_cluster)
    );

    let elbow = report.elbow_curve.as_ref().expect("elbow enabled by default");
    let ks: Vec<usize> = elbow.iter().map(|p| p.k).collect();
    assert_eq!(ks, (2..10).collect::<Vec<_>>());
}

#[test]
fn test_outlier_reference_is_its_own_peer() {
    let mut records = vec![game(777, "Megahit", 5_000_000, 400_000)];
    records.extend(varied_games(60));
    let games = build(records);

    let AnalysisReport::Clusterer(report) = ThematicClusterer::default().analyze(&games).unwrap()
    else {
        panic!("expected clusterer report");
    };

    assert!(report.reference_in_analyzed_set);
    assert!(!report.cluster_games.is_empty());
    assert!(
        report
            .cluster_games
            .iter()
            .any(|p| p.cluster == report.reference_cluster)
    );
    assert_eq!(report.cluster_games[0].id, "g777");
}

#[test]
fn test_elbow_does_not_change_partition() {
    let games = build(varied_games(90));
    let with = ThematicClusterer::new(ClustererConfig::default()).analyze(&games).unwrap();
    let without = ThematicClusterer::new(ClustererConfig::default().with_elbow(false))
        .analyze(&games)
        .unwrap();

    let (AnalysisReport::Clusterer(a), AnalysisReport::Clusterer(b)) = (with, without) else {
        panic!("expected clusterer reports");
    };
    assert_eq!(a.assignments, b.assignments);
    assert_eq!(a.reference_cluster, b.reference_cluster);
    assert!(b.elbow_curve.is_none());
}

#[test]
fn test_clusterer_reference_below_review_threshold() {
    let mut records = vec![game(999, "Tiny", 2, 1)];
    records.extend(varied_games(60));
    let games = build(records);

    let AnalysisReport::Clusterer(report) = ThematicClusterer::default().analyze(&games).unwrap()
    else {
        panic!("expected clusterer report");
    };

    assert_eq!(report.reference_id, "g999");
    assert!(!report.reference_in_analyzed_set);
    assert_eq!(report.total_games_analyzed, 60);
    assert!(report.reference_cluster < 5);
    assert!(
        report
            .cluster_games
            .iter()
            .all(|p| p.cluster == report.reference_cluster)
    );
}

// Idempotence

#[test]
fn test_repeated_calls_are_identical() {
    let classifier_games = build(developer_catalog(&[("A", 10, 900), ("B", 10, 90)]));
    let modeling_games = build(varied_games(70));
    let suite = AnalysisSuite::default();

    for (kind, games) in [
        (AnalysisKind::RandomForest, &classifier_games),
        (AnalysisKind::XGBoost, &modeling_games),
        (AnalysisKind::KMeans, &modeling_games),
    ] {
        let first = suite.get(kind).analyze(games).unwrap();
        let second = suite.get(kind).analyze(games).unwrap();
        assert_eq!(first, second, "{} not reproducible", kind);
    }
}

// Pipeline

#[tokio::test]
async fn test_run_empty_is_no_data() {
    let suite = Arc::new(AnalysisSuite::default());
    for kind in AnalysisKind::ALL {
        let result = run(suite.clone(), kind, Vec::new()).await;
        assert!(matches!(result, Err(AnalysisError::NoData)));
    }
}

#[tokio::test]
async fn test_run_all_isolates_failures() {
    let suite = Arc::new(AnalysisSuite::default());
    let outcomes = run_all(suite, developer_catalog(&[("A", 12, 500), ("B", 12, 40)]))
        .await
        .unwrap();

    let keys: Vec<_> = outcomes.iter().map(|(k, _)| k.key()).collect();
    assert_eq!(keys, vec!["random_forest", "xgboost", "kmeans"]);
    assert!(outcomes[0].1.is_ok());
    assert!(matches!(
        outcomes[1].1,
        Err(AnalysisError::InsufficientData { .. })
    ));
    assert!(matches!(
        outcomes[2].1,
        Err(AnalysisError::InsufficientData { .. })
    ));
}

#[test]
fn test_analysis_kind_keys() {
    for kind in AnalysisKind::ALL {
        assert_eq!(kind.key().parse::<AnalysisKind>(), Ok(kind));
        assert_eq!(suite_kind(kind), kind);
    }
    assert!("svm".parse::<AnalysisKind>().is_err());
}

fn suite_kind(kind: AnalysisKind) -> AnalysisKind {
    AnalysisSuite::default().get(kind).kind()
}

// Statistics

#[test]
fn test_describe_counts_only_non_negative_numbers() {
    let records = vec![
        game(0, "A", 1, 0),
        game(1, "A", 2, 0),
        game(2, "A", 3, 0),
        game(3, "A", 4, 0),
        GameRecord::new("s", "String").with_reviews("100", 0),
        GameRecord::new("n", "Negative").with_reviews(-5, 0),
        GameRecord::new("m", "Missing"),
    ];

    let report = describe(StatVariable::Positive, &records).unwrap();
    assert_eq!(report.stats.count, 4);
    assert_eq!(report.stats.mean, 2.5);
    assert_eq!(report.stats.median, 2.5);
    assert_eq!(report.stats.min, 1.0);
    assert_eq!(report.stats.max, 4.0);
    assert!((report.stats.std_dev - 1.25f64.sqrt()).abs() < 1e-12);

    let crate::visualization::ChartPanel::Line { series, .. } = &report.visualization.panels[0]
    else {
        panic!("expected line panel");
    };
    assert_eq!(series[0].y, vec![0.25, 0.5, 0.75, 1.0]);
    assert!(series[1].y.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_describe_no_values_is_no_data() {
    let records = vec![GameRecord::new("a", "A").with_price("free")];
    assert!(matches!(
        describe(StatVariable::Price, &records),
        Err(AnalysisError::NoData)
    ));
}

#[test]
fn test_stat_variable_parsing() {
    assert_eq!(
        "median_playtime".parse::<StatVariable>().unwrap(),
        StatVariable::MedianPlaytime
    );
    let err = "owners".parse::<StatVariable>().unwrap_err();
    assert!(matches!(err, AnalysisError::UnknownVariable { .. }));
    assert!(err.to_string().contains("average_playtime"));
}

#[test]
fn test_normal_cdf() {
    assert!((normal_cdf(0.0, 0.0, 1.0) - 0.5).abs() < 1e-9);
    assert_eq!(normal_cdf(2.0, 2.0, 0.0), 1.0);
    assert_eq!(normal_cdf(1.9, 2.0, 0.0), 0.0);
}

#[test]
fn test_round2() {
    assert_eq!(round2(1.23456), 1.23);
    assert_eq!(round2(2.0 / 3.0), 0.67);
}

#[test]
fn test_featured_game_means() {
    let games: Vec<FeaturedGame> = build(vec![game(0, "A", 10, 0), game(1, "A", 30, 10)]);
    let means = report::GroupMeans::of(&games);
    assert_eq!(means.mean_positive, 20.0);
    assert_eq!(means.mean_negative, 5.0);
    assert_eq!(means.mean_total_reviews, 25.0);
    assert_eq!(means.mean_review_ratio, 0.88);
}
