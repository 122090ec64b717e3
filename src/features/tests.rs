use serde_json::{Value, json};

use super::*;

fn record(positive: Value, negative: Value) -> GameRecord {
    GameRecord::new("g", "Game").with_reviews(positive, negative)
}

#[test]
fn test_total_and_ratio() {
    let f = DerivedFeatures::derive(&record(json!(75), json!(25)));

    assert_eq!(f.positive, 75.0);
    assert_eq!(f.negative, 25.0);
    assert_eq!(f.total_reviews, 100.0);
    assert!((f.review_ratio - 0.75).abs() < 1e-12);
}

#[test]
fn test_zero_reviews_ratio_is_zero() {
    let f = DerivedFeatures::derive(&record(json!(0), json!(0)));
    assert_eq!(f.total_reviews, 0.0);
    assert_eq!(f.review_ratio, 0.0);
}

#[test]
fn test_malformed_counts_become_zero() {
    let cases = [
        (json!("lots"), json!(null)),
        (json!(null), json!({"n": 3})),
        (json!([1, 2]), json!(true)),
        (json!(-5), json!("NaN")),
        (json!("inf"), json!(-0.5)),
    ];

    for (positive, negative) in cases {
        let f = DerivedFeatures::derive(&record(positive.clone(), negative.clone()));
        assert_eq!(f.total_reviews, 0.0, "{} / {}", positive, negative);
        assert_eq!(f.review_ratio, 0.0);
    }
}

#[test]
fn test_numeric_strings_are_parsed() {
    let f = DerivedFeatures::derive(&record(json!(" 30 "), json!("10.0")));
    assert_eq!(f.positive, 30.0);
    assert_eq!(f.negative, 10.0);
    assert!((f.review_ratio - 0.75).abs() < 1e-12);
}

#[test]
fn test_invariants_hold_over_mixed_inputs() {
    let values = [
        json!(0),
        json!(1),
        json!(17.5),
        json!("42"),
        json!("x"),
        json!(null),
        json!(-3),
        json!(1_000_000),
    ];

    for p in &values {
        for n in &values {
            let f = DerivedFeatures::derive(&record(p.clone(), n.clone()));
            assert_eq!(f.total_reviews, f.positive + f.negative);
            assert!(f.total_reviews >= 0.0);
            assert!((0.0..=1.0).contains(&f.review_ratio));
            if f.total_reviews == 0.0 {
                assert_eq!(f.review_ratio, 0.0);
            }
        }
    }
}

#[test]
fn test_developer_normalization() {
    assert_eq!(normalize_developer(&json!("  Valve  ")), "Valve");
    assert_eq!(normalize_developer(&json!("")), UNKNOWN_DEVELOPER);
    assert_eq!(normalize_developer(&json!("   ")), UNKNOWN_DEVELOPER);
    assert_eq!(normalize_developer(&json!(null)), UNKNOWN_DEVELOPER);
    assert_eq!(normalize_developer(&json!(12)), UNKNOWN_DEVELOPER);
}

#[test]
fn test_feature_vectors() {
    let f = DerivedFeatures::derive(&record(json!(3), json!(1)));
    assert_eq!(f.engagement_vector(), [3.0, 1.0, 4.0, 0.75]);
    assert_eq!(f.volume_vector(), [3.0, 1.0, 4.0]);
}

#[test]
fn test_build_preserves_order_and_is_deterministic() {
    let records: Vec<GameRecord> = (0..5)
        .map(|i| {
            GameRecord::new(format!("g{}", i), format!("Game {}", i))
                .with_developer("Dev")
                .with_reviews(i * 10, i)
        })
        .collect();

    let first = build(records.clone());
    let second = build(records);

    let ids: Vec<_> = first.iter().map(|g| g.record.id.as_str()).collect();
    assert_eq!(ids, vec!["g0", "g1", "g2", "g3", "g4"]);
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.features, b.features);
    }
}

#[test]
fn test_numeric_value() {
    assert_eq!(numeric_value(&json!(2.5)), Some(2.5));
    assert_eq!(numeric_value(&json!("7")), Some(7.0));
    assert_eq!(numeric_value(&json!("-7")), Some(-7.0));
    assert_eq!(numeric_value(&json!("")), None);
    assert_eq!(numeric_value(&json!(false)), None);
}
