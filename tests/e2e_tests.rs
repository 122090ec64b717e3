//! End-to-end HTTP tests against a spawned server.

mod common;

use serde_json::{Value, json};

use playlens::{FailingEmbedder, MockRecordStore, ServiceContext, StubEmbedder};

use common::fixtures::{catalog, embedded_store, fast_suite};
use common::harness::spawn_test_server;

async fn get_json(url: &str) -> (u16, Value) {
    let response = reqwest::get(url).await.expect("request should succeed");
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_health_and_ready() {
    let context = ServiceContext::new(StubEmbedder::default(), MockRecordStore::new());
    let server = spawn_test_server(context).await.expect("Server should start");

    let (status, body) = get_json(&server.endpoint("/healthz")).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");

    let (status, body) = get_json(&server.endpoint("/ready")).await;
    assert_eq!(status, 200);
    assert_eq!(body["components"]["embedder_mode"], "stub");
}

#[tokio::test]
async fn test_ml_all_over_http() {
    let ctx = ServiceContext::new(StubEmbedder::default(), embedded_store(catalog(90, 3)))
        .with_suite(fast_suite());
    let server = spawn_test_server(ctx).await.expect("Server should start");

    let (status, body) = get_json(&server.endpoint("/ml/all?search=Game%201")).await;
    assert_eq!(status, 200);
    assert_eq!(body["search_query"], "Game 1");
    assert!(body["random_forest"]["accuracy"].is_number());
    assert!(body["xgboost"]["r2_score"].is_number());
    assert_eq!(body["kmeans"]["n_clusters"], 5);
}

#[tokio::test]
async fn test_error_bodies_over_http() {
    let server = spawn_test_server(ServiceContext::new(
        FailingEmbedder::new(),
        MockRecordStore::with_records(catalog(12, 12)),
    ))
    .await
    .expect("Server should start");

    let (status, body) = get_json(&server.endpoint("/ml/random-forest")).await;
    assert_eq!(status, 422);
    assert_eq!(body["code"], 422);

    let (status, body) = get_json(&server.endpoint("/vector-search?q=Game")).await;
    assert_eq!(status, 502);
    assert_eq!(body["code"], 502);

    let (status, body) = get_json(&server.endpoint("/search")).await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_catalog_endpoints_over_http() {
    let server = spawn_test_server(ServiceContext::new(
        StubEmbedder::default(),
        embedded_store(catalog(40, 4)),
    ))
    .await
    .expect("Server should start");

    let (status, body) = get_json(&server.endpoint("/games?limit=3")).await;
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, body) = get_json(&server.endpoint("/statistics?variable=median_playtime")).await;
    assert_eq!(status, 200);
    assert_eq!(body["stats"]["count"], 40);
    assert_eq!(body["visualization"]["panels"][0]["kind"], "line");
}

#[tokio::test]
async fn test_record_lifecycle_over_http() {
    let context = ServiceContext::new(StubEmbedder::default(), MockRecordStore::new());
    let server = spawn_test_server(context).await.expect("Server should start");
    let client = reqwest::Client::new();

    let created: Value = client
        .post(server.endpoint("/games"))
        .json(&json!({
            "name": "Hades",
            "developer": "Supergiant",
            "positive": 900,
            "negative": 12,
        }))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("body should be JSON");
    let id = created["id"].as_str().expect("id should be set").to_string();
    let record_url = server.endpoint(&format!("/games/{}", id));

    let (status, body) = get_json(&server.endpoint(&format!("/search/{}", id))).await;
    assert_eq!(status, 200);
    assert_eq!(body["developer"], "Supergiant");

    let response = client
        .put(&record_url)
        .json(&json!({
            "name": "Hades II",
            "developer": "Supergiant",
            "positive": 1000,
            "negative": 20,
        }))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(response.status().as_u16(), 200);

    let (_, body) = get_json(&server.endpoint("/search?q=hades%20ii")).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let response = client
        .post(server.endpoint("/games"))
        .json(&json!({ "name": "Nameless" }))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(response.status().as_u16(), 400);

    let response = client.delete(&record_url).send().await.expect("request should succeed");
    assert_eq!(response.status().as_u16(), 200);

    let (status, body) = get_json(&record_url).await;
    assert_eq!(status, 404);
    assert_eq!(body["code"], 404);
}
