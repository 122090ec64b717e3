//! HTTP gateway (Axum).
//!
//! | route | handler |
//! |-------|---------|
//! | `GET /healthz` | liveness |
//! | `GET /ready` | store reachability, embedder mode |
//! | `GET /ml/random-forest?search=` | developer classifier |
//! | `GET /ml/xgboost?search=` | relevance scorer |
//! | `GET /ml/kmeans?search=` | thematic clusterer |
//! | `GET /ml/all?search=` | all three over one retrieval |
//! | `GET /games?limit=` | catalog page in store order |
//! | `POST /games` | create a record |
//! | `GET /games/{id}` | one record |
//! | `PUT /games/{id}` | replace name, developer and review counts |
//! | `DELETE /games/{id}` | remove a record |
//! | `GET /search?q=` | name lookup |
//! | `GET /search/{id}` | one record |
//! | `GET /vector-search?q=` | similarity lookup |
//! | `GET /statistics?variable=` | distribution summary |
//!
//! Failures are `{error, code}` bodies; see [`GatewayError`].

pub mod error;
pub mod handler;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{
    GameFields, GameInput, all_handler, create_game_handler, delete_game_handler, game_handler,
    games_handler, kmeans_handler, random_forest_handler, search_handler, statistics_handler,
    update_game_handler, vector_search_handler, xgboost_handler,
};
pub use state::HandlerState;

use crate::embedding::Embedder;
use crate::store::{CatalogWriter, RecordStore};

pub const PLAYLENS_STATUS_HEADER: &str = "X-Playlens-Status";
pub const PLAYLENS_STATUS_HEALTHY: &str = "healthy";
pub const PLAYLENS_STATUS_READY: &str = "ready";
pub const PLAYLENS_STATUS_ERROR: &str = "error";

pub fn create_router_with_state<E, S>(state: HandlerState<E, S>) -> Router
where
    E: Embedder + 'static,
    S: RecordStore + CatalogWriter + 'static,
{
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler::<E, S>))
        .route("/ml/random-forest", get(random_forest_handler::<E, S>))
        .route("/ml/xgboost", get(xgboost_handler::<E, S>))
        .route("/ml/kmeans", get(kmeans_handler::<E, S>))
        .route("/ml/all", get(all_handler::<E, S>))
        .route(
            "/games",
            get(games_handler::<E, S>).post(create_game_handler::<E, S>),
        )
        .route(
            "/games/{id}",
            get(game_handler::<E, S>)
                .put(update_game_handler::<E, S>)
                .delete(delete_game_handler::<E, S>),
        )
        .route("/search", get(search_handler::<E, S>))
        .route("/search/{id}", get(game_handler::<E, S>))
        .route("/vector-search", get(vector_search_handler::<E, S>))
        .route("/statistics", get(statistics_handler::<E, S>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub store: &'static str,
    pub embedder_mode: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        PLAYLENS_STATUS_HEADER,
        HeaderValue::from_static(PLAYLENS_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

#[tracing::instrument(skip(state))]
pub async fn ready_handler<E, S>(State(state): State<HandlerState<E, S>>) -> Response
where
    E: Embedder + 'static,
    S: RecordStore + 'static,
{
    let store_status = match state.context.store().health_check().await {
        Ok(()) => PLAYLENS_STATUS_READY,
        Err(e) => {
            tracing::warn!(error = %e, "Record store not reachable");
            PLAYLENS_STATUS_ERROR
        }
    };

    let embedder_mode = if state.context.embedder().is_stub() {
        "stub"
    } else {
        "real"
    };

    let is_ready = store_status == PLAYLENS_STATUS_READY;
    let (status_code, status_msg) = if is_ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "pending")
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        PLAYLENS_STATUS_HEADER,
        HeaderValue::from_static(if is_ready {
            PLAYLENS_STATUS_READY
        } else {
            PLAYLENS_STATUS_ERROR
        }),
    );

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status: status_msg,
            components: ComponentStatus {
                http: PLAYLENS_STATUS_READY,
                store: store_status,
                embedder_mode,
            },
        }),
    )
        .into_response()
}
