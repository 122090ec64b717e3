use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, instrument};

use crate::analysis::{AnalysisKind, StatVariable};
use crate::constants::{
    GAMES_DEFAULT_LIMIT, GAMES_MAX_LIMIT, NAME_SEARCH_LIMIT, VECTOR_SEARCH_CANDIDATES,
    VECTOR_SEARCH_LIMIT,
};
use crate::embedding::Embedder;
use crate::hashing::new_record_id;
use crate::retrieval::normalize_query;
use crate::store::{CatalogWriter, GameRecord, RecordStore, VectorQuery};

use super::error::GatewayError;
use super::state::HandlerState;

/// `?search=` of the analysis endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

/// `?q=` of the lookup endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct LookupParams {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GamesParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatisticsParams {
    pub variable: Option<String>,
}

/// Body of `POST /games` and `PUT /games/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct GameInput {
    pub name: Option<String>,
    pub developer: Option<String>,
    pub positive: Option<Value>,
    pub negative: Option<Value>,
}

/// Catalog fields accepted from a write request.
#[derive(Debug, Clone, PartialEq)]
pub struct GameFields {
    pub name: String,
    pub developer: String,
    pub positive: u64,
    pub negative: u64,
}

impl GameInput {
    /// Every field is required: non-blank name and developer, non-negative integer counts
    /// (numeric strings accepted).
    pub fn validate(self) -> Result<GameFields, GatewayError> {
        let non_blank = |s: Option<String>| s.filter(|s| !s.trim().is_empty());

        let (Some(name), Some(developer), Some(positive), Some(negative)) = (
            non_blank(self.name),
            non_blank(self.developer),
            self.positive,
            self.negative,
        ) else {
            return Err(GatewayError::InvalidRequest(
                "name, developer, positive and negative are required".to_string(),
            ));
        };

        Ok(GameFields {
            name,
            developer,
            positive: review_count("positive", &positive)?,
            negative: review_count("negative", &negative)?,
        })
    }
}

impl GameFields {
    /// Overwrites the writable fields of `record`; everything else is kept.
    pub fn apply(self, record: GameRecord) -> GameRecord {
        GameRecord {
            name: self.name,
            score: None,
            ..record
        }
        .with_developer(self.developer)
        .with_reviews(self.positive, self.negative)
    }
}

fn review_count(field: &str, value: &Value) -> Result<u64, GatewayError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        GatewayError::InvalidRequest(format!("{} must be a non-negative integer", field))
    })
}

fn game_body(
    payload: Result<Json<GameInput>, JsonRejection>,
) -> Result<GameFields, GatewayError> {
    let Json(input) = payload.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    input.validate()
}

fn not_found(id: &str) -> GatewayError {
    GatewayError::NotFound(format!("game '{}' not found", id))
}

/// Resolves `/games?limit=`: default when absent, capped at the maximum, zero rejected.
pub fn resolve_games_limit(limit: Option<usize>) -> Result<usize, GatewayError> {
    match limit {
        None => Ok(GAMES_DEFAULT_LIMIT),
        Some(0) => Err(GatewayError::InvalidRequest(
            "limit must be at least 1".to_string(),
        )),
        Some(n) => Ok(n.min(GAMES_MAX_LIMIT)),
    }
}

fn required_query(params: &LookupParams) -> Result<&str, GatewayError> {
    normalize_query(params.q.as_deref())
        .map(str::trim)
        .ok_or_else(|| GatewayError::InvalidRequest("query parameter 'q' is required".to_string()))
}

async fn run_analysis<E, S>(
    state: HandlerState<E, S>,
    kind: AnalysisKind,
    params: SearchParams,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + 'static,
{
    let report = state
        .context
        .analyze(kind, params.search.as_deref())
        .await?;
    info!(algorithm = %kind, model = report.model(), "Analysis served");
    Ok(Json(report).into_response())
}

#[instrument(skip(state))]
pub async fn random_forest_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + 'static,
{
    run_analysis(state, AnalysisKind::RandomForest, params).await
}

#[instrument(skip(state))]
pub async fn xgboost_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + 'static,
{
    run_analysis(state, AnalysisKind::XGBoost, params).await
}

#[instrument(skip(state))]
pub async fn kmeans_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + 'static,
{
    run_analysis(state, AnalysisKind::KMeans, params).await
}

/// Every algorithm over one retrieval. A failing algorithm becomes `{error, code}` under its key.
#[instrument(skip(state))]
pub async fn all_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + 'static,
{
    let search = params.search.as_deref();
    let outcomes = state.context.analyze_all(search).await?;

    let mut body = Map::new();
    for (kind, outcome) in outcomes {
        let value = match outcome {
            Ok(report) => serde_json::to_value(&report)
                .map_err(|e| GatewayError::InternalError(e.to_string()))?,
            Err(e) => {
                let err = GatewayError::from(e);
                debug!(algorithm = %kind, error = %err, "Algorithm failed");
                serde_json::to_value(err.to_body())
                    .map_err(|e| GatewayError::InternalError(e.to_string()))?
            }
        };
        body.insert(kind.key().to_string(), value);
    }

    if let Some(query) = normalize_query(search) {
        body.insert("search_query".to_string(), json!(query));
    }

    Ok(Json(Value::Object(body)).into_response())
}

#[instrument(skip(state))]
pub async fn games_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Query(params): Query<GamesParams>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + 'static,
{
    let limit = resolve_games_limit(params.limit)?;
    let games = state.context.store().find(limit).await?;
    Ok(Json(games).into_response())
}

#[instrument(skip(state))]
pub async fn search_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Query(params): Query<LookupParams>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + 'static,
{
    let q = required_query(&params)?;
    let games = state
        .context
        .store()
        .find_by_name(q, NAME_SEARCH_LIMIT)
        .await?;
    Ok(Json(games).into_response())
}

/// Strictly semantic: an embedder failure is an error here, not a fallback.
#[instrument(skip(state))]
pub async fn vector_search_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Query(params): Query<LookupParams>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + 'static,
{
    let q = required_query(&params)?;
    let context = &state.context;

    let vector = context.retriever().embed(q).await?;
    let games = context
        .store()
        .vector_search(VectorQuery {
            vector,
            index: context.retrieval_config().index.clone(),
            limit: VECTOR_SEARCH_LIMIT,
            num_candidates: VECTOR_SEARCH_CANDIDATES,
        })
        .await?;
    Ok(Json(games).into_response())
}

#[instrument(skip(state))]
pub async fn statistics_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Query(params): Query<StatisticsParams>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + 'static,
{
    let variable = match params.variable.as_deref().map(str::trim) {
        None | Some("") => StatVariable::default(),
        Some(name) => name.parse::<StatVariable>()?,
    };
    let report = state.context.statistics(variable).await?;
    Ok(Json(report).into_response())
}

/// `GET /games/{id}` and `GET /search/{id}`.
#[instrument(skip(state))]
pub async fn game_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<String>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + 'static,
{
    let record = state
        .context
        .record(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    Ok(Json(record).into_response())
}

#[instrument(skip_all)]
pub async fn create_game_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    payload: Result<Json<GameInput>, JsonRejection>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + CatalogWriter + 'static,
{
    let fields = game_body(payload)?;
    let id = new_record_id(&fields.name, &fields.developer);
    let record = fields.apply(GameRecord::new(id, ""));

    state.context.save_record(record.clone()).await?;
    info!(id = %record.id, "Catalog record created");
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

#[instrument(skip(state, payload))]
pub async fn update_game_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<String>,
    payload: Result<Json<GameInput>, JsonRejection>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + CatalogWriter + 'static,
{
    let fields = game_body(payload)?;
    let existing = state
        .context
        .record(&id)
        .await?
        .ok_or_else(|| not_found(&id))?;
    let record = fields.apply(existing);

    state.context.save_record(record.clone()).await?;
    info!(id = %record.id, "Catalog record updated");
    Ok(Json(record).into_response())
}

#[instrument(skip(state))]
pub async fn delete_game_handler<E, S>(
    State(state): State<HandlerState<E, S>>,
    Path(id): Path<String>,
) -> Result<Response, GatewayError>
where
    E: Embedder + 'static,
    S: RecordStore + CatalogWriter + 'static,
{
    if !state.context.delete_record(&id).await? {
        return Err(not_found(&id));
    }
    info!(id = %id, "Catalog record deleted");
    Ok(Json(json!({ "deleted": id })).into_response())
}
