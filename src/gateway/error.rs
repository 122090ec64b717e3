use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::PLAYLENS_STATUS_HEADER;
use crate::analysis::AnalysisError;
use crate::embedding::EmbeddingError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    NoData(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    InsufficientData {
        message: String,
        developers_found: Option<usize>,
    },

    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("embedding failed: {0}")]
    EmbeddingFailed(String),

    #[error("internal error: {0}")]
    InternalError(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NoData(_) | GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            GatewayError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::EmbeddingFailed(_) => StatusCode::BAD_GATEWAY,
            GatewayError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn status_tag(&self) -> &'static str {
        match self {
            GatewayError::InvalidRequest(_) => "invalid_request",
            GatewayError::NoData(_) => "no_data",
            GatewayError::NotFound(_) => "not_found",
            GatewayError::InsufficientData { .. } => "insufficient_data",
            GatewayError::StoreUnavailable(_) => "store_error",
            GatewayError::EmbeddingFailed(_) => "embedding_error",
            GatewayError::InternalError(_) => "internal_error",
        }
    }

    /// JSON body of this error, also used per algorithm by `/ml/all`.
    pub fn to_body(&self) -> ErrorResponse {
        let developers_found = match self {
            GatewayError::InsufficientData {
                developers_found, ..
            } => *developers_found,
            _ => None,
        };
        ErrorResponse {
            error: self.to_string(),
            code: self.status().as_u16(),
            developers_found,
        }
    }
}

impl From<AnalysisError> for GatewayError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::NoData => GatewayError::NoData(err.to_string()),
            AnalysisError::InsufficientData {
                developers_found, ..
            } => GatewayError::InsufficientData {
                message: err.to_string(),
                developers_found,
            },
            AnalysisError::Store(e) => GatewayError::StoreUnavailable(e.to_string()),
            AnalysisError::UnknownVariable { .. } => GatewayError::InvalidRequest(err.to_string()),
            AnalysisError::Model(_) | AnalysisError::Internal { .. } => {
                GatewayError::InternalError(err.to_string())
            }
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        GatewayError::StoreUnavailable(err.to_string())
    }
}

impl From<EmbeddingError> for GatewayError {
    fn from(err: EmbeddingError) -> Self {
        GatewayError::EmbeddingFailed(err.to_string())
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub developers_found: Option<usize>,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();

        let mut headers = HeaderMap::new();
        headers.insert(
            PLAYLENS_STATUS_HEADER,
            HeaderValue::from_static(self.status_tag()),
        );

        (status, headers, Json(self.to_body())).into_response()
    }
}
