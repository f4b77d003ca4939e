use crate::validation::ValidateContentError;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendationError {
    #[error("Invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl IntoResponse for RecommendationError {
    fn into_response(self) -> axum::response::Response {
        let status_code = match &self {
            RecommendationError::InvalidField { .. } => StatusCode::BAD_REQUEST,
            RecommendationError::Unexpected(e) => {
                tracing::error!("Internal server error: {e:?}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let info = match self {
            RecommendationError::Unexpected(_) => "Unexpected server error".to_string(),
            _ => self.to_string(),
        };

        (
            status_code,
            Json(json!({ "success": false, "error_info": info })),
        )
            .into_response()
    }
}

impl From<ValidateContentError> for RecommendationError {
    fn from(e: ValidateContentError) -> Self {
        match e {
            ValidateContentError::Expected { field, reason } => {
                Self::InvalidField { field, reason }
            }
        }
    }
}
