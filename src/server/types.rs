// HTTP request/response types and error mapping

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::StoreError;

// -------------------------------------------------------------------
// Voice webhook
// -------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct TurnRequest {
    /// The citizen's transcribed utterance for this turn
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    /// What the assistant speaks back
    pub utterance: String,
    /// Intent executed this turn, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// Ticket touched or created this turn, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
}

// -------------------------------------------------------------------
// Operator API
// -------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub resolved_by: String,
    pub resolution_notes: String,
    #[serde(default)]
    pub citizen_rating: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EscalateRequest {
    pub reason: String,
    #[serde(default)]
    pub escalated_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assigned_to: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HotspotQuery {
    #[serde(default)]
    pub flagged_only: bool,
    #[serde(default)]
    pub min_complaints: i64,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

// -------------------------------------------------------------------
// Error mapping
// -------------------------------------------------------------------

/// Operator-facing API error. The store's message is surfaced directly;
/// only internal errors are masked.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
    #[error("internal error")]
    Internal,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Validation(_) => "validation_error",
            ApiError::Internal => "internal_error",
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound(err.to_string()),
            StoreError::AlreadyResolved(_) => ApiError::Conflict(err.to_string()),
            StoreError::Invalid(_) => ApiError::Validation(err.to_string()),
            StoreError::Db(e) => {
                tracing::error!("Database error: {e}");
                ApiError::Internal
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
