use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::pipelines::PipelineError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// The four pipeline error kinds map onto these without being swallowed:
/// callers key their retry UX off the `code` field of the envelope.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transport/provider failure. Retryable by the caller.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The model produced output that failed schema validation or broke a
    /// pipeline invariant. Resubmitting re-renders and re-invokes.
    #[error("Generation produced malformed output: {0}")]
    GenerationMalformed(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::InvalidInput(e) => AppError::Validation(e.to_string()),
            PipelineError::Provider { cause } => AppError::Provider(cause.to_string()),
            PipelineError::SchemaMismatch { .. } | PipelineError::InvariantViolation(_) => {
                AppError::GenerationMalformed(err.to_string())
            }
            PipelineError::Render(e) => {
                AppError::Internal(anyhow::anyhow!("prompt rendering failed: {e}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Provider(msg) => {
                tracing::error!("Provider error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "PROVIDER_ERROR",
                    "The AI provider could not be reached. Please retry.".to_string(),
                )
            }
            AppError::GenerationMalformed(msg) => {
                tracing::error!("Malformed generation: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_MALFORMED",
                    "The AI response was not usable. Please try again.".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
