use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::generation::fit_loop::FitError;
use crate::generation::GenerationError;
use crate::quota::store::QuotaStoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Quota denied: {reason}")]
    QuotaDenied { reason: String },

    #[error("Quota storage error: {0}")]
    QuotaStore(#[from] QuotaStoreError),

    #[error("Generation provider busy after {attempts} attempts")]
    ProviderBusy { attempts: u32 },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Request exceeded its {0}s budget")]
    Timeout(u64),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        match err {
            FitError::Generation(GenerationError::ProviderBusy { attempts }) => {
                AppError::ProviderBusy { attempts }
            }
            FitError::Generation(e) => AppError::Llm(e.to_string()),
            FitError::Render(e) => AppError::Render(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::QuotaDenied { reason } => (
                StatusCode::TOO_MANY_REQUESTS,
                "QUOTA_EXCEEDED",
                reason.clone(),
            ),
            AppError::QuotaStore(e) => {
                tracing::error!("Quota storage error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "QUOTA_UNAVAILABLE",
                    "The service is misconfigured; please try again later".to_string(),
                )
            }
            AppError::ProviderBusy { attempts } => {
                tracing::warn!("Generation provider still rate limited after {attempts} attempts");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_BUSY",
                    "The service is busy, please try again later".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Render(msg) => {
                tracing::error!("Render error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    "The generated document could not be rendered".to_string(),
                )
            }
            AppError::Timeout(secs) => {
                tracing::error!("Request timed out after {secs}s");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "TIMEOUT",
                    "Generation took too long, please try again".to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::RenderError;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized, StatusCode::UNAUTHORIZED),
            (
                AppError::QuotaDenied {
                    reason: "daily limit reached".into(),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                AppError::QuotaStore(QuotaStoreError::Database(sqlx::Error::PoolTimedOut)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::ProviderBusy { attempts: 3 },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (AppError::Timeout(90), StatusCode::GATEWAY_TIMEOUT),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_provider_busy_kept_distinct_from_generic_failures() {
        let busy: AppError =
            FitError::Generation(GenerationError::ProviderBusy { attempts: 3 }).into();
        assert!(matches!(busy, AppError::ProviderBusy { attempts: 3 }));

        let empty: AppError = FitError::Generation(GenerationError::EmptyMarkup).into();
        assert!(matches!(empty, AppError::Llm(_)));

        let render: AppError =
            FitError::Render(RenderError::InvalidMarkup("no title".into())).into();
        assert!(matches!(render, AppError::Render(_)));
    }
}
