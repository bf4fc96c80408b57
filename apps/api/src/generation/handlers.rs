//! Axum route handlers for the Tailoring API.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::auth::AuthenticatedUser;
use crate::errors::AppError;
use crate::extract::extract_resume_text;
use crate::generation::fit_loop::FitOutcome;
use crate::models::quota::QuotaDecision;
use crate::quota::DAILY_LIMIT_REASON;
use crate::state::AppState;

pub const PAGE_COUNT_HEADER: &str = "x-page-count";
pub const FIT_OK_HEADER: &str = "x-fit-ok";
pub const FIT_ITERATIONS_HEADER: &str = "x-fit-iterations";
pub const QUOTA_REMAINING_HEADER: &str = "x-quota-remaining";
pub const DOCUMENT_KEY_HEADER: &str = "x-document-key";

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TailorRequest {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub job_description: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/resumes/tailor
///
/// Tailors already-extracted resume text to a job description and returns the PDF.
pub async fn handle_tailor(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<TailorRequest>,
) -> Result<Response, AppError> {
    tailor(&state, &user, request.resume_text, request.job_description).await
}

/// POST /api/v1/resumes/tailor/upload
///
/// Multipart form: `resume_file` (PDF or plain text) or `resume_text`, plus
/// `job_description`. An uploaded file takes precedence over `resume_text`.
pub async fn handle_tailor_upload(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut resume_text = String::new();
    let mut resume_file_text: Option<String> = None;
    let mut job_description = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume_file" => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read resume_file: {e}")))?;
                if !data.is_empty() {
                    let text = extract_resume_text(
                        data.to_vec(),
                        content_type.as_deref(),
                        file_name.as_deref(),
                    )
                    .await?;
                    resume_file_text = Some(text);
                }
            }
            "resume_text" | "job_description" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read {name}: {e}")))?;
                if name == "resume_text" {
                    resume_text = value;
                } else {
                    job_description = value;
                }
            }
            _ => {}
        }
    }

    let resume_text = resume_file_text.unwrap_or(resume_text);
    tailor(&state, &user, resume_text, job_description).await
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Validate → reserve → fit loop under the request budget → archive → PDF response.
async fn tailor(
    state: &AppState,
    user: &AuthenticatedUser,
    resume_text: String,
    job_description: String,
) -> Result<Response, AppError> {
    if resume_text.trim().is_empty() {
        return Err(AppError::Validation("resume_text cannot be empty".to_string()));
    }
    if job_description.trim().is_empty() {
        return Err(AppError::Validation("job_description cannot be empty".to_string()));
    }

    // One budget covers the reservation and the fit loop.
    let deadline = tokio::time::Instant::now() + state.request_timeout;

    let reservation = tokio::time::timeout_at(deadline, state.ledger.reserve(&user.user_id));
    let decision = match reservation.await {
        Ok(decision) => decision?,
        Err(_) => return Err(budget_exceeded(state, user, "reserve")),
    };
    if !decision.allowed {
        return Err(AppError::QuotaDenied {
            reason: decision
                .reason
                .unwrap_or_else(|| DAILY_LIMIT_REASON.to_string()),
        });
    }

    // The loop runs in its own task: if this handler is dropped (client gone) or
    // times out, the in-flight call finishes and its result is discarded.
    let seeker = Arc::clone(&state.fit_seeker);
    let task = tokio::spawn(async move { seeker.run(&resume_text, &job_description).await });

    let outcome = match tokio::time::timeout_at(deadline, task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(join_error)) => {
            return Err(AppError::Internal(anyhow::anyhow!(
                "fit loop task failed: {join_error}"
            )))
        }
        Err(_) => return Err(budget_exceeded(state, user, "fit_loop")),
    };

    info!(
        user_id = %user.user_id,
        page_count = outcome.page_count,
        iterations = outcome.iterations,
        fits = outcome.fits,
        "Tailored resume produced"
    );

    let document_key = match &state.archive {
        Some(archive) => match archive
            .store(&user.user_id, state.ledger.today(), outcome.document.clone())
            .await
        {
            Ok(key) => Some(key),
            Err(e) => {
                error!(user_id = %user.user_id, error = %e, "Failed to archive document");
                None
            }
        },
        None => None,
    };

    Ok(document_response(outcome, &decision, document_key.as_deref()))
}

fn budget_exceeded(state: &AppState, user: &AuthenticatedUser, stage: &str) -> AppError {
    warn!(
        user_id = %user.user_id,
        stage,
        timeout_secs = state.request_timeout.as_secs(),
        "Tailoring exceeded request budget"
    );
    AppError::Timeout(state.request_timeout.as_secs())
}

fn document_response(
    outcome: FitOutcome,
    decision: &QuotaDecision,
    document_key: Option<&str>,
) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"tailored-resume.pdf\""),
    );
    headers.insert(PAGE_COUNT_HEADER, HeaderValue::from(outcome.page_count));
    headers.insert(
        FIT_OK_HEADER,
        HeaderValue::from_static(if outcome.fits { "true" } else { "false" }),
    );
    headers.insert(FIT_ITERATIONS_HEADER, HeaderValue::from(outcome.iterations));
    headers.insert(QUOTA_REMAINING_HEADER, HeaderValue::from(decision.remaining));
    if let Some(key) = document_key.and_then(|k| HeaderValue::from_str(k).ok()) {
        headers.insert(DOCUMENT_KEY_HEADER, key);
    }

    (StatusCode::OK, headers, outcome.document).into_response()
}
