//! Axum route handlers for the Quota API.

use axum::{extract::State, Json};

use crate::auth::AuthenticatedUser;
use crate::quota::QuotaStatus;
use crate::state::AppState;

/// GET /api/v1/quota
///
/// Advisory status for the signed-in user. Never fails on storage faults; see
/// `QuotaLedger::status`.
pub async fn handle_get_quota(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Json<QuotaStatus> {
    Json(state.ledger.status(&user.user_id).await)
}
