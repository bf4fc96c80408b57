pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::generation::handlers as tailor;
use crate::quota::handlers as quota;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Quota API
        .route("/api/v1/quota", get(quota::handle_get_quota))
        // Tailoring API
        .route("/api/v1/resumes/tailor", post(tailor::handle_tailor))
        .route(
            "/api/v1/resumes/tailor/upload",
            post(tailor::handle_tailor_upload),
        )
        .with_state(state)
}
