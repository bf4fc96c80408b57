use std::sync::Arc;
use std::time::Duration;

use crate::archive::DocumentArchive;
use crate::generation::fit_loop::FitSeeker;
use crate::quota::QuotaLedger;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub ledger: QuotaLedger,
    pub fit_seeker: Arc<FitSeeker>,
    /// Present only when `S3_BUCKET` is configured.
    pub archive: Option<DocumentArchive>,
    /// Wall-clock budget for one tailoring request's fit loop.
    pub request_timeout: Duration,
}
