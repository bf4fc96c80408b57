mod archive;
mod auth;
mod config;
mod db;
mod errors;
mod extract;
mod generation;
mod layout;
mod llm_client;
mod models;
mod quota;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::archive::DocumentArchive;
use crate::config::{Config, QuotaStoreKind};
use crate::db::create_pool;
use crate::generation::fit_loop::FitSeeker;
use crate::generation::generator::LlmResumeGenerator;
use crate::generation::retry::{RateLimitRetry, RetryPolicy};
use crate::layout::PdfRenderer;
use crate::llm_client::{LlmClient, HTTP_TIMEOUT};
use crate::quota::clock::SystemClock;
use crate::quota::memory::InMemoryQuotaStore;
use crate::quota::postgres::PgQuotaStore;
use crate::quota::store::QuotaStore;
use crate::quota::QuotaLedger;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load and validate configuration before anything else
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Quota storage
    let store: Arc<dyn QuotaStore> = match config.quota_store {
        QuotaStoreKind::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required for the postgres quota store"))?;
            Arc::new(PgQuotaStore::new(create_pool(database_url).await?))
        }
        QuotaStoreKind::Memory => {
            warn!("Using in-memory quota store: limits are per process and reset on restart");
            Arc::new(InMemoryQuotaStore::new())
        }
    };
    let ledger = QuotaLedger::new(store, Arc::new(SystemClock), config.daily_limit);
    info!(daily_limit = config.daily_limit, "Quota ledger initialized");

    // Generation: one HTTP attempt per call, wrapped in the rate-limit retry policy
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_model.clone())?;
    info!("LLM client initialized (model: {})", llm.model());
    let policy = RetryPolicy::new(
        config.generation_max_attempts,
        config.generation_backoff.clone(),
    );
    let generator = Arc::new(RateLimitRetry::new(LlmResumeGenerator::new(llm), policy));

    let fit_seeker = Arc::new(FitSeeker::new(
        generator,
        Arc::new(PdfRenderer::default()),
        config.fit_max_iterations,
    ));
    info!(
        max_iterations = fit_seeker.max_iterations(),
        "Fit-seeking loop initialized"
    );

    let worst_case = config.worst_case_generation_time(HTTP_TIMEOUT);
    if worst_case > config.request_timeout {
        warn!(
            worst_case_secs = worst_case.as_secs(),
            request_timeout_secs = config.request_timeout.as_secs(),
            "Fit loop can outlast the request budget; slow requests will end in 504"
        );
    }

    // Optional S3 / MinIO archive
    let archive = match &config.archive {
        Some(archive_config) => {
            let archive = DocumentArchive::connect(archive_config).await;
            info!("Document archive enabled (bucket: {})", archive.bucket());
            Some(archive)
        }
        None => None,
    };

    let state = AppState {
        ledger,
        fit_seeker,
        archive,
        request_timeout: config.request_timeout,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
