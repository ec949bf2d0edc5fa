//! DataForge Server
//!
//! Small-data failure predictor: upload a plant readings file, blend it with
//! synthetic rows, train a logistic regression, then ask for live predictions.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       DATAFORGE                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────┐  ┌─────────────────────────┐ │
//! │  │  API      │  │  Session  │  │  Pipeline               │ │
//! │  │  (Axum)   │─▶│  Store    │  │  ingest → synth → train │ │
//! │  │           │  │           │  │  → evaluate (blocking)  │ │
//! │  └─────┬─────┘  └─────┬─────┘  └────────────┬────────────┘ │
//! │        └──────────────┼──────────────────────┘              │
//! │                       ▼                                     │
//! │                ┌─────────────┐                             │
//! │                │  Pipeline   │                             │
//! │                │  Cache      │                             │
//! │                └─────────────┘                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod models;
mod pipeline;
mod sessions;
mod handlers;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

use pipeline::PipelineCache;
use sessions::SessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dataforge_server=debug,tower_http=debug".into());
    if config::environment() == "production" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let config = config::Config::from_env();

    tracing::info!("DataForge Server starting ({})...", config.environment);
    if !config.is_production() && config.synthetic_seed.is_none() {
        tracing::debug!("No SYNTHETIC_SEED set; each training run draws a fresh seed");
    }
    tracing::info!(
        "Synthetic rows: {}, max_iter: {}, seed: {}",
        config.synthetic_rows,
        config.train_max_iter,
        config.synthetic_seed.map_or_else(|| "random".to_string(), |s| s.to_string())
    );

    let state = AppState::new(config.clone());
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: config::Config,
    pub cache: Arc<PipelineCache>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        Self {
            cache: Arc::new(PipelineCache::new(config.cache_capacity)),
            sessions: Arc::new(SessionStore::new(config.max_sessions)),
            config,
        }
    }
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    let api_routes = Router::new()
        .route("/api/v1/controls", get(handlers::controls::describe))
        .route(
            "/api/v1/sessions",
            post(handlers::sessions::create).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/v1/sessions/:id",
            get(handlers::sessions::get).delete(handlers::sessions::delete),
        )
        .route("/api/v1/sessions/:id/controls", put(handlers::sessions::set_controls))
        .route("/api/v1/sessions/:id/predict", post(handlers::sessions::predict));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
