//! IronQuote web backend.
//!
//! A quoting service for a commercial cleaning business: deterministic
//! monthly pricing from facility inputs, a local quote snapshot, server
//! rendered summary and proposal views, PDF export, and AI-assisted
//! proposal drafting with a deterministic fallback.

pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod proposal;
pub mod quote;
pub mod rate_limit;
pub mod routes;
pub mod store;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::cache::{CacheStats, ProposalCache};
use crate::config::Config;
use crate::proposal::AnthropicClient;
use crate::rate_limit::RateLimiter;
use crate::store::SnapshotStore;

/// Shared application state. Cheap to clone; handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SnapshotStore>,
    pub cache: ProposalCache,
    pub limiter: Arc<Mutex<RateLimiter>>,
    pub anthropic: AnthropicClient,
}

impl AppState {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let store = SnapshotStore::open(&config.data_dir)
            .with_context(|| format!("open snapshot store at {}", config.data_dir.display()))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("ironquote-web/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .context("build HTTP client")?;

        Ok(AppState {
            store: Arc::new(store),
            cache: ProposalCache::new(),
            limiter: Arc::new(Mutex::new(RateLimiter::new())),
            anthropic: AnthropicClient::new(
                http,
                config.anthropic_api_key.clone(),
                config.anthropic_model.clone(),
            ),
        })
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    cache: CacheStats,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.cache.stats(),
    })
}

/// Assemble the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .merge(quote::router())
        .merge(proposal::router())
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
