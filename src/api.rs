// Copyright 2025 Memophor Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! HTTP API handlers for the catalog proxy.
//!
//! - `GET /api/games?term=` - Joined game summaries (popular or keyword search)
//! - `OPTIONS /api/games` - Preflight, always `200` with an empty body
//! - `GET /healthz` - Service health check
//! - `GET /metrics` - Prometheus metrics export
//!
//! Successful game responses carry the shared-cache freshness policy; error
//! responses never do.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, Method, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache::CachePolicy;
use crate::config::AppConfig;
use crate::error::AppError;
use crate::metrics::Metrics;
use crate::model::GamesQuery;
use crate::router::ListingRequest;
use crate::service::{FetchSettings, GamesService};
use crate::upstream::GamesUpstream;

#[derive(Clone)]
pub struct AppState {
    pub games: GamesService,
    pub metrics: Metrics,
    pub cache: CachePolicy,
    pub max_term_length: usize,
}

impl AppState {
    /// Wire the service graph around an upstream implementation.
    pub fn new(upstream: Arc<dyn GamesUpstream>, config: &AppConfig) -> anyhow::Result<Self> {
        let metrics = Metrics::new()?;

        let settings = FetchSettings {
            timeout: config.upstream.timeout,
            retry: config.retry,
            max_batch_size: config.max_batch_size,
        };
        let mut games = GamesService::new(upstream, metrics.clone(), settings);
        if config.coalesce {
            games = games.with_coalescing();
        }

        Ok(Self {
            games,
            metrics,
            cache: config.cache,
            max_term_length: config.max_term_length,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/games", get(list_games).options(preflight))
        .route("/healthz", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "game-catalog-proxy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Metrics endpoint
pub async fn metrics(State(state): State<AppState>) -> Result<String, AppError> {
    state.metrics.export()
}

pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// List popular games, or search them when `term` is given
pub async fn list_games(
    State(state): State<AppState>,
    query: Result<Query<GamesQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    state.metrics.record_request();

    let result = serve_games(&state, query).await;
    if result.is_err() {
        state.metrics.record_request_failure();
    }

    result
}

async fn serve_games(
    state: &AppState,
    query: Result<Query<GamesQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(query) = query?;

    if let Some(term) = query.term.as_deref() {
        if term.trim().chars().count() > state.max_term_length {
            return Err(AppError::bad_request(format!(
                "Search terms are limited to {} characters.",
                state.max_term_length
            )));
        }
    }

    let request = ListingRequest::route(query.term.as_deref());
    tracing::debug!(%request, "routing catalog query");

    let games = state.games.games(request).await?;

    Ok(state.cache.annotate(Json(games.as_slice())))
}
