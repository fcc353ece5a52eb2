//! Route configuration and setup

use crate::api_doc::get_openapi_spec;
use crate::constants::{API_PREFIX, MULTIPART_OVERHEAD_BYTES, OPENAPI_PATH};
use crate::handlers;
use crate::middleware::request_id_middleware;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use chunkup_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let body_limit = config.max_chunk_size_bytes() + MULTIPART_OVERHEAD_BYTES;

    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        body_limit_bytes = body_limit,
        "HTTP limits configured"
    );

    let maintenance_enabled = config.maintenance_endpoints_enabled();

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            OPENAPI_PATH,
            get(move || async move { Json(get_openapi_spec(maintenance_enabled)) }),
        )
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_PATH).path("/docs"))
        .nest(API_PREFIX, upload_routes(maintenance_enabled))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.request_timeout_secs(),
        )))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state);

    Ok(app)
}

fn upload_routes(maintenance_enabled: bool) -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/uploads/chunk", post(handlers::uploads::upload_chunk))
        .route("/uploads/cleanup", post(handlers::uploads::cleanup_upload));

    if maintenance_enabled {
        tracing::warn!("Maintenance endpoint enabled: POST {}/uploads/cleanup/all", API_PREFIX);
        router.route("/uploads/cleanup/all", post(handlers::uploads::cleanup_all))
    } else {
        router
    }
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
