//! # ideabridge HTTP API Module
//!
//! One working-memory session served over HTTP with axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /status` - Edge counts for both links and the arena generation
//! - `POST /input-link` - Replace the input link with a JSON document
//! - `GET /input-link` - The input link as JSON
//! - `POST /output-link` - A kernel delivers its output tree
//! - `GET /output-link` - The output link as JSON
//! - `GET /wmes/{link}` - Kernel-style dump of `input` or `output`
//! - `POST /materialize` - Materialize every output-link command
//! - `POST /reset` - Reset the working memory
//! - `POST /path/build` - Dotted path to nested document
//! - `POST /path/graft` - Set a dotted path inside a document
//! - `POST /coerce` - Coerce a scalar to a numeric kind
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `IDEABRIDGE_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `IDEABRIDGE_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `IDEABRIDGE_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::get_api_key_from_env;
pub use handlers::{ApiError, api_error};
pub use middleware::{DEFAULT_RATE_LIMIT, create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    CoerceRequest, CoerceResponse, ErrorResponse, HealthResponse, LinkWriteResponse,
    MaterializeResponse, PathBuildRequest, PathGraftRequest, PathResponse, ResetResponse,
    StatusResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use ideabridge_core::{BridgeError, Session};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request body limit (2 MB).
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: one session, one exclusive writer.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Session>>,
}

impl AppState {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `IDEABRIDGE_CORS_ORIGINS`.
///
/// `*` allows every origin; unset or unparsable values fall back to
/// localhost only.
fn build_cors_layer() -> CorsLayer {
    match std::env::var("IDEABRIDGE_CORS_ORIGINS").ok().as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: allowing ALL origins (IDEABRIDGE_CORS_ORIGINS=*). Do not use in production"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(e) => {
                        tracing::warn!("CORS: invalid origin '{}': {}", origin, e);
                        None
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: no valid origins configured, defaulting to localhost only");
                restricted_cors(localhost_origins())
            } else {
                tracing::info!(origins = allowed.len(), "CORS: explicit origins configured");
                restricted_cors(allowed)
            }
        }
        None => restricted_cors(localhost_origins()),
    }
}

fn localhost_origins() -> Vec<HeaderValue> {
    [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect()
}

fn restricted_cors(origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Middleware stack (outer to inner): tracing, CORS, body limit, rate
/// limiting (if enabled), authentication (if configured).
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limiter = create_rate_limiter(get_rate_limit_from_env());
    match &rate_limiter {
        Some(_) => tracing::info!("Rate limiting enabled"),
        None => tracing::info!("Rate limiting disabled"),
    }

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED: all endpoints are publicly accessible. \
             Set IDEABRIDGE_API_KEY to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route(
            "/input-link",
            get(handlers::input_link_handler).post(handlers::set_input_link_handler),
        )
        .route(
            "/output-link",
            get(handlers::output_link_handler).post(handlers::set_output_link_handler),
        )
        .route("/wmes/{link}", get(handlers::wmes_handler))
        .route("/materialize", post(handlers::materialize_handler))
        .route("/reset", post(handlers::reset_handler))
        .route("/path/build", post(handlers::path_build_handler))
        .route("/path/graft", post(handlers::path_graft_handler))
        .route("/coerce", post(handlers::coerce_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind `addr` and serve until the process receives Ctrl+C.
pub async fn run_server(addr: &str, session: Session) -> Result<(), BridgeError> {
    let router = create_router(AppState::new(session));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| BridgeError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("ideabridge HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| BridgeError::IoError(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
